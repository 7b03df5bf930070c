//! Turn phase derived from the hand tile count.

use thiserror::Error;

/// A hand tile count that is never a valid decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid hand size: {tile_count} tiles (count mod 3 must be 1 or 2)")]
pub struct PhaseError {
    pub tile_count: usize,
}

/// Phase the engine must respond to, computed once per decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// `count % 3 == 1`: one tile pending the discard/keep decision.
    Draw,
    /// `count % 3 == 2`: a meld may be available, or the hand sits between draw and discard.
    Choice,
    /// `count % 3 == 0`.
    Invalid { tile_count: usize },
}

impl TurnPhase {
    pub fn from_tile_count(tile_count: usize) -> Self {
        match tile_count % 3 {
            1 => TurnPhase::Draw,
            2 => TurnPhase::Choice,
            _ => TurnPhase::Invalid { tile_count },
        }
    }

    /// Reject the invalid phase so callers can `?` it.
    pub fn require_decidable(self) -> Result<Self, PhaseError> {
        match self {
            TurnPhase::Invalid { tile_count } => Err(PhaseError { tile_count }),
            phase => Ok(phase),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TurnPhase::Draw => "draw",
            TurnPhase::Choice => "choice",
            TurnPhase::Invalid { .. } => "invalid",
        }
    }
}
