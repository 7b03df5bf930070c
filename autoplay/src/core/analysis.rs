//! Hand-analysis results as produced by the external analysis engine.
//!
//! The engine ranks candidates before handing them over; the order of every
//! list here is authoritative and never re-sorted by this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tile::Tile;

/// Shanten value of a complete (winning) hand.
pub const SHANTEN_COMPLETE: i8 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported meld type {0:?} (expected sequence, triplet or quad)")]
pub struct UnsupportedMeldTypeError(pub String);

/// Shape of a claimed meld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MeldKind {
    Sequence,
    Triplet,
    Quad,
}

impl MeldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MeldKind::Sequence => "sequence",
            MeldKind::Triplet => "triplet",
            MeldKind::Quad => "quad",
        }
    }

    /// Tiles the finished meld contains.
    pub const fn size(self) -> usize {
        match self {
            MeldKind::Sequence | MeldKind::Triplet => 3,
            MeldKind::Quad => 4,
        }
    }
}

impl fmt::Display for MeldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeldKind {
    type Err = UnsupportedMeldTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sequence" | "chi" => Ok(MeldKind::Sequence),
            "triplet" | "pon" => Ok(MeldKind::Triplet),
            "quad" | "kan" => Ok(MeldKind::Quad),
            _ => Err(UnsupportedMeldTypeError(raw.to_string())),
        }
    }
}

impl TryFrom<String> for MeldKind {
    type Error = UnsupportedMeldTypeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<MeldKind> for String {
    fn from(kind: MeldKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One ranked discard option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardCandidate {
    pub discard: Tile,
    /// Tiles that would improve the hand after this discard.
    pub waits: u32,
    /// Expected hand value after this discard.
    #[serde(default)]
    pub score: u32,
}

/// A meld the player could claim on the current discard, with the analysis of
/// the hand as it would stand after claiming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeldOffer {
    pub tile: Tile,
    pub kind: MeldKind,
    /// Full meld including the claimed tile, e.g. `[4m, 5m, 6m]`.
    pub combination: Vec<Tile>,
    pub shanten_after: i8,
    /// Ranked discards after the claim that improve the hand. Empty when the claim does not help.
    #[serde(default)]
    pub improving: Vec<DiscardCandidate>,
}

/// Analysis of the current hand.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandAnalysis {
    pub shanten: i8,
    /// Discards that keep shanten, best first.
    pub discards: Vec<DiscardCandidate>,
    /// Discards that regress shanten but improve the hand overall, best first.
    pub regressing: Vec<DiscardCandidate>,
    pub meld: Option<MeldOffer>,
}

impl HandAnalysis {
    pub fn is_complete(&self) -> bool {
        self.shanten == SHANTEN_COMPLETE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meld_kind_accepts_both_vocabularies() {
        assert_eq!("pon".parse::<MeldKind>(), Ok(MeldKind::Triplet));
        assert_eq!("Sequence".parse::<MeldKind>(), Ok(MeldKind::Sequence));
        assert_eq!("kan".parse::<MeldKind>(), Ok(MeldKind::Quad));
        assert_eq!(
            "ankan-ish".parse::<MeldKind>(),
            Err(UnsupportedMeldTypeError("ankan-ish".to_string()))
        );
    }

    #[test]
    fn analysis_parses_from_camel_case_json() {
        let raw = r#"{
            "shanten": 1,
            "discards": [{"discard": 4, "waits": 8, "score": 3900}],
            "meld": {
                "tile": 13,
                "kind": "sequence",
                "combination": [12, 13, 14],
                "shantenAfter": 0
            }
        }"#;
        let analysis: HandAnalysis = serde_json::from_str(raw).expect("parse");
        assert_eq!(analysis.shanten, 1);
        assert_eq!(analysis.discards[0].discard.index(), 4);
        assert!(analysis.regressing.is_empty());
        let offer = analysis.meld.expect("meld offer");
        assert_eq!(offer.kind, MeldKind::Sequence);
        assert!(offer.improving.is_empty());
    }

    #[test]
    fn unknown_meld_kind_fails_to_parse() {
        let raw = r#"{"tile": 1, "kind": "closed", "combination": [], "shantenAfter": 0}"#;
        let err = serde_json::from_str::<MeldOffer>(raw).expect_err("should fail");
        assert!(err.to_string().contains("unsupported meld type"));
    }
}
