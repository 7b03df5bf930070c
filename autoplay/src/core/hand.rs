//! Player hand bookkeeping: tile counts, unseen counts, red fives and the discard log.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::core::phase::TurnPhase;
use crate::core::tile::{
    COPIES_PER_TILE, NUM_NUMBERED_SUITS, NUM_TILE_TYPES, Suit, Tile, TileParseError, TileToken,
    parse_rank, suit_from_char,
};

static HAND_NOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9]+[mpsz])+$").expect("valid hand regex"));
static HAND_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)([mpsz])").expect("valid group regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandError {
    #[error(transparent)]
    Tile(#[from] TileParseError),
    #[error("malformed hand notation {0:?} (expected e.g. 123m456p789s11z)")]
    Notation(String),
    #[error("cannot hold a fifth {0}")]
    FourCopiesHeld(Tile),
    #[error("{0} is not in hand")]
    NotHeld(Tile),
    #[error("{0} cannot be a red five")]
    NotAFive(Tile),
    #[error("no red {0} in hand")]
    NoRedFive(Tile),
    #[error("already holding the red {0}")]
    SecondRedFive(Tile),
}

/// Hand state for one player session.
///
/// Mutated once per draw or discard. `left` starts at four copies per tile and
/// only tracks what this hand has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandState {
    tiles: [u8; NUM_TILE_TYPES],
    left: [u8; NUM_TILE_TYPES],
    red_fives: [u8; NUM_NUMBERED_SUITS],
    discards: Vec<Tile>,
}

impl Default for HandState {
    fn default() -> Self {
        Self {
            tiles: [0; NUM_TILE_TYPES],
            left: [COPIES_PER_TILE; NUM_TILE_TYPES],
            red_fives: [0; NUM_NUMBERED_SUITS],
            discards: Vec::new(),
        }
    }
}

impl HandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hand from compact notation such as `123m406p789s11z` (`0` = red five).
    pub fn from_notation(notation: &str) -> Result<Self, HandError> {
        let compact: String = notation.split_whitespace().collect();
        if !HAND_NOTATION_RE.is_match(&compact) {
            return Err(HandError::Notation(notation.to_string()));
        }
        let mut hand = Self::new();
        for group in HAND_GROUP_RE.captures_iter(&compact) {
            let suit_char = group[2].chars().next().unwrap_or('z');
            let suit = suit_from_char(suit_char)
                .ok_or_else(|| HandError::Notation(notation.to_string()))?;
            for digit in group[1].bytes() {
                let token = token_for(digit - b'0', suit_char, suit)?;
                hand.draw(token.tile, token.red)?;
            }
        }
        Ok(hand)
    }

    pub fn count(&self, tile: Tile) -> u8 {
        self.tiles[tile.index() as usize]
    }

    pub fn left(&self, tile: Tile) -> u8 {
        self.left[tile.index() as usize]
    }

    /// Total tiles currently in hand.
    pub fn tile_count(&self) -> usize {
        self.tiles.iter().map(|&c| c as usize).sum()
    }

    /// Red fives held in a numbered suit; always 0 for honors.
    pub fn red_fives(&self, suit: Suit) -> u8 {
        match suit {
            Suit::Man => self.red_fives[0],
            Suit::Pin => self.red_fives[1],
            Suit::Sou => self.red_fives[2],
            Suit::Honor => 0,
        }
    }

    /// Discards in order; only used by the external furiten self-check.
    pub fn discards(&self) -> &[Tile] {
        &self.discards
    }

    /// Distinct tiles with a non-zero count, in index order.
    pub fn held(&self) -> impl Iterator<Item = Tile> + '_ {
        Tile::all().filter(|&tile| self.count(tile) > 0)
    }

    pub fn phase(&self) -> TurnPhase {
        TurnPhase::from_tile_count(self.tile_count())
    }

    pub fn draw(&mut self, tile: Tile, red: bool) -> Result<(), HandError> {
        let idx = tile.index() as usize;
        if self.tiles[idx] >= COPIES_PER_TILE {
            return Err(HandError::FourCopiesHeld(tile));
        }
        if red {
            if !tile.is_five() {
                return Err(HandError::NotAFive(tile));
            }
            let slot = suit_slot(tile);
            if self.red_fives[slot] >= 1 {
                return Err(HandError::SecondRedFive(tile));
            }
            self.red_fives[slot] += 1;
        }
        self.left[idx] = self.left[idx].saturating_sub(1);
        self.tiles[idx] += 1;
        Ok(())
    }

    pub fn discard(&mut self, tile: Tile, red: bool) -> Result<(), HandError> {
        let idx = tile.index() as usize;
        if self.tiles[idx] == 0 {
            return Err(HandError::NotHeld(tile));
        }
        if red {
            if !tile.is_five() {
                return Err(HandError::NotAFive(tile));
            }
            let slot = suit_slot(tile);
            if self.red_fives[slot] == 0 {
                return Err(HandError::NoRedFive(tile));
            }
            self.red_fives[slot] -= 1;
        }
        self.tiles[idx] -= 1;
        self.discards.push(tile);
        Ok(())
    }
}

/// Compact notation grouped by suit, e.g. `123m466p11z`. Red fives render as `5`.
impl fmt::Display for HandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Option<Suit> = None;
        for tile in self.held() {
            let suit = tile.suit();
            if let Some(prev) = current.filter(|&prev| prev != suit) {
                write!(f, "{}", prev.as_char())?;
            }
            current = Some(suit);
            for _ in 0..self.count(tile) {
                write!(f, "{}", tile.rank())?;
            }
        }
        if let Some(last) = current {
            write!(f, "{}", last.as_char())?;
        }
        Ok(())
    }
}

fn suit_slot(tile: Tile) -> usize {
    (tile.index() / 9) as usize
}

fn token_for(digit: u8, suit_char: char, suit: Suit) -> Result<TileToken, HandError> {
    parse_rank(digit, suit).ok_or_else(|| {
        let raw = format!("{digit}{suit_char}");
        match suit {
            Suit::Honor => HandError::Tile(TileParseError::HonorRank(raw)),
            _ => HandError::Tile(TileParseError::Malformed(raw)),
        }
    })
}
