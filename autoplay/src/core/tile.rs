//! The 34-category tile domain and its `<rank><suit>` notation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Total number of distinct tile categories (0-33).
pub const NUM_TILE_TYPES: usize = 34;

/// Number of ranks per numbered suit.
pub const NUM_SUIT_TILES: usize = 9;

/// Number of numbered suits (m, p, s). Red fives exist only in these.
pub const NUM_NUMBERED_SUITS: usize = 3;

/// Copies of each tile category in a full set.
pub const COPIES_PER_TILE: u8 = 4;

/// First honor tile index (1z, east wind).
pub const HONOR_START: u8 = 27;

const SUIT_CHARS: [char; 4] = ['m', 'p', 's', 'z'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileParseError {
    #[error("tile index {0} out of range 0..=33")]
    IndexOutOfRange(u8),
    #[error("malformed tile token {0:?} (expected e.g. 1m, 0p, 7z)")]
    Malformed(String),
    #[error("honor tiles only have ranks 1-7, got {0:?}")]
    HonorRank(String),
}

/// Tile suit. Honors are grouped as a fourth suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

impl Suit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'm' => Some(Suit::Man),
            'p' => Some(Suit::Pin),
            's' => Some(Suit::Sou),
            'z' => Some(Suit::Honor),
            _ => None,
        }
    }

    const fn offset(self) -> u8 {
        match self {
            Suit::Man => 0,
            Suit::Pin => 9,
            Suit::Sou => 18,
            Suit::Honor => HONOR_START,
        }
    }

    pub const fn as_char(self) -> char {
        SUIT_CHARS[(self.offset() / 9) as usize]
    }
}

/// A tile category, `0..=33`.
///
/// Indices `0..27` are the numbered suits in m, p, s order (`suit * 9 + rank - 1`);
/// `27..34` are the seven honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tile(u8);

impl Tile {
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_TILE_TYPES {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub const fn suit(self) -> Suit {
        match self.0 / 9 {
            0 => Suit::Man,
            1 => Suit::Pin,
            2 => Suit::Sou,
            _ => Suit::Honor,
        }
    }

    /// Rank as printed: 1-9 for numbered suits, 1-7 for honors.
    pub const fn rank(self) -> u8 {
        self.0 % 9 + 1
    }

    pub const fn is_honor(self) -> bool {
        self.0 >= HONOR_START
    }

    /// True for 5m, 5p and 5s, the only tiles that can be red.
    pub const fn is_five(self) -> bool {
        !self.is_honor() && self.rank() == 5
    }

    pub fn all() -> impl Iterator<Item = Tile> {
        (0..NUM_TILE_TYPES as u8).map(Tile)
    }

    fn from_parts(rank: u8, suit: Suit) -> Option<Self> {
        let max_rank = if suit == Suit::Honor { 7 } else { 9 };
        if rank == 0 || rank > max_rank {
            return None;
        }
        Tile::new(suit.offset() + rank - 1)
    }
}

impl TryFrom<u8> for Tile {
    type Error = TileParseError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Tile::new(index).ok_or(TileParseError::IndexOutOfRange(index))
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> Self {
        tile.0
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit().as_char())
    }
}

/// A tile token as typed by a player: the tile plus whether it was written as a red five.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileToken {
    pub tile: Tile,
    pub red: bool,
}

impl FromStr for TileToken {
    type Err = TileParseError;

    /// Parses `5m`, `0p` (red five), `7z`. Surrounding whitespace is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        let mut chars = token.chars();
        let (Some(digit), Some(suit_char), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(TileParseError::Malformed(raw.to_string()));
        };
        let digit = digit
            .to_digit(10)
            .ok_or_else(|| TileParseError::Malformed(raw.to_string()))? as u8;
        let suit = Suit::from_char(suit_char.to_ascii_lowercase())
            .ok_or_else(|| TileParseError::Malformed(raw.to_string()))?;
        parse_rank(digit, suit).ok_or_else(|| match suit {
            Suit::Honor => TileParseError::HonorRank(raw.to_string()),
            _ => TileParseError::Malformed(raw.to_string()),
        })
    }
}

/// Resolve a rank digit within a suit; `0` is the red five of a numbered suit.
pub(crate) fn parse_rank(digit: u8, suit: Suit) -> Option<TileToken> {
    if digit == 0 {
        if suit == Suit::Honor {
            return None;
        }
        return Tile::from_parts(5, suit).map(|tile| TileToken { tile, red: true });
    }
    Tile::from_parts(digit, suit).map(|tile| TileToken { tile, red: false })
}

pub(crate) fn suit_from_char(c: char) -> Option<Suit> {
    Suit::from_char(c)
}

impl FromStr for Tile {
    type Err = TileParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.parse::<TileToken>().map(|token| token.tile)
    }
}
