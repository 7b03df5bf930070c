//! Per-tile deal-in risk as estimated by the external analysis engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hand::HandState;
use crate::core::tile::{NUM_TILE_TYPES, Tile};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DangerTableError {
    #[error("danger table needs 34 entries, got {0}")]
    Length(usize),
    #[error("risk for {tile} must be within [0, 1], got {risk}")]
    OutOfRange { tile: Tile, risk: f64 },
}

/// Risk score in `[0, 1]` for every tile category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DangerTable([f64; NUM_TILE_TYPES]);

impl DangerTable {
    pub fn new(risks: [f64; NUM_TILE_TYPES]) -> Result<Self, DangerTableError> {
        for tile in Tile::all() {
            let risk = risks[tile.index() as usize];
            if !(0.0..=1.0).contains(&risk) {
                return Err(DangerTableError::OutOfRange { tile, risk });
            }
        }
        Ok(Self(risks))
    }

    /// Table with every tile at zero risk except the listed ones.
    pub fn from_risks<I>(risks: I) -> Result<Self, DangerTableError>
    where
        I: IntoIterator<Item = (Tile, f64)>,
    {
        let mut table = [0.0; NUM_TILE_TYPES];
        for (tile, risk) in risks {
            table[tile.index() as usize] = risk;
        }
        Self::new(table)
    }

    pub fn risk(&self, tile: Tile) -> f64 {
        self.0[tile.index() as usize]
    }
}

impl TryFrom<Vec<f64>> for DangerTable {
    type Error = DangerTableError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let risks: [f64; NUM_TILE_TYPES] = values
            .try_into()
            .map_err(|values: Vec<f64>| DangerTableError::Length(values.len()))?;
        Self::new(risks)
    }
}

impl From<DangerTable> for Vec<f64> {
    fn from(table: DangerTable) -> Self {
        table.0.to_vec()
    }
}

/// Risk of `tile`, treating a missing table as zero risk everywhere.
pub fn risk_of(table: Option<&DangerTable>, tile: Tile) -> f64 {
    table.map_or(0.0, |table| table.risk(tile))
}

/// Highest risk among the tiles currently held; 0 without a table or with an empty hand.
pub fn danger_level(hand: &HandState, table: Option<&DangerTable>) -> f64 {
    let Some(table) = table else {
        return 0.0;
    };
    hand.held()
        .map(|tile| table.risk(tile))
        .fold(0.0, f64::max)
}

/// Held tile with the lowest risk. Ties go to the lowest tile index.
pub fn safest_tile(hand: &HandState, table: Option<&DangerTable>) -> Option<Tile> {
    let mut best: Option<(Tile, f64)> = None;
    for tile in hand.held() {
        let risk = risk_of(table, tile);
        match best {
            Some((_, best_risk)) if risk >= best_risk => {}
            _ => best = Some((tile, risk)),
        }
    }
    best.map(|(tile, _)| tile)
}
