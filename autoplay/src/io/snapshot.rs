//! Turn snapshots: one hand plus the analysis results for it, as JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::analysis::HandAnalysis;
use crate::core::danger::DangerTable;
use crate::core::hand::HandState;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TurnSnapshot {
    /// Compact notation, e.g. `123m456p789s1122z`.
    pub hand: String,
    #[serde(default)]
    pub analysis: HandAnalysis,
    #[serde(default)]
    pub danger: Option<DangerTable>,
}

impl TurnSnapshot {
    pub fn hand_state(&self) -> Result<HandState> {
        HandState::from_notation(&self.hand).with_context(|| format!("parse hand {:?}", self.hand))
    }
}

pub fn parse_snapshot(contents: &str) -> Result<TurnSnapshot> {
    serde_json::from_str(contents).context("parse turn snapshot")
}

pub fn load_snapshot(path: &Path) -> Result<TurnSnapshot> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    parse_snapshot(&contents).with_context(|| format!("load snapshot {}", path.display()))
}
