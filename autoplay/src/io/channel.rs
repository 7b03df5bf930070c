//! Action channel abstraction.
//!
//! The [`ActionChannel`] trait decouples the execution gate from the game
//! client bridge. [`SimulatedChannel`] is the default when nothing is attached:
//! it reports what would have been sent and always succeeds.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use crossterm::style::{Color, Stylize};
use thiserror::Error;
use tracing::info;

use crate::core::decision::{ConfidenceBand, Decision, MeldCall};
use crate::core::tile::Tile;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("serialize action request")]
    Serialization(#[source] serde_json::Error),
    #[error("send action request")]
    Transport(#[source] reqwest::Error),
    #[error("action request timed out after {0:?}")]
    Timeout(Duration),
    #[error("action endpoint returned status {code}")]
    Status { code: u16 },
}

/// Sink for the five dispatchable actions.
pub trait ActionChannel: Send + Sync {
    fn discard(&self, tile: Tile) -> Result<(), DispatchError>;
    fn meld(&self, call: &MeldCall) -> Result<(), DispatchError>;
    fn riichi(&self) -> Result<(), DispatchError>;
    fn agari(&self) -> Result<(), DispatchError>;
    fn pass(&self) -> Result<(), DispatchError>;
}

/// Where human-readable reports go (decision summaries, simulated executions).
pub trait Observer: Send + Sync {
    fn report(&self, line: &str);

    /// Announce a decision about to go through the gate.
    fn decision(&self, decision: &Decision) {
        self.report(&decision_line(decision));
    }
}

pub fn decision_line(decision: &Decision) -> String {
    format!("auto: {}", decision.summary())
}

pub fn band_color(band: ConfidenceBand) -> Color {
    match band {
        ConfidenceBand::Low => Color::Red,
        ConfidenceBand::Medium => Color::Yellow,
        ConfidenceBand::High => Color::Green,
    }
}

/// Prints reports to stdout. Decision lines are coloured by confidence band
/// when stdout is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn report(&self, line: &str) {
        println!("{line}");
    }

    fn decision(&self, decision: &Decision) {
        let line = decision_line(decision);
        if io::stdout().is_terminal() {
            println!("{}", line.with(band_color(decision.band())));
        } else {
            println!("{line}");
        }
    }
}

/// Null-object channel: reports the action instead of transmitting it.
pub struct SimulatedChannel {
    observer: Arc<dyn Observer>,
}

impl SimulatedChannel {
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self { observer }
    }

    fn simulate(&self, what: &str) -> Result<(), DispatchError> {
        info!(action = what, "simulated execution");
        self.observer.report(&format!("simulated {what}"));
        Ok(())
    }
}

impl Default for SimulatedChannel {
    fn default() -> Self {
        Self::new(Arc::new(ConsoleObserver))
    }
}

impl ActionChannel for SimulatedChannel {
    fn discard(&self, tile: Tile) -> Result<(), DispatchError> {
        self.simulate(&format!("discard {tile}"))
    }

    fn meld(&self, call: &MeldCall) -> Result<(), DispatchError> {
        self.simulate(&format!("{} on {}", call.kind, call.tile))
    }

    fn riichi(&self) -> Result<(), DispatchError> {
        self.simulate("riichi")
    }

    fn agari(&self) -> Result<(), DispatchError> {
        self.simulate("agari")
    }

    fn pass(&self) -> Result<(), DispatchError> {
        self.simulate("pass")
    }
}
