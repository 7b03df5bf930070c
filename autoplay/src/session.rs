//! One player's automation session: config store plus execution gate.

use thiserror::Error;
use tracing::{info, instrument};

use crate::core::analysis::HandAnalysis;
use crate::core::command::{AUTO_HELP_TEXT, AutoCommand};
use crate::core::danger::DangerTable;
use crate::core::decision::{Action, decide};
use crate::core::hand::HandState;
use crate::core::phase::{PhaseError, TurnPhase};
use crate::io::config::{ConfigError, ConfigStore, render_config};
use crate::io::gate::{Execution, ExecutionGate, GateError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What one decision cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub phase: TurnPhase,
    pub action: Action,
    pub summary: String,
    pub execution: Execution,
}

pub struct Session {
    store: ConfigStore,
    gate: ExecutionGate,
}

impl Session {
    pub fn new(store: ConfigStore, gate: ExecutionGate) -> Self {
        Self { store, gate }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn gate(&self) -> &ExecutionGate {
        &self.gate
    }

    /// Decide and execute for the current hand. The phase is derived once, here.
    #[instrument(skip_all, fields(tiles = hand.tile_count()))]
    pub fn run_turn(
        &self,
        hand: &HandState,
        analysis: &HandAnalysis,
        danger: Option<&DangerTable>,
    ) -> Result<TurnOutcome, SessionError> {
        let config = self.store.get();
        let phase = hand.phase();
        let decision = decide(hand, phase, analysis, danger, &config)?;
        let action = decision.action();
        let summary = decision.summary();
        let execution = self.gate.apply(decision, &config)?;
        Ok(TurnOutcome {
            phase,
            action,
            summary,
            execution,
        })
    }

    /// Run an `auto-*` command and return the text to show the player.
    /// Changes are written to the config file before returning.
    pub fn apply_auto_command(&self, command: AutoCommand) -> Result<String, SessionError> {
        let message = match command {
            AutoCommand::Help => return Ok(AUTO_HELP_TEXT.to_string()),
            AutoCommand::Show => return Ok(render_config(&self.store.get())),
            AutoCommand::Reset => {
                self.store.reset()?;
                return Ok("automation config reset to defaults".to_string());
            }
            AutoCommand::Enable => {
                self.store.set_enabled(true);
                "automation enabled".to_string()
            }
            AutoCommand::Disable => {
                self.store.set_enabled(false);
                "automation disabled".to_string()
            }
            AutoCommand::Toggle => {
                if self.store.toggle_enabled() {
                    "automation enabled".to_string()
                } else {
                    "automation disabled".to_string()
                }
            }
            AutoCommand::SetStrategy(strategy) => {
                self.store.set_strategy(strategy);
                format!("strategy set to {strategy}")
            }
        };
        self.store.save()?;
        Ok(message)
    }

    /// Abort any pending reaction delay. Later dispatches fail with `Cancelled`.
    pub fn end(&self) {
        info!("session ended");
        self.gate.cancel_token().cancel();
    }
}
