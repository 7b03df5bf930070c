//! Test-only fakes for the gate's collaborators and small builders.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::TempDir;

use crate::core::config::AutoPlayConfig;
use crate::core::decision::{Decision, MeldCall};
use crate::core::hand::HandState;
use crate::core::tile::Tile;
use crate::io::channel::{ActionChannel, DispatchError, Observer};
use crate::io::config::ConfigStore;
use crate::io::gate::{Confirmer, ExecutionGate};
use crate::session::Session;

/// Parse a tile from notation, panicking on bad input.
pub fn tile(notation: &str) -> Tile {
    notation.parse().expect("valid tile notation")
}

/// Build a hand from compact notation, panicking on bad input.
pub fn hand(notation: &str) -> HandState {
    HandState::from_notation(notation).expect("valid hand notation")
}

/// Enabled config with no prompt and no delay.
pub fn instant_config() -> AutoPlayConfig {
    AutoPlayConfig {
        enabled: true,
        confirm_actions: false,
        delay_seconds: 0.0,
        ..AutoPlayConfig::default()
    }
}

/// Collects every reported line.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    lines: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Observer for RecordingObserver {
    fn report(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Discard(Tile),
    Meld(MeldCall),
    Riichi,
    Agari,
    Pass,
}

/// Channel that records calls and optionally fails every one with a status code.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    calls: Mutex<Vec<Dispatched>>,
    fail_status: Option<u16>,
}

impl RecordingChannel {
    pub fn failing_with_status(code: u16) -> Self {
        Self {
            fail_status: Some(code),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Dispatched> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: Dispatched) -> Result<(), DispatchError> {
        if let Some(code) = self.fail_status {
            return Err(DispatchError::Status { code });
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

impl ActionChannel for RecordingChannel {
    fn discard(&self, tile: Tile) -> Result<(), DispatchError> {
        self.record(Dispatched::Discard(tile))
    }

    fn meld(&self, call: &MeldCall) -> Result<(), DispatchError> {
        self.record(Dispatched::Meld(call.clone()))
    }

    fn riichi(&self) -> Result<(), DispatchError> {
        self.record(Dispatched::Riichi)
    }

    fn agari(&self) -> Result<(), DispatchError> {
        self.record(Dispatched::Agari)
    }

    fn pass(&self) -> Result<(), DispatchError> {
        self.record(Dispatched::Pass)
    }
}

/// Answers confirmations from a script; rejects once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            asked: Mutex::default(),
        }
    }

    pub fn accepting() -> Self {
        Self::new(vec![true; 64])
    }

    /// Summaries of every decision put to the confirmer.
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, decision: &Decision) -> bool {
        self.asked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(decision.summary());
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(false)
    }
}

/// A session whose config file lives in a scratch directory, wired to recording fakes.
pub struct TempSession {
    pub dir: TempDir,
    pub session: Session,
    pub observer: Arc<RecordingObserver>,
    pub channel: Arc<RecordingChannel>,
}

/// Build a [`TempSession`] with `config` active (not yet persisted).
pub fn temp_session(config: AutoPlayConfig, confirmer: ScriptedConfirmer) -> TempSession {
    temp_session_with_channel(config, confirmer, RecordingChannel::default())
}

pub fn temp_session_with_channel(
    config: AutoPlayConfig,
    confirmer: ScriptedConfirmer,
    channel: RecordingChannel,
) -> TempSession {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = ConfigStore::in_dir(dir.path());
    store.set(config).expect("valid config");
    let observer = Arc::new(RecordingObserver::default());
    let channel = Arc::new(channel);
    let gate = ExecutionGate::new(observer.clone(), Box::new(confirmer)).with_channel(channel.clone());
    TempSession {
        dir,
        session: Session::new(store, gate),
        observer,
        channel,
    }
}
