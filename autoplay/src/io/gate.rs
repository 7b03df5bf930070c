//! Execution gate: confirmation, reaction delay and dispatch of a decision.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::config::AutoPlayConfig;
use crate::core::decision::{Action, Decision};
use crate::io::cancel::CancelToken;
use crate::io::channel::{ActionChannel, DispatchError, Observer, SimulatedChannel};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("action rejected by user")]
    UserCancelled,
    #[error("session ended before the action was dispatched")]
    Cancelled,
    #[error("{0} decision carries no tile")]
    MissingTile(Action),
    #[error("meld decision carries no meld call")]
    MissingMeld,
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Result of a successful [`ExecutionGate::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// `pass`: nothing reported, nothing sent.
    Skipped,
    /// Handed to the action channel.
    Dispatched(Action),
}

/// Asks the player to accept or reject a decision.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, decision: &Decision) -> bool;
}

impl<C: Confirmer + ?Sized> Confirmer for Arc<C> {
    fn confirm(&self, decision: &Decision) -> bool {
        (**self).confirm(decision)
    }
}

/// Prompts on stdout and reads one line from stdin; only `y`/`Y` accepts.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, decision: &Decision) -> bool {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        prompt_confirm(decision, &mut stdin.lock(), &mut stdout)
    }
}

/// Prompt through arbitrary streams. Read or write failures count as rejection.
pub fn prompt_confirm<R: BufRead, W: Write>(decision: &Decision, input: &mut R, output: &mut W) -> bool {
    if write!(output, "execute {}? (y/N): ", decision.action())
        .and_then(|()| output.flush())
        .is_err()
    {
        return false;
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => matches!(line.trim(), "y" | "Y"),
        Err(err) => {
            warn!(err = %err, "failed to read confirmation");
            false
        }
    }
}

/// Turns decisions into channel calls.
///
/// Without an attached channel the gate dispatches to a [`SimulatedChannel`],
/// so callers never branch on whether a real client is wired up.
pub struct ExecutionGate {
    channel: RwLock<Arc<dyn ActionChannel>>,
    simulated: Arc<dyn ActionChannel>,
    confirmer: Box<dyn Confirmer>,
    observer: Arc<dyn Observer>,
    cancel: CancelToken,
}

impl ExecutionGate {
    pub fn new(observer: Arc<dyn Observer>, confirmer: Box<dyn Confirmer>) -> Self {
        let simulated: Arc<dyn ActionChannel> = Arc::new(SimulatedChannel::new(observer.clone()));
        Self {
            channel: RwLock::new(simulated.clone()),
            simulated,
            confirmer,
            observer,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_channel(self, channel: Arc<dyn ActionChannel>) -> Self {
        self.attach_channel(channel);
        self
    }

    pub fn attach_channel(&self, channel: Arc<dyn ActionChannel>) {
        *self.channel.write().unwrap_or_else(PoisonError::into_inner) = channel;
        info!("action channel attached");
    }

    /// Fall back to simulated execution.
    pub fn detach_channel(&self) {
        *self.channel.write().unwrap_or_else(PoisonError::into_inner) = self.simulated.clone();
        info!("action channel detached");
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Report, confirm, wait, then dispatch one decision.
    ///
    /// Channel failures are returned unchanged; nothing is retried here.
    #[instrument(skip_all, fields(action = %decision.action(), confidence = decision.confidence()))]
    pub fn apply(&self, decision: Decision, config: &AutoPlayConfig) -> Result<Execution, GateError> {
        if decision.action() == Action::Pass {
            debug!("pass, nothing to execute");
            return Ok(Execution::Skipped);
        }

        let summary = decision.summary();
        info!(%summary, "decision");
        self.observer.decision(&decision);

        if self.cancel.is_cancelled() {
            return Err(GateError::Cancelled);
        }
        if config.confirm_actions && !self.confirmer.confirm(&decision) {
            info!("rejected by user");
            return Err(GateError::UserCancelled);
        }

        let delay = config.delay();
        if !delay.is_zero() {
            debug!(?delay, "waiting before dispatch");
            if self.cancel.wait_timeout(delay) {
                return Err(GateError::Cancelled);
            }
        }

        let channel = self
            .channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        dispatch(channel.as_ref(), &decision)?;
        Ok(Execution::Dispatched(decision.action()))
    }
}

fn dispatch(channel: &dyn ActionChannel, decision: &Decision) -> Result<(), GateError> {
    match decision.action() {
        Action::Discard => {
            let tile = decision
                .tile()
                .ok_or(GateError::MissingTile(Action::Discard))?;
            channel.discard(tile)?;
        }
        Action::Meld => {
            let call = decision.meld_call().ok_or(GateError::MissingMeld)?;
            channel.meld(call)?;
        }
        Action::Riichi => channel.riichi()?,
        Action::Agari => channel.agari()?,
        Action::Pass => channel.pass()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    use crate::core::analysis::MeldKind;
    use crate::core::decision::MeldCall;
    use crate::core::tile::Tile;
    use crate::test_support::{Dispatched, RecordingChannel, RecordingObserver, ScriptedConfirmer};

    fn tile(s: &str) -> Tile {
        s.parse().expect("tile")
    }

    fn quick_config() -> AutoPlayConfig {
        AutoPlayConfig {
            enabled: true,
            auto_meld: true,
            auto_riichi: true,
            confirm_actions: false,
            delay_seconds: 0.0,
            ..AutoPlayConfig::default()
        }
    }

    fn gate_with(
        answers: Vec<bool>,
    ) -> (ExecutionGate, Arc<RecordingObserver>, Arc<RecordingChannel>) {
        let observer = Arc::new(RecordingObserver::default());
        let channel = Arc::new(RecordingChannel::default());
        let gate = ExecutionGate::new(observer.clone(), Box::new(ScriptedConfirmer::new(answers)))
            .with_channel(channel.clone());
        (gate, observer, channel)
    }

    #[test]
    fn pass_is_a_silent_no_op() {
        let (gate, observer, channel) = gate_with(Vec::new());
        let execution = gate
            .apply(Decision::pass("nothing"), &quick_config())
            .expect("apply");
        assert_eq!(execution, Execution::Skipped);
        assert!(observer.lines().is_empty());
        assert!(channel.calls().is_empty());
    }

    #[test]
    fn rejection_cancels_without_dispatch() {
        let (gate, observer, channel) = gate_with(vec![false]);
        let config = AutoPlayConfig {
            confirm_actions: true,
            ..quick_config()
        };
        let err = gate
            .apply(Decision::discard(tile("5m"), 0.9, "attack"), &config)
            .expect_err("rejected");
        assert!(matches!(err, GateError::UserCancelled));
        assert!(channel.calls().is_empty());
        assert_eq!(observer.lines().len(), 1);
    }

    #[test]
    fn acceptance_dispatches() {
        let (gate, _, channel) = gate_with(vec![true]);
        let config = AutoPlayConfig {
            confirm_actions: true,
            ..quick_config()
        };
        let execution = gate
            .apply(Decision::discard(tile("5m"), 0.9, "attack"), &config)
            .expect("apply");
        assert_eq!(execution, Execution::Dispatched(Action::Discard));
        assert_eq!(channel.calls(), vec![Dispatched::Discard(tile("5m"))]);
    }

    #[test]
    fn detached_gate_simulates_riichi() {
        let observer = Arc::new(RecordingObserver::default());
        let gate = ExecutionGate::new(observer.clone(), Box::new(ScriptedConfirmer::new(Vec::new())));
        let execution = gate
            .apply(Decision::riichi(0.8, "tenpai"), &quick_config())
            .expect("apply");
        assert_eq!(execution, Execution::Dispatched(Action::Riichi));
        assert!(observer.lines().iter().any(|line| line == "simulated riichi"));
    }

    #[test]
    fn detach_falls_back_to_simulation() {
        let (gate, observer, channel) = gate_with(Vec::new());
        gate.detach_channel();
        gate.apply(Decision::agari(1.0, "complete"), &quick_config())
            .expect("apply");
        assert!(channel.calls().is_empty());
        assert!(observer.lines().iter().any(|line| line == "simulated agari"));
    }

    #[test]
    fn meld_dispatch_uses_decided_kind() {
        let (gate, _, channel) = gate_with(Vec::new());
        let call = MeldCall {
            kind: MeldKind::Quad,
            tile: tile("7z"),
            combination: vec![tile("7z"); 4],
        };
        gate.apply(Decision::meld(call.clone(), 0.75, "kan"), &quick_config())
            .expect("apply");
        assert_eq!(channel.calls(), vec![Dispatched::Meld(call)]);
    }

    #[test]
    fn channel_failure_surfaces_unchanged() {
        let observer = Arc::new(RecordingObserver::default());
        let channel = Arc::new(RecordingChannel::failing_with_status(503));
        let gate = ExecutionGate::new(observer, Box::new(ScriptedConfirmer::new(Vec::new())))
            .with_channel(channel);
        let err = gate
            .apply(Decision::agari(1.0, "complete"), &quick_config())
            .expect_err("fails");
        assert!(matches!(
            err,
            GateError::Dispatch(DispatchError::Status { code: 503 })
        ));
    }

    #[test]
    fn action_switches_do_not_block_dispatch() {
        let (gate, observer, channel) = gate_with(Vec::new());
        let config = AutoPlayConfig {
            enabled: true,
            confirm_actions: false,
            delay_seconds: 0.0,
            ..AutoPlayConfig::default()
        };
        assert!(!config.auto_riichi);
        let execution = gate
            .apply(Decision::riichi(0.9, "tenpai"), &config)
            .expect("apply");
        assert_eq!(execution, Execution::Dispatched(Action::Riichi));
        assert_eq!(channel.calls(), vec![Dispatched::Riichi]);
        assert_eq!(observer.lines(), vec!["auto: riichi (90.0%): tenpai"]);
    }

    #[test]
    fn low_confidence_still_asks_for_confirmation() {
        let confirmer = Arc::new(ScriptedConfirmer::new(vec![false]));
        let channel = Arc::new(RecordingChannel::default());
        let gate = ExecutionGate::new(Arc::new(RecordingObserver::default()), Box::new(confirmer.clone()))
            .with_channel(channel.clone());
        let config = AutoPlayConfig {
            enabled: true,
            confirm_actions: true,
            ..AutoPlayConfig::default()
        };
        let err = gate
            .apply(Decision::discard(tile("1p"), 0.68, "risky"), &config)
            .expect_err("rejected");
        assert!(matches!(err, GateError::UserCancelled));
        assert_eq!(confirmer.asked().len(), 1);
        assert!(channel.calls().is_empty());
    }

    #[test]
    fn cancelled_session_aborts_pending_delay() {
        let (gate, _, channel) = gate_with(Vec::new());
        let config = AutoPlayConfig {
            delay_seconds: 10.0,
            ..quick_config()
        };
        let token = gate.cancel_token().clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            token.cancel();
        });
        let started = Instant::now();
        let err = gate
            .apply(Decision::agari(1.0, "complete"), &config)
            .expect_err("cancelled");
        canceller.join().expect("join");
        assert!(matches!(err, GateError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(channel.calls().is_empty());
    }

    #[test]
    fn delay_is_observed_before_dispatch() {
        let (gate, _, channel) = gate_with(Vec::new());
        let config = AutoPlayConfig {
            delay_seconds: 0.05,
            ..quick_config()
        };
        let started = Instant::now();
        gate.apply(Decision::agari(1.0, "complete"), &config)
            .expect("apply");
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(channel.calls(), vec![Dispatched::Agari]);
    }

    #[test]
    fn prompt_accepts_only_yes() {
        let decision = Decision::agari(1.0, "complete");
        let mut out = Vec::new();
        assert!(prompt_confirm(&decision, &mut Cursor::new("y\n"), &mut out));
        assert!(!prompt_confirm(&decision, &mut Cursor::new("yes\n"), &mut out));
        assert!(!prompt_confirm(&decision, &mut Cursor::new(""), &mut out));
        let prompt = String::from_utf8(out).expect("utf8");
        assert!(prompt.starts_with("execute agari? (y/N): "));
    }
}
