//! Decision and action dispatch for a riichi mahjong assistant.
//!
//! Keeps its strategy configuration in `auto_player_config.json` (working
//! directory by default), decides turns from JSON snapshots produced by the
//! hand-analysis engine, and optionally executes them against a game client
//! bridge over HTTP.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use autoplay::core::command::AutoCommand;
use autoplay::core::config::Strategy;
use autoplay::core::decision::decide;
use autoplay::core::hand::HandState;
use autoplay::exit_codes;
use autoplay::interact::{self, LoopExit};
use autoplay::io::channel::ConsoleObserver;
use autoplay::io::config::{CONFIG_FILE_NAME, ConfigStore};
use autoplay::io::gate::{Execution, ExecutionGate, GateError, StdinConfirmer};
use autoplay::io::http_channel::{DEFAULT_DISPATCH_TIMEOUT, HttpActionChannel};
use autoplay::io::snapshot::load_snapshot;
use autoplay::logging;
use autoplay::session::{Session, SessionError};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "autoplay",
    version,
    about = "Decision and action dispatch for a riichi mahjong assistant"
)]
struct Cli {
    /// Config file (default: ./auto_player_config.json).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect or change the automation config.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Decide one turn from a JSON snapshot of hand, analysis and danger table.
    Decide {
        snapshot: PathBuf,
        /// Run the decision through confirmation, delay and dispatch.
        #[arg(long)]
        execute: bool,
        /// Game client bridge base URL; actions are simulated without it.
        #[arg(long, requires = "execute", value_name = "URL")]
        endpoint: Option<String>,
        #[arg(long, default_value_t = DEFAULT_DISPATCH_TIMEOUT.as_secs(), value_name = "N")]
        timeout_secs: u64,
        /// Print the decision as JSON instead of a summary line.
        #[arg(long, conflicts_with = "execute")]
        json: bool,
    },
    /// Read draws, discards and auto-* commands from stdin.
    Interact {
        /// Starting hand, e.g. 123456789m1234p.
        #[arg(long)]
        hand: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active config.
    Show,
    Enable,
    Disable,
    Toggle,
    /// Restore and persist the defaults.
    Reset,
    /// Switch discard strategy (aggressive, balanced, defensive).
    Strategy { name: Strategy },
}

impl From<ConfigAction> for AutoCommand {
    fn from(action: ConfigAction) -> Self {
        match action {
            ConfigAction::Show => AutoCommand::Show,
            ConfigAction::Enable => AutoCommand::Enable,
            ConfigAction::Disable => AutoCommand::Disable,
            ConfigAction::Toggle => AutoCommand::Toggle,
            ConfigAction::Reset => AutoCommand::Reset,
            ConfigAction::Strategy { name } => AutoCommand::SetStrategy(name),
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version land here too and are not failures.
            err.print().context("print usage")?;
            return Ok(if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            });
        }
    };
    let store = ConfigStore::new(cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)));
    // Reset overwrites the file, so it must not depend on the file being valid.
    let resetting = matches!(
        cli.command,
        Command::Config {
            action: ConfigAction::Reset
        }
    );
    if !resetting {
        store
            .load()
            .with_context(|| format!("load config {}", store.path().display()))?;
    }
    match cli.command {
        Command::Config { action } => cmd_config(store, action),
        Command::Decide {
            snapshot,
            execute,
            endpoint,
            timeout_secs,
            json,
        } => {
            if execute {
                cmd_execute(store, &snapshot, endpoint.as_deref(), timeout_secs)
            } else {
                cmd_decide(&store, &snapshot, json)
            }
        }
        Command::Interact { hand } => cmd_interact(store, &hand),
    }
}

fn console_session(store: ConfigStore) -> Session {
    let gate = ExecutionGate::new(Arc::new(ConsoleObserver), Box::new(StdinConfirmer));
    Session::new(store, gate)
}

fn cmd_config(store: ConfigStore, action: ConfigAction) -> Result<i32> {
    let session = console_session(store);
    let message = session
        .apply_auto_command(action.into())
        .context("update config")?;
    println!("{message}");
    Ok(exit_codes::OK)
}

fn cmd_decide(store: &ConfigStore, snapshot_path: &Path, json: bool) -> Result<i32> {
    let snapshot = load_snapshot(snapshot_path)?;
    let hand = snapshot.hand_state()?;
    let decision = decide(
        &hand,
        hand.phase(),
        &snapshot.analysis,
        snapshot.danger.as_ref(),
        &store.get(),
    )?;
    if json {
        let mut payload = serde_json::to_string_pretty(&decision).context("serialize decision")?;
        payload.push('\n');
        print!("{payload}");
    } else {
        println!("{}", decision.summary());
    }
    Ok(exit_codes::OK)
}

fn cmd_execute(
    store: ConfigStore,
    snapshot_path: &Path,
    endpoint: Option<&str>,
    timeout_secs: u64,
) -> Result<i32> {
    let snapshot = load_snapshot(snapshot_path)?;
    let hand = snapshot.hand_state()?;
    let session = console_session(store);
    if let Some(endpoint) = endpoint {
        let channel = HttpActionChannel::new(endpoint, Duration::from_secs(timeout_secs))
            .context("build http channel")?;
        session.gate().attach_channel(Arc::new(channel));
    }
    let outcome = session.run_turn(&hand, &snapshot.analysis, snapshot.danger.as_ref())?;
    // The gate reports everything except passes.
    if outcome.execution == Execution::Skipped {
        println!("{}", outcome.summary);
    }
    Ok(exit_codes::OK)
}

fn cmd_interact(store: ConfigStore, notation: &str) -> Result<i32> {
    let mut hand = HandState::from_notation(notation)
        .with_context(|| format!("parse hand {notation:?}"))?;
    let session = console_session(store);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let exit = interact::run(&session, &mut hand, stdin.lock(), &mut stdout)?;
    session.end();
    match exit {
        LoopExit::Quit | LoopExit::EndOfInput => Ok(exit_codes::OK),
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(gate) = cause.downcast_ref::<GateError>() {
            return gate_exit_code(gate);
        }
        if let Some(SessionError::Gate(gate)) = cause.downcast_ref::<SessionError>() {
            return gate_exit_code(gate);
        }
    }
    exit_codes::INVALID
}

fn gate_exit_code(err: &GateError) -> i32 {
    match err {
        GateError::UserCancelled | GateError::Cancelled => exit_codes::CANCELLED,
        GateError::Dispatch(_) => exit_codes::DISPATCH_FAILED,
        GateError::MissingTile(_) | GateError::MissingMeld => exit_codes::INVALID,
    }
}
