//! Line-driven loop: draw and discard tiles, run automation commands.
//!
//! The loop owns the hand. A tile token is drawn when the hand is waiting for a
//! draw and discarded when it holds one tile too many; a hand whose tile count
//! is a multiple of three ends the loop with an error.
//!
//! The loop only keeps the hand in step with the table. It never decides or
//! dispatches: hand analysis comes from outside, so automated turns go through
//! `autoplay decide --execute` with a snapshot carrying that analysis.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::command::{CommandError, HELP_TEXT, SessionCommand, parse_command};
use crate::core::hand::HandState;
use crate::core::phase::{PhaseError, TurnPhase};
use crate::core::tile::TileToken;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    EndOfInput,
}

pub fn run<R: BufRead, W: Write>(
    session: &Session,
    hand: &mut HandState,
    input: R,
    output: &mut W,
) -> Result<LoopExit> {
    writeln!(output, "hand: {hand} ({})", hand.phase().label()).context("write output")?;
    for line in input.lines() {
        let line = line.context("read input")?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(err) => {
                writeln!(output, "{err}").context("write output")?;
                continue;
            }
        };
        match command {
            SessionCommand::Quit => return Ok(LoopExit::Quit),
            SessionCommand::Help => writeln!(output, "{HELP_TEXT}").context("write output")?,
            SessionCommand::Auto(auto) => match session.apply_auto_command(auto) {
                Ok(message) => writeln!(output, "{message}").context("write output")?,
                Err(err) => {
                    warn!(err = %err, "automation command failed");
                    writeln!(output, "error: {err}").context("write output")?;
                }
            },
            SessionCommand::Tile(token) => apply_tile(hand, &token, output)?,
        }
    }
    Ok(LoopExit::EndOfInput)
}

fn apply_tile<W: Write>(hand: &mut HandState, token: &str, output: &mut W) -> Result<()> {
    let parsed: TileToken = match token.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            writeln!(output, "{err}").context("write output")?;
            return Ok(());
        }
    };
    let (verb, result) = match hand.phase() {
        TurnPhase::Draw => ("drew", hand.draw(parsed.tile, parsed.red)),
        TurnPhase::Choice => ("discarded", hand.discard(parsed.tile, parsed.red)),
        TurnPhase::Invalid { tile_count } => return Err(PhaseError { tile_count }.into()),
    };
    match result {
        Ok(()) => {
            debug!(tile = %parsed.tile, red = parsed.red, verb, "hand updated");
            writeln!(
                output,
                "{verb} {}, hand: {hand} ({})",
                parsed.tile,
                hand.phase().label()
            )
            .context("write output")?;
        }
        Err(err) => writeln!(output, "{err}").context("write output")?,
    }
    Ok(())
}
