//! Automated decision and action dispatch for a riichi mahjong assistant.
//!
//! The crate keeps a strict split:
//!
//! - **[`core`]**: Pure logic (tiles, hand bookkeeping, turn phase, config
//!   validation, the decision policy). No I/O.
//! - **[`io`]**: Side effects (config file, action channels, the execution
//!   gate with its confirmation prompt and reaction delay).
//!
//! [`session`] ties one config store to one gate and runs a decision cycle per
//! call; [`interact`] drives a session from line-oriented input.

pub mod core;
pub mod exit_codes;
pub mod interact;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
