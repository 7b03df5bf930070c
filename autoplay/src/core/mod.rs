//! Deterministic, pure logic for the decision engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! hand and analysis data and return deterministic outputs suitable for tests.

pub mod analysis;
pub mod command;
pub mod config;
pub mod danger;
pub mod decision;
pub mod hand;
pub mod phase;
pub mod tile;
