//! Side-effecting parts: config file, action channels, execution gate.

pub mod cancel;
pub mod channel;
pub mod config;
pub mod gate;
pub mod http_channel;
pub mod snapshot;
