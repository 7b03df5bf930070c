//! Stable exit codes for autoplay CLI commands.

/// Command succeeded (including skipped decisions).
pub const OK: i32 = 0;
/// Invalid config, snapshot, hand or arguments, or any other error.
pub const INVALID: i32 = 1;
/// The player rejected the action or the session ended before dispatch.
pub const CANCELLED: i32 = 2;
/// The action channel failed to deliver the action.
pub const DISPATCH_FAILED: i32 = 3;
