//! Stable exit codes for conductor CLI commands.

/// Command succeeded; for `conductor turn`, the phase did not change.
pub const OK: i32 = 0;
/// Command failed due to missing scaffolding, invalid config/state, or I/O errors.
pub const INVALID: i32 = 1;
/// `conductor turn` moved the conversation to a new phase.
pub const ADVANCED: i32 = 2;
/// `conductor turn` surfaced a step-help request during execution.
pub const STEP_HELP: i32 = 3;
