//! I/O helpers for conductor commands.

pub mod config;
pub mod init;
pub mod prompt;
pub mod session_store;
pub mod turn_log;
