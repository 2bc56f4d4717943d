//! Directive extraction and phase transitions for multi-phase model conversations.
//!
//! A conversation moves through orientation, exploration, and execution. The
//! model signals each boundary by embedding a delimited directive block in its
//! otherwise free-form response; this crate finds and decodes those blocks and
//! advances the conversation accordingly. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (block extraction, record
//!   decoding, handover builders, the phase state machine). No I/O, never
//!   fails on malformed model output.
//! - **[`io`]**: Side-effecting operations (config, session store, turn log,
//!   prompt rendering, scaffolding).
//!
//! Orchestration modules ([`turn`], [`status`]) coordinate core logic with I/O
//! to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
