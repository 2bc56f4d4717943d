//! Deterministic, pure logic for directive decoding and phase transitions.
//!
//! Core modules must be free of I/O side effects. They operate on complete
//! model responses and in-memory state, never fail, and return deterministic
//! outputs suitable for tests.

pub mod batch;
pub mod block;
pub mod intent;
pub mod phase;
pub mod record;
pub mod scalar;
