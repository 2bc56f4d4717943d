//! Session storage for conversation phase state.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::phase::PhaseState;

/// Persisted conversation state (`.conductor/state/session.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Identifier for the conversation, assigned at init.
    pub session_id: Option<String>,
    /// Next turn number (1-indexed, monotonically increasing).
    pub next_turn: u32,
    pub state: PhaseState,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            session_id: None,
            next_turn: 1,
            state: PhaseState::new(),
        }
    }
}

/// Load the session from disk.
pub fn load_session(path: &Path) -> Result<Session> {
    debug!(path = %path.display(), "loading session");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read session {}", path.display()))?;
    let session: Session = serde_json::from_str(&contents)
        .with_context(|| format!("parse session {}", path.display()))?;
    debug!(session_id = ?session.session_id, next_turn = session.next_turn, phase = %session.state.phase(), "session loaded");
    Ok(session)
}

/// Load the session, or a fresh one if the file does not exist yet.
pub fn load_or_default_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        debug!(path = %path.display(), "session missing, starting fresh");
        return Ok(Session::default());
    }
    load_session(path)
}

/// Atomically write the session to disk (temp file + rename).
pub fn write_session(path: &Path, session: &Session) -> Result<()> {
    debug!(path = %path.display(), next_turn = session.next_turn, phase = %session.state.phase(), "writing session");
    let mut buf = serde_json::to_string_pretty(session)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("session path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp session {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace session {}", path.display()))?;
    Ok(())
}
