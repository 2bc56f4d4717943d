//! Turn logging helpers for `.conductor/turns/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::phase::{Phase, PhaseEvent};

/// Summary of one processed model turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub session_id: Option<String>,
    pub turn: u32,
    /// RFC 3339 timestamp of when the turn was processed.
    pub recorded_at: String,
    pub phase_before: Phase,
    pub phase_after: Phase,
    pub turns_in_phase: u32,
    pub event: PhaseEvent,
    /// Response text with any directive block removed.
    pub user_response: String,
}

#[derive(Debug, Clone)]
pub struct TurnPaths {
    pub dir: PathBuf,
    pub record_path: PathBuf,
    pub response_path: PathBuf,
    pub prompt_path: PathBuf,
}

impl TurnPaths {
    pub fn new(root: &Path, turn: u32) -> Self {
        let dir = root
            .join(".conductor")
            .join("turns")
            .join(turn.to_string());
        Self {
            dir: dir.clone(),
            record_path: dir.join("record.json"),
            response_path: dir.join("response.md"),
            prompt_path: dir.join("next_prompt.md"),
        }
    }
}

pub struct TurnWriteRequest<'a> {
    pub root: &'a Path,
    pub record: &'a TurnRecord,
    /// Raw model response as received.
    pub response: &'a str,
    pub next_prompt: &'a str,
}

pub fn write_turn(request: &TurnWriteRequest<'_>) -> Result<TurnPaths> {
    let paths = TurnPaths::new(request.root, request.record.turn);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create turn dir {}", paths.dir.display()))?;

    write_json(&paths.record_path, request.record)?;
    write_text(&paths.response_path, request.response)?;
    write_text(&paths.prompt_path, request.next_prompt)?;

    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}
