//! Orchestration for a single `conductor turn`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use crate::core::phase::{Phase, PhaseEvent, advance_phase, decode_turn};
use crate::io::config::load_config;
use crate::io::init::ConductorPaths;
use crate::io::prompt::{NextPrompt, PromptSelector};
use crate::io::session_store::{load_or_default_session, write_session};
use crate::io::turn_log::{TurnPaths, TurnRecord, TurnWriteRequest, write_turn};

/// Result of processing one model response.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: Option<String>,
    /// Turn number (1-indexed).
    pub turn: u32,
    pub phase_before: Phase,
    pub phase_after: Phase,
    pub turns_in_phase: u32,
    pub event: PhaseEvent,
    /// Response text with any directive block removed.
    pub user_response: String,
    pub next_prompt: NextPrompt,
    pub turn_paths: TurnPaths,
}

/// Process one complete model response for the conversation rooted at `root`.
///
/// Decodes the response for the current phase, applies the transition,
/// renders the next prompt, and persists the turn log and session. The
/// session is written last so a failed turn leaves the stored state as it
/// was.
pub fn run_turn(root: &Path, response: &str) -> Result<TurnOutcome> {
    let paths = ConductorPaths::new(root);
    if !paths.conductor_dir.is_dir() {
        bail!("missing .conductor directory (run `conductor init` first)");
    }
    let cfg = load_config(&paths.config_path)?;
    let selector = PromptSelector::new(&cfg)?;
    let mut session = load_or_default_session(&paths.session_path)?;
    let turn = session.next_turn;

    let phase_before = session.state.phase();
    let decoded = decode_turn(phase_before, response);
    let transition = advance_phase(session.state, &decoded);
    let phase_after = transition.state.phase();
    let turns_in_phase = transition.state.turns_in_phase();
    let next_prompt = selector.select(&transition.state, &transition.event)?;

    let record = TurnRecord {
        session_id: session.session_id.clone(),
        turn,
        recorded_at: Utc::now().to_rfc3339(),
        phase_before,
        phase_after,
        turns_in_phase,
        event: transition.event.clone(),
        user_response: decoded.user_response().to_string(),
    };
    let turn_paths = write_turn(&TurnWriteRequest {
        root,
        record: &record,
        response,
        next_prompt: &next_prompt.content,
    })?;
    fs::write(&paths.next_prompt_path, &next_prompt.content)
        .with_context(|| format!("write {}", paths.next_prompt_path.display()))?;

    session.state = transition.state;
    session.next_turn = turn.saturating_add(1);
    write_session(&paths.session_path, &session)?;

    info!(turn, from = %phase_before, to = %phase_after, prompt = ?next_prompt.kind, "turn processed");
    Ok(TurnOutcome {
        session_id: session.session_id,
        turn,
        phase_before,
        phase_after,
        turns_in_phase,
        event: transition.event,
        user_response: record.user_response,
        next_prompt,
        turn_paths,
    })
}
