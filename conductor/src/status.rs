//! Status reporting for `conductor status`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::phase::Phase;
use crate::io::init::ConductorPaths;
use crate::io::session_store::{Session, load_session};

/// Summary of where a conversation stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub session_id: Option<String>,
    pub next_turn: u32,
    pub phase: Phase,
    pub turns_in_phase: u32,
    pub implied_goal: Option<String>,
    pub execution_goal: Option<String>,
    pub workflow_steps: usize,
    pub current_step: Option<String>,
}

pub fn status_of(session: &Session) -> StatusReport {
    let state = &session.state;
    let workflow = state.active_workflow();
    StatusReport {
        session_id: session.session_id.clone(),
        next_turn: session.next_turn,
        phase: state.phase(),
        turns_in_phase: state.turns_in_phase(),
        implied_goal: state.intent_handover().map(|h| h.implied_goal.clone()),
        execution_goal: state.execution_handover().map(|h| h.goal.clone()),
        workflow_steps: workflow.map_or(0, |w| w.steps.len()),
        current_step: workflow
            .and_then(|w| w.current_step())
            .map(|step| step.title.clone()),
    }
}

/// Load the session under `root` and summarize it.
pub fn read_status(root: &Path) -> Result<StatusReport> {
    let paths = ConductorPaths::new(root);
    let session = load_session(&paths.session_path).context("load session for status")?;
    Ok(status_of(&session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::{PhaseState, StepStatus, WorkflowStep, advance_phase, decode_turn};

    /// A fresh session reports orientation with no goals.
    #[test]
    fn fresh_session_reports_orientation() {
        let report = status_of(&Session::default());
        assert_eq!(report.phase, Phase::Orientation);
        assert_eq!(report.implied_goal, None);
        assert_eq!(report.workflow_steps, 0);
    }

    /// Execution reports both goals and the current step.
    #[test]
    fn execution_reports_goals_and_current_step() {
        let mut state = PhaseState::new();
        for response in [
            "<<<HANDOVER>>>\nimplied_goal: pick a vendor\n<<<END>>>",
            "<<<BATCH>>>\ntype: WORKFLOW\nhandover:\n  goal: sign a contract\n<<<END>>>",
        ] {
            let decoded = decode_turn(state.phase(), response);
            state = advance_phase(state, &decoded).state;
        }
        state
            .active_workflow_mut()
            .expect("workflow")
            .steps
            .push(WorkflowStep {
                id: "s1".to_string(),
                title: "Shortlist vendors".to_string(),
                description: String::new(),
                done_when: "three vendors listed".to_string(),
                status: StepStatus::Active,
            });
        let session = Session {
            state,
            ..Session::default()
        };

        let report = status_of(&session);
        assert_eq!(report.phase, Phase::Execution);
        assert_eq!(report.implied_goal.as_deref(), Some("pick a vendor"));
        assert_eq!(report.execution_goal.as_deref(), Some("sign a contract"));
        assert_eq!(report.workflow_steps, 1);
        assert_eq!(report.current_step.as_deref(), Some("Shortlist vendors"));
    }

    #[test]
    fn read_status_without_session_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = read_status(temp.path()).unwrap_err();
        assert!(err.to_string().contains("load session"));
    }
}
