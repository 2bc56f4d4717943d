//! Test-only helpers for building model responses and scratch conductor roots.

use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use crate::core::batch::{BatchKind, BatchSignal, ExecutionHandover, StepHelpMeta};
use crate::core::intent::IntentHandover;
use crate::io::init::{ConductorPaths, InitOptions, init_conductor};

/// Deterministic intent handover with the given implied goal.
pub fn intent_handover(goal: &str) -> IntentHandover {
    IntentHandover {
        shape: "decision".to_string(),
        key_findings: vec!["budget is fixed".to_string()],
        user_query: "Which vendor should we pick?".to_string(),
        implied_goal: goal.to_string(),
        revealed_constraints: vec!["two weeks".to_string()],
        accepted_framing: "risk first".to_string(),
        effective_stance: "decide".to_string(),
        ..IntentHandover::default()
    }
}

/// Deterministic execution handover with the given goal.
pub fn execution_handover(goal: &str) -> ExecutionHandover {
    ExecutionHandover {
        goal: goal.to_string(),
        problem_summary: "no vendor shortlist".to_string(),
        situation: "procurement opens next week".to_string(),
        constraints: vec!["time".to_string(), "budget".to_string()],
        priorities: vec!["reliability".to_string()],
        ..ExecutionHandover::default()
    }
}

/// Prose followed by an intent handover block.
pub fn handover_response(prose: &str, handover: &IntentHandover) -> String {
    format!("{prose}\n\n{}", handover.to_block())
}

/// Prose followed by a workflow batch signal.
pub fn workflow_response(prose: &str, handover: &ExecutionHandover) -> String {
    let signal = BatchSignal {
        kind: Some(BatchKind::Workflow),
        handover: Some(handover.clone()),
        meta: None,
        prompt_body: Some("Draft the workflow steps.".to_string()),
    };
    format!("{prose}\n\n{}", signal.to_block())
}

/// Prose followed by a step-help batch signal.
pub fn step_help_response(prose: &str, step: &str, blocker: &str) -> String {
    let signal = BatchSignal {
        kind: Some(BatchKind::StepHelp),
        handover: None,
        meta: Some(StepHelpMeta {
            step: Some(step.to_string()),
            blocker: Some(blocker.to_string()),
            context: None,
        }),
        prompt_body: Some(format!("How do we get past: {blocker}?")),
    };
    format!("{prose}\n\n{}", signal.to_block())
}

/// Temporary project root with `.conductor/` initialized.
pub struct TestConductor {
    dir: TempDir,
    paths: ConductorPaths,
}

impl TestConductor {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let paths = init_conductor(dir.path(), &InitOptions { force: false })?;
        Ok(Self { dir, paths })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &ConductorPaths {
        &self.paths
    }
}
