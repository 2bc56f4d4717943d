//! Conversation phase state machine.
//!
//! A conversation moves `Orientation → Exploration → Execution` and never
//! backwards. Each model turn is decoded with the decoder for the current
//! phase ([`decode_turn`]) and then applied with [`advance_phase`], which
//! consumes the previous state and returns the next one.
//!
//! The handovers a phase depends on live inside [`Stage`], so a state in
//! `Exploration` always carries its intent handover and a state in
//! `Execution` always carries both handovers and a workflow.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::batch::{
    BatchDecode, BatchKind, BatchSignal, ExecutionHandover, StepHelpMeta, decode_batch_signal,
};
use crate::core::intent::{IntentDecode, IntentHandover, decode_intent_handover};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Orientation,
    Exploration,
    Execution,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orientation => "orientation",
            Self::Exploration => "exploration",
            Self::Execution => "execution",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub done_when: String,
    pub status: StepStatus,
}

/// Workflow being executed. Steps are filled in and advanced by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWorkflow {
    pub goal: String,
    pub steps: Vec<WorkflowStep>,
    pub current_step_index: usize,
}

impl ActiveWorkflow {
    /// Empty workflow for a freshly accepted execution handover.
    pub fn shell(handover: &ExecutionHandover) -> Self {
        Self {
            goal: handover.goal.clone(),
            steps: Vec::new(),
            current_step_index: 0,
        }
    }

    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.steps.get(self.current_step_index)
    }
}

/// Phase plus the payloads that phase requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Stage {
    Orientation,
    Exploration {
        intent: IntentHandover,
    },
    Execution {
        intent: IntentHandover,
        execution: ExecutionHandover,
        workflow: ActiveWorkflow,
    },
}

impl Stage {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Orientation => Phase::Orientation,
            Self::Exploration { .. } => Phase::Exploration,
            Self::Execution { .. } => Phase::Execution,
        }
    }
}

/// Per-conversation phase state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    stage: Stage,
    turns_in_phase: u32,
    /// Caller-owned metadata, passed through untouched.
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Caller-owned handles to analyses still in flight.
    #[serde(default)]
    pub pending_analyses: Vec<String>,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Orientation,
            turns_in_phase: 0,
            context: BTreeMap::new(),
            pending_analyses: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.stage.phase()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn turns_in_phase(&self) -> u32 {
        self.turns_in_phase
    }

    pub fn intent_handover(&self) -> Option<&IntentHandover> {
        match &self.stage {
            Stage::Orientation => None,
            Stage::Exploration { intent } | Stage::Execution { intent, .. } => Some(intent),
        }
    }

    pub fn execution_handover(&self) -> Option<&ExecutionHandover> {
        match &self.stage {
            Stage::Execution { execution, .. } => Some(execution),
            _ => None,
        }
    }

    pub fn active_workflow(&self) -> Option<&ActiveWorkflow> {
        match &self.stage {
            Stage::Execution { workflow, .. } => Some(workflow),
            _ => None,
        }
    }

    /// Mutable access for the collaborator that populates and advances steps.
    pub fn active_workflow_mut(&mut self) -> Option<&mut ActiveWorkflow> {
        match &mut self.stage {
            Stage::Execution { workflow, .. } => Some(workflow),
            _ => None,
        }
    }
}

/// A model turn decoded with the decoder that matches its phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum DecodedTurn {
    Intent(IntentDecode),
    Batch(BatchDecode),
}

impl DecodedTurn {
    /// Response text with the directive block removed.
    pub fn user_response(&self) -> &str {
        match self {
            Self::Intent(decoded) => &decoded.user_response,
            Self::Batch(decoded) => &decoded.user_response,
        }
    }
}

/// Decode `response` with the decoder relevant to `phase`.
///
/// Orientation looks for an intent handover; later phases look for a batch
/// signal.
pub fn decode_turn(phase: Phase, response: &str) -> DecodedTurn {
    match phase {
        Phase::Orientation => DecodedTurn::Intent(decode_intent_handover(response)),
        Phase::Exploration | Phase::Execution => {
            DecodedTurn::Batch(decode_batch_signal(response))
        }
    }
}

/// What a turn did to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PhaseEvent {
    Stayed,
    EnteredExploration,
    /// Execution started; the caller should populate the workflow steps.
    EnteredExecution,
    /// A blocked step asked for help. The phase is unchanged.
    StepHelpRequested {
        meta: StepHelpMeta,
        prompt_body: Option<String>,
    },
}

impl PhaseEvent {
    pub fn changed_phase(&self) -> bool {
        matches!(self, Self::EnteredExploration | Self::EnteredExecution)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    pub state: PhaseState,
    pub event: PhaseEvent,
}

/// Apply one decoded turn to `state`.
///
/// `turns_in_phase` resets to 0 when the phase changes and is incremented
/// otherwise. A decoded payload that does not belong to the current phase is
/// treated as no directive.
pub fn advance_phase(mut state: PhaseState, decoded: &DecodedTurn) -> PhaseTransition {
    let from = state.phase();
    let stage = std::mem::replace(&mut state.stage, Stage::Orientation);

    let (stage, event) = match (stage, decoded) {
        (
            Stage::Orientation,
            DecodedTurn::Intent(IntentDecode {
                handover: Some(intent),
                ..
            }),
        ) => (
            Stage::Exploration {
                intent: intent.clone(),
            },
            PhaseEvent::EnteredExploration,
        ),
        (
            Stage::Exploration { intent },
            DecodedTurn::Batch(BatchDecode {
                signal:
                    BatchSignal {
                        kind: Some(BatchKind::Workflow),
                        handover: Some(execution),
                        ..
                    },
                ..
            }),
        ) => (
            Stage::Execution {
                intent,
                execution: execution.clone(),
                workflow: ActiveWorkflow::shell(execution),
            },
            PhaseEvent::EnteredExecution,
        ),
        (
            stage @ Stage::Execution { .. },
            DecodedTurn::Batch(BatchDecode {
                signal:
                    BatchSignal {
                        kind: Some(BatchKind::StepHelp),
                        meta,
                        prompt_body,
                        ..
                    },
                ..
            }),
        ) => (
            stage,
            PhaseEvent::StepHelpRequested {
                meta: meta.clone().unwrap_or_default(),
                prompt_body: prompt_body.clone(),
            },
        ),
        (stage, _) => (stage, PhaseEvent::Stayed),
    };

    state.stage = stage;
    let to = state.phase();
    if to != from {
        info!(%from, %to, "phase transition");
        state.turns_in_phase = 0;
    } else {
        state.turns_in_phase = state.turns_in_phase.saturating_add(1);
        debug!(phase = %to, turns_in_phase = state.turns_in_phase, "phase unchanged");
    }

    PhaseTransition { state, event }
}
