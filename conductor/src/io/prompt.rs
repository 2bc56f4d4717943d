//! Next-prompt selection for the current conversation phase.

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::batch::{BATCH_REQUEST_END, BATCH_REQUEST_START};
use crate::core::intent::{HANDOVER_END, HANDOVER_START};
use crate::core::phase::{Phase, PhaseEvent, PhaseState};
use crate::io::config::ConductorConfig;

const ORIENTATION_TEMPLATE: &str = include_str!("prompts/orientation.md");
const EXPLORATION_TEMPLATE: &str = include_str!("prompts/exploration.md");
const EXECUTION_TEMPLATE: &str = include_str!("prompts/execution.md");
const STEP_HELP_TEMPLATE: &str = include_str!("prompts/step_help.md");

const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Which template produced a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Orientation,
    Exploration,
    Execution,
    StepHelp,
}

impl PromptKind {
    fn template_name(self) -> &'static str {
        match self {
            Self::Orientation => "orientation",
            Self::Exploration => "exploration",
            Self::Execution => "execution",
            Self::StepHelp => "step_help",
        }
    }
}

/// A rendered prompt ready to send to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextPrompt {
    pub kind: PromptKind,
    pub content: String,
}

/// Renders the follow-up prompt for a conversation after each turn.
pub struct PromptSelector {
    env: Environment<'static>,
    budget_bytes: usize,
    orientation_nudge_after_turns: u32,
    exploration_nudge_after_turns: u32,
}

impl PromptSelector {
    pub fn new(config: &ConductorConfig) -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("orientation", ORIENTATION_TEMPLATE),
            ("exploration", EXPLORATION_TEMPLATE),
            ("execution", EXECUTION_TEMPLATE),
            ("step_help", STEP_HELP_TEMPLATE),
        ] {
            env.add_template(name, source)
                .with_context(|| format!("load {name} template"))?;
        }
        Ok(Self {
            env,
            budget_bytes: config.prompt_budget_bytes,
            orientation_nudge_after_turns: config.orientation_nudge_after_turns,
            exploration_nudge_after_turns: config.exploration_nudge_after_turns,
        })
    }

    /// Render the prompt that should follow a turn ending in `state` and `event`.
    ///
    /// A step-help request gets the side-query template; otherwise the
    /// template follows the phase.
    pub fn select(&self, state: &PhaseState, event: &PhaseEvent) -> Result<NextPrompt> {
        let kind = match (event, state.phase()) {
            (PhaseEvent::StepHelpRequested { .. }, _) => PromptKind::StepHelp,
            (_, Phase::Orientation) => PromptKind::Orientation,
            (_, Phase::Exploration) => PromptKind::Exploration,
            (_, Phase::Execution) => PromptKind::Execution,
        };
        let nudge = self.should_nudge(state);

        let (meta, prompt_body) = match event {
            PhaseEvent::StepHelpRequested { meta, prompt_body } => {
                (Some(meta), prompt_body.as_deref())
            }
            _ => (None, None),
        };
        if kind != PromptKind::Orientation && state.intent_handover().is_none() {
            return Err(anyhow!("{} prompt requires an intent handover", kind.template_name()));
        }

        let template = self.env.get_template(kind.template_name())?;
        let rendered = template
            .render(context! {
                turns_in_phase => state.turns_in_phase(),
                nudge => nudge,
                intent => state.intent_handover(),
                execution => state.execution_handover(),
                workflow => state.active_workflow(),
                meta => meta,
                prompt_body => prompt_body,
                handover_start => HANDOVER_START,
                handover_end => HANDOVER_END,
                batch_start => BATCH_REQUEST_START,
                batch_end => BATCH_REQUEST_END,
            })
            .with_context(|| format!("render {} prompt", kind.template_name()))?;

        let content = apply_budget(rendered.trim().to_string(), self.budget_bytes);
        debug!(?kind, nudge, bytes = content.len(), "selected next prompt");
        Ok(NextPrompt { kind, content })
    }

    fn should_nudge(&self, state: &PhaseState) -> bool {
        match state.phase() {
            Phase::Orientation => state.turns_in_phase() >= self.orientation_nudge_after_turns,
            Phase::Exploration => state.turns_in_phase() >= self.exploration_nudge_after_turns,
            Phase::Execution => false,
        }
    }
}

/// Truncate `content` to at most `budget` bytes, marking the cut.
fn apply_budget(mut content: String, budget: usize) -> String {
    if content.len() <= budget {
        return content;
    }
    let before_len = content.len();
    let mut allowed = if budget > TRUNCATION_MARKER.len() {
        budget - TRUNCATION_MARKER.len()
    } else {
        budget
    };
    while !content.is_char_boundary(allowed) {
        allowed -= 1;
    }
    content.truncate(allowed);
    if budget > TRUNCATION_MARKER.len() {
        content.push_str(TRUNCATION_MARKER);
    }
    debug!(before_len, after_len = content.len(), "truncated prompt for budget");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::StepHelpMeta;
    use crate::core::phase::{advance_phase, decode_turn};

    fn selector() -> PromptSelector {
        PromptSelector::new(&ConductorConfig::default()).expect("selector")
    }

    fn drive(responses: &[&str]) -> PhaseState {
        responses.iter().fold(PhaseState::new(), |state, response| {
            let decoded = decode_turn(state.phase(), response);
            advance_phase(state, &decoded).state
        })
    }

    const HANDOVER: &str = "<<<HANDOVER>>>\nshape: comparative\nimplied_goal: ship v1\nconstraints: [two weeks]\nresisted_framing: rewrite everything\n<<<END>>>";
    const WORKFLOW: &str = "<<<BATCH>>>\ntype: WORKFLOW\nhandover:\n  goal: ship v1 beta\n  priorities: [stability]\n<<<END>>>";

    /// Orientation prompt shows the handover markers without a nudge.
    #[test]
    fn orientation_prompt_teaches_handover_format() {
        let prompt = selector()
            .select(&PhaseState::new(), &PhaseEvent::Stayed)
            .expect("prompt");
        assert_eq!(prompt.kind, PromptKind::Orientation);
        assert!(prompt.content.contains(HANDOVER_START));
        assert!(prompt.content.contains(HANDOVER_END));
        assert!(!prompt.content.contains("Wrap up now"));
    }

    /// Lingering in orientation past the threshold adds the wrap-up nudge.
    #[test]
    fn orientation_nudges_after_threshold() {
        let state = drive(&["a", "b", "c", "d"]);
        assert_eq!(state.turns_in_phase(), 4);
        let prompt = selector().select(&state, &PhaseEvent::Stayed).expect("prompt");
        assert!(prompt.content.contains("Wrap up now"));
    }

    /// Exploration prompt renders the stored intent handover.
    #[test]
    fn exploration_prompt_carries_intent_handover() {
        let state = drive(&[HANDOVER]);
        let prompt = selector()
            .select(&state, &PhaseEvent::EnteredExploration)
            .expect("prompt");
        assert_eq!(prompt.kind, PromptKind::Exploration);
        assert!(prompt.content.contains("ship v1"));
        assert!(prompt.content.contains("- two weeks"));
        assert!(prompt.content.contains("Avoid this framing: rewrite everything"));
        assert!(prompt.content.contains(BATCH_REQUEST_START));
    }

    /// An empty workflow shell asks the model for steps.
    #[test]
    fn execution_prompt_asks_for_steps_when_workflow_is_empty() {
        let state = drive(&[HANDOVER, WORKFLOW]);
        let prompt = selector()
            .select(&state, &PhaseEvent::EnteredExecution)
            .expect("prompt");
        assert_eq!(prompt.kind, PromptKind::Execution);
        assert!(prompt.content.contains("ship v1 beta"));
        assert!(prompt.content.contains("- stability"));
        assert!(prompt.content.contains("No steps yet"));
    }

    /// Step-help requests render the side-query template with meta.
    #[test]
    fn step_help_event_selects_side_query_template() {
        let state = drive(&[HANDOVER, WORKFLOW]);
        let event = PhaseEvent::StepHelpRequested {
            meta: StepHelpMeta {
                step: Some("Draft outline".to_string()),
                blocker: Some("unclear audience".to_string()),
                context: None,
            },
            prompt_body: Some("Who reads this?".to_string()),
        };
        let prompt = selector().select(&state, &event).expect("prompt");
        assert_eq!(prompt.kind, PromptKind::StepHelp);
        assert!(prompt.content.contains("Step: Draft outline"));
        assert!(prompt.content.contains("Blocker: unclear audience"));
        assert!(prompt.content.contains("Who reads this?"));
    }

    /// Oversized prompts are cut and marked.
    #[test]
    fn budget_truncates_with_marker() {
        let config = ConductorConfig {
            prompt_budget_bytes: 100,
            ..ConductorConfig::default()
        };
        let prompt = PromptSelector::new(&config)
            .expect("selector")
            .select(&PhaseState::new(), &PhaseEvent::Stayed)
            .expect("prompt");
        assert!(prompt.content.len() <= 100);
        assert!(prompt.content.ends_with("[truncated]"));
    }

    #[test]
    fn budget_respects_char_boundaries() {
        let content = apply_budget("é".repeat(20), 15);
        assert!(content.len() <= 15);
        assert!(content.starts_with('é'));
    }
}
