//! Orientation → exploration handover decoding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::block::extract_block;
use crate::core::record::{Record, decode_record};
use crate::core::scalar::{encode_list, encode_scalar};

pub const HANDOVER_START: &str = "<<<HANDOVER>>>";
pub const HANDOVER_END: &str = "<<<END>>>";

/// Goal-discovery snapshot produced when orientation completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentHandover {
    /// Classification tag for the structure of the user's query.
    pub shape: String,
    pub key_findings: Vec<String>,
    pub tensions: Vec<String>,
    pub gaps: Vec<String>,
    pub user_query: String,
    pub starter_response: String,
    pub user_reply: String,
    /// The objective the model inferred from the exchange.
    pub implied_goal: String,
    pub revealed_constraints: Vec<String>,
    pub accepted_framing: String,
    /// `None` when the model reported no resisted framing.
    pub resisted_framing: Option<String>,
    pub unprompted_reveals: Vec<String>,
    pub still_unclear: Vec<String>,
    /// Expected to be `explore`, `decide`, or `challenge`; stored as given.
    pub effective_stance: String,
}

impl IntentHandover {
    /// Build a handover from a decoded record, defaulting missing fields.
    pub fn from_record(record: &Record) -> Self {
        Self {
            shape: record.text("shape"),
            key_findings: record.list("key_findings"),
            tensions: record.list("tensions"),
            gaps: record.list("gaps"),
            user_query: record.text("user_query"),
            starter_response: record.text("starter_response"),
            user_reply: record.text("user_reply"),
            implied_goal: record.first_text(&["implied_goal", "goal"]),
            revealed_constraints: record.list("constraints"),
            accepted_framing: record.text("accepted_framing"),
            resisted_framing: record.optional_text("resisted_framing"),
            unprompted_reveals: record.list("unprompted_reveals"),
            still_unclear: record.list("still_unclear"),
            effective_stance: record.text("effective_stance"),
        }
    }

    /// Render the handover as a complete delimited block.
    pub fn to_block(&self) -> String {
        let resisted = match &self.resisted_framing {
            Some(value) => encode_scalar(value),
            None => "null".to_string(),
        };
        let lines = [
            format!("shape: {}", encode_scalar(&self.shape)),
            format!("key_findings: {}", encode_list(&self.key_findings)),
            format!("tensions: {}", encode_list(&self.tensions)),
            format!("gaps: {}", encode_list(&self.gaps)),
            format!("user_query: {}", encode_scalar(&self.user_query)),
            format!("starter_response: {}", encode_scalar(&self.starter_response)),
            format!("user_reply: {}", encode_scalar(&self.user_reply)),
            format!("implied_goal: {}", encode_scalar(&self.implied_goal)),
            format!("constraints: {}", encode_list(&self.revealed_constraints)),
            format!("accepted_framing: {}", encode_scalar(&self.accepted_framing)),
            format!("resisted_framing: {resisted}"),
            format!("unprompted_reveals: {}", encode_list(&self.unprompted_reveals)),
            format!("still_unclear: {}", encode_list(&self.still_unclear)),
            format!("effective_stance: {}", encode_scalar(&self.effective_stance)),
        ];
        format!("{HANDOVER_START}\n{}\n{HANDOVER_END}", lines.join("\n"))
    }
}

/// Response split into its user-facing text and an optional handover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentDecode {
    pub user_response: String,
    pub handover: Option<IntentHandover>,
}

/// Extract an intent handover block from a complete model response.
pub fn decode_intent_handover(response: &str) -> IntentDecode {
    let block = extract_block(response, HANDOVER_START, HANDOVER_END);
    let Some(inside) = block.inside else {
        debug!("no intent handover block");
        return IntentDecode {
            user_response: block.before,
            handover: None,
        };
    };

    let record = decode_record(inside.lines());
    debug!(fields = record.len(), "decoded intent handover block");
    IntentDecode {
        user_response: block.before,
        handover: Some(IntentHandover::from_record(&record)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A full handover block decodes into every field.
    #[test]
    fn decodes_reference_handover() {
        let input = "Sure.\n<<<HANDOVER>>>\nshape: comparative\nkey_findings: [a, b]\ngoal: ship v1\nresisted_framing: null\n<<<END>>>";
        let decoded = decode_intent_handover(input);
        assert_eq!(decoded.user_response, "Sure.");
        let handover = decoded.handover.expect("handover");
        assert_eq!(handover.shape, "comparative");
        assert_eq!(handover.key_findings, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(handover.implied_goal, "ship v1");
        assert_eq!(handover.resisted_framing, None);
        assert!(handover.tensions.is_empty());
        assert_eq!(handover.user_query, "");
    }

    /// No block: no handover.
    #[test]
    fn prose_only_response_has_no_handover() {
        let decoded = decode_intent_handover("  What are you trying to decide?\n");
        assert_eq!(decoded.user_response, "What are you trying to decide?");
        assert_eq!(decoded.handover, None);
    }

    /// A block without its end marker is ignored.
    #[test]
    fn unterminated_block_is_not_partially_parsed() {
        let input = "Okay.\n<<<HANDOVER>>>\nshape: comparative\n";
        let decoded = decode_intent_handover(input);
        assert_eq!(decoded.handover, None);
        assert_eq!(decoded.user_response, input.trim());
    }

    /// `implied_goal` beats `goal` when both are present.
    #[test]
    fn implied_goal_key_wins_over_goal() {
        let decoded =
            decode_intent_handover("<<<HANDOVER>>>\ngoal: generic\nImplied Goal: specific\n<<<END>>>");
        assert_eq!(decoded.handover.expect("handover").implied_goal, "specific");
    }

    /// A present but empty `implied_goal` still beats `goal`.
    #[test]
    fn empty_implied_goal_still_wins_over_goal() {
        let decoded =
            decode_intent_handover("<<<HANDOVER>>>\nimplied_goal: \"\"\ngoal: fallback\n<<<END>>>");
        assert_eq!(decoded.handover.expect("handover").implied_goal, "");
    }

    /// Quoted resisted framing keeps its text.
    #[test]
    fn resisted_framing_text_is_kept() {
        let decoded =
            decode_intent_handover("<<<HANDOVER>>>\nresisted_framing: \"pure cost cutting\"\n<<<END>>>");
        assert_eq!(
            decoded.handover.expect("handover").resisted_framing.as_deref(),
            Some("pure cost cutting")
        );
    }

    /// `constraints` fills the revealed constraints; spaced keys normalize.
    #[test]
    fn maps_constraints_and_stance() {
        let input = "<<<HANDOVER>>>\nconstraints: [two weeks, no new hires]\nEffective Stance: decide\nstill unclear: [budget]\n<<<END>>>";
        let handover = decode_intent_handover(input).handover.expect("handover");
        assert_eq!(
            handover.revealed_constraints,
            vec!["two weeks".to_string(), "no new hires".to_string()]
        );
        assert_eq!(handover.effective_stance, "decide");
        assert_eq!(handover.still_unclear, vec!["budget".to_string()]);
    }

    /// An empty block still yields a handover with defaults.
    #[test]
    fn empty_block_yields_default_handover() {
        let decoded = decode_intent_handover("Done.<<<HANDOVER>>>\n<<<END>>>");
        assert_eq!(decoded.user_response, "Done.");
        assert_eq!(decoded.handover, Some(IntentHandover::default()));
    }

    #[test]
    fn encoded_handover_decodes_back() {
        let handover = IntentHandover {
            shape: "comparative".to_string(),
            key_findings: vec!["a".to_string(), "b".to_string()],
            user_query: "Should we rewrite: yes or no?".to_string(),
            implied_goal: "ship v1".to_string(),
            revealed_constraints: vec!["time".to_string()],
            resisted_framing: Some("null".to_string()),
            effective_stance: "challenge".to_string(),
            ..IntentHandover::default()
        };
        let decoded = decode_intent_handover(&format!("Thanks.\n{}", handover.to_block()));
        assert_eq!(decoded.user_response, "Thanks.");
        assert_eq!(decoded.handover, Some(handover));
    }
}
