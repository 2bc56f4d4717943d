//! Batch signal decoding: exploration → execution handovers and mid-execution
//! step-help requests.
//!
//! A batch block is scanned line by line. Top-level keywords (`type`, `step`,
//! `blocker`, `context`, `handover`, `prompt`) are matched case-insensitively;
//! the `handover:` keyword owns the indented lines below it, and `prompt:`
//! captures the rest of the block verbatim.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::block::{extract_block, extract_indented};
use crate::core::record::{Record, decode_record};
use crate::core::scalar::{decode_scalar, encode_list, encode_scalar};

pub const BATCH_REQUEST_START: &str = "<<<SINGULARITY_BATCH_REQUEST>>>";
pub const BATCH_REQUEST_END: &str = "<<<END_BATCH_REQUEST>>>";
pub const BATCH_START: &str = "<<<BATCH>>>";
pub const BATCH_END: &str = "<<<END>>>";

/// Delimiter pairs in priority order.
const BATCH_MARKERS: [(&str, &str); 2] = [
    (BATCH_REQUEST_START, BATCH_REQUEST_END),
    (BATCH_START, BATCH_END),
];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(type|step|blocker|context|handover|prompt)\s*:(.*)$")
        .expect("batch keyword regex should be valid")
});

/// What a batch signal asks the surrounding system to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchKind {
    /// Exploration is finished; start executing a workflow.
    Workflow,
    /// A workflow step is blocked and needs a side analysis.
    StepHelp,
}

impl BatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workflow => "WORKFLOW",
            Self::StepHelp => "STEP_HELP",
        }
    }

    /// Parse an upper-cased `type:` value. Unknown values yield `None`.
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "WORKFLOW" => Some(Self::Workflow),
            "STEP_HELP" => Some(Self::StepHelp),
            _ => None,
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution-readiness snapshot produced when exploration completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionHandover {
    pub goal: String,
    pub problem_summary: String,
    pub situation: String,
    pub constraints: Vec<String>,
    pub priorities: Vec<String>,
    pub decisions_made: Vec<String>,
    pub open_questions: Vec<String>,
    pub exploration_highlights: Vec<String>,
}

impl ExecutionHandover {
    pub fn from_record(record: &Record) -> Self {
        Self {
            goal: record.text("goal"),
            problem_summary: record.text("problem_summary"),
            situation: record.text("situation"),
            constraints: record.list("constraints"),
            priorities: record.list("priorities"),
            decisions_made: record.list("decisions_made"),
            open_questions: record.list("open_questions"),
            exploration_highlights: record.list("exploration_highlights"),
        }
    }

    fn encode_lines(&self) -> Vec<String> {
        vec![
            format!("goal: {}", encode_scalar(&self.goal)),
            format!("problem_summary: {}", encode_scalar(&self.problem_summary)),
            format!("situation: {}", encode_scalar(&self.situation)),
            format!("constraints: {}", encode_list(&self.constraints)),
            format!("priorities: {}", encode_list(&self.priorities)),
            format!("decisions_made: {}", encode_list(&self.decisions_made)),
            format!("open_questions: {}", encode_list(&self.open_questions)),
            format!(
                "exploration_highlights: {}",
                encode_list(&self.exploration_highlights)
            ),
        ]
    }
}

/// Identifies the blocked step in a step-help request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepHelpMeta {
    pub step: Option<String>,
    pub blocker: Option<String>,
    pub context: Option<String>,
}

/// Typed content of a batch block. All fields are empty when no block exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSignal {
    pub kind: Option<BatchKind>,
    /// Present only for [`BatchKind::Workflow`].
    pub handover: Option<ExecutionHandover>,
    /// Present only for [`BatchKind::StepHelp`].
    pub meta: Option<StepHelpMeta>,
    /// Raw text following `prompt:`.
    pub prompt_body: Option<String>,
}

impl BatchSignal {
    /// Render the signal as a complete block using the preferred markers.
    pub fn to_block(&self) -> String {
        let mut lines = Vec::new();
        if let Some(kind) = self.kind {
            lines.push(format!("type: {kind}"));
        }
        if let Some(meta) = &self.meta {
            for (key, value) in [
                ("step", &meta.step),
                ("blocker", &meta.blocker),
                ("context", &meta.context),
            ] {
                if let Some(value) = value {
                    lines.push(format!("{key}: {}", encode_scalar(value)));
                }
            }
        }
        if let Some(handover) = &self.handover {
            lines.push("handover:".to_string());
            lines.extend(handover.encode_lines().into_iter().map(|line| format!("  {line}")));
        }
        if let Some(body) = &self.prompt_body {
            lines.push("prompt:".to_string());
            lines.push(body.clone());
        }
        format!(
            "{BATCH_REQUEST_START}\n{}\n{BATCH_REQUEST_END}",
            lines.join("\n")
        )
    }
}

/// Response split into its user-facing text and the batch signal it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDecode {
    pub user_response: String,
    pub signal: BatchSignal,
}

/// Extract a batch signal from a complete model response.
pub fn decode_batch_signal(response: &str) -> BatchDecode {
    let found = BATCH_MARKERS.iter().find_map(|(start, end)| {
        let block = extract_block(response, start, end);
        block.inside.map(|inside| (block.before, inside))
    });

    let Some((user_response, inside)) = found else {
        debug!("no batch signal block");
        return BatchDecode {
            user_response: response.trim().to_string(),
            signal: BatchSignal::default(),
        };
    };

    let signal = scan_batch_lines(&inside.lines().collect::<Vec<_>>());
    debug!(kind = ?signal.kind, has_prompt = signal.prompt_body.is_some(), "decoded batch signal block");
    BatchDecode {
        user_response,
        signal,
    }
}

fn scan_batch_lines(lines: &[&str]) -> BatchSignal {
    let mut kind = None;
    let mut meta = StepHelpMeta::default();
    let mut handover = None;
    let mut prompt_body = None;

    let mut cursor = 0;
    while cursor < lines.len() {
        let Some(caps) = KEYWORD_RE.captures(lines[cursor]) else {
            cursor += 1;
            continue;
        };
        let keyword = caps[1].to_ascii_lowercase();
        let value = &caps[2];

        match keyword.as_str() {
            "type" => {
                kind = decode_scalar(value).as_deref().and_then(BatchKind::parse);
                if kind.is_none() {
                    debug!(value = value.trim(), "unrecognized batch type");
                }
            }
            "step" => meta.step = decode_scalar(value),
            "blocker" => meta.blocker = decode_scalar(value),
            "context" => meta.context = decode_scalar(value),
            "handover" => {
                let sub_block = extract_indented(lines, cursor + 1);
                let record = decode_record(sub_block.lines.iter().map(String::as_str));
                handover = Some(ExecutionHandover::from_record(&record));
                cursor = sub_block.resume_at;
                continue;
            }
            "prompt" => {
                let body = lines[cursor + 1..].join("\n");
                prompt_body = (!body.trim().is_empty()).then_some(body);
                break;
            }
            _ => {}
        }
        cursor += 1;
    }

    BatchSignal {
        kind,
        handover: handover.filter(|_| kind == Some(BatchKind::Workflow)),
        meta: (kind == Some(BatchKind::StepHelp)).then_some(meta),
        prompt_body,
    }
}
