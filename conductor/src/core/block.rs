//! Delimiter-bounded block extraction from free-form model text.

/// Result of searching a response for a directive block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Text preceding the start marker, trimmed. The whole input when no
    /// complete block exists.
    pub before: String,
    /// Text strictly between the markers, trimmed.
    pub inside: Option<String>,
}

/// Find the first block opened by `start` and closed by the next `end`.
///
/// A start marker without a matching end marker counts as no block at all:
/// a truncated directive cannot be told apart from one that was never sent.
pub fn extract_block(text: &str, start: &str, end: &str) -> Block {
    let absent = || Block {
        before: text.trim().to_string(),
        inside: None,
    };

    let Some(start_at) = text.find(start) else {
        return absent();
    };
    let body_at = start_at + start.len();
    let Some(end_offset) = text[body_at..].find(end) else {
        return absent();
    };

    Block {
        before: text[..start_at].trim().to_string(),
        inside: Some(text[body_at..body_at + end_offset].trim().to_string()),
    }
}

/// Lines captured by [`extract_indented`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentedBlock {
    /// Captured lines with leading whitespace removed.
    pub lines: Vec<String>,
    /// Index of the first line that was not consumed.
    pub resume_at: usize,
}

/// Collect the indented lines starting at `start`.
///
/// Blank lines are skipped without ending the span. The first line that
/// starts with a non-whitespace character ends it and is left unconsumed.
pub fn extract_indented<S: AsRef<str>>(lines: &[S], start: usize) -> IndentedBlock {
    let mut captured = Vec::new();
    let mut index = start;
    while let Some(line) = lines.get(index) {
        let line = line.as_ref();
        if line.trim().is_empty() {
            index += 1;
            continue;
        }
        if line.chars().next().is_some_and(|ch| !ch.is_whitespace()) {
            break;
        }
        captured.push(line.trim_start().to_string());
        index += 1;
    }

    IndentedBlock {
        lines: captured,
        resume_at: index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "<<<HANDOVER>>>";
    const END: &str = "<<<END>>>";

    /// No start marker: the whole text is prose.
    #[test]
    fn missing_start_marker_returns_trimmed_text() {
        let block = extract_block("  just prose \n", START, END);
        assert_eq!(block.before, "just prose");
        assert_eq!(block.inside, None);
    }

    /// A start marker without an end marker does not count as a block.
    #[test]
    fn unterminated_block_is_absent() {
        let text = "Intro\n<<<HANDOVER>>>\nshape: x\n";
        let block = extract_block(text, START, END);
        assert_eq!(block.before, text.trim());
        assert_eq!(block.inside, None);
    }

    /// Text before the block and the block body are both trimmed.
    #[test]
    fn extracts_before_and_inside() {
        let block = extract_block("Hello.\n<<<HANDOVER>>>\n a: b \n<<<END>>>\ntrailing", START, END);
        assert_eq!(block.before, "Hello.");
        assert_eq!(block.inside.as_deref(), Some("a: b"));
    }

    /// Only end markers after the start marker close the block.
    #[test]
    fn end_marker_before_start_is_ignored() {
        let block = extract_block("<<<END>>> x <<<HANDOVER>>>y<<<END>>>", START, END);
        assert_eq!(block.before, "<<<END>>> x");
        assert_eq!(block.inside.as_deref(), Some("y"));
    }

    /// Only the first block is extracted.
    #[test]
    fn only_first_block_is_used() {
        let block = extract_block("<<<HANDOVER>>>one<<<END>>><<<HANDOVER>>>two<<<END>>>", START, END);
        assert_eq!(block.inside.as_deref(), Some("one"));
    }

    /// Adjacent markers yield a present, empty body.
    #[test]
    fn empty_block_is_present() {
        let block = extract_block("<<<HANDOVER>>><<<END>>>", START, END);
        assert_eq!(block.inside.as_deref(), Some(""));
    }

    /// The first unindented line ends the sub-block and is where scanning resumes.
    #[test]
    fn indented_span_stops_at_unindented_line() {
        let lines = ["handover:", "  goal: g", "", "\tsituation: s", "prompt:", "  x"];
        let block = extract_indented(&lines, 1);
        assert_eq!(block.lines, vec!["goal: g".to_string(), "situation: s".to_string()]);
        assert_eq!(block.resume_at, 4);
    }

    /// Running off the end resumes past the last line.
    #[test]
    fn indented_span_runs_to_end() {
        let lines = ["  a: 1", "  b: 2", ""];
        let block = extract_indented(&lines, 0);
        assert_eq!(block.lines.len(), 2);
        assert_eq!(block.resume_at, 3);
    }

    /// An unindented line right away yields an empty sub-block.
    #[test]
    fn indented_span_can_be_empty() {
        let lines = ["handover:", "type: WORKFLOW"];
        let block = extract_indented(&lines, 1);
        assert!(block.lines.is_empty());
        assert_eq!(block.resume_at, 1);
    }

    #[test]
    fn start_past_end_is_empty() {
        let lines = ["handover:"];
        let block = extract_indented(&lines, 1);
        assert!(block.lines.is_empty());
        assert_eq!(block.resume_at, 1);
    }
}
