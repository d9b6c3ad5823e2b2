//! Marker tokens for step-by-step guidance replies, and the routine that
//! turns a raw reply into a transition signal.
//!
//! The model is instructed to wrap its reply in one of three opening
//! tokens sharing a single closing token. Extraction is a literal
//! substring search, not a structural parse; the model is trusted to
//! emit the tokens verbatim as instructed.

/// The whole problem is solved; no content follows.
pub const ALL_STEPS_CORRECT_MARKER: &str = "[ALL_STEPS_CORRECT]";
/// Opens the next sub-step after a correct answer.
pub const NEXT_STEP_MARKER: &str = "[NEXT_STEP]";
/// Opens a restated sub-step after a wrong answer.
pub const RETRY_STEP_MARKER: &str = "[RETRY_STEP]";
/// Shared closing token for the two open-ended markers.
pub const END_STEP_MARKER: &str = "[END_STEP]";

/// What a step-evaluation reply told us to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSignal {
    /// The student has finished every sub-step.
    Complete,
    /// The answer was right; the contained text is the next sub-step.
    Advance(String),
    /// The answer was wrong; the contained text restates the sub-step,
    /// possibly with an added hint.
    Retry(String),
    /// No marker matched, or a marker had no usable content.
    Unparseable,
}

/// The trimmed text between `opening` and the nearest following
/// `closing`. None when either token is missing or the text is empty.
pub fn extract_between<'a>(text: &'a str, opening: &str, closing: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let rest = &text[start..];
    let end = rest.find(closing)?;
    let inner = rest[..end].trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

/// Classify a step-evaluation reply by marker containment. Completion
/// wins over advance and advance over retry; completion replies sometimes
/// also restate the final step, so the order matters.
pub fn classify_step_response(response: &str) -> StepSignal {
    if response.contains(ALL_STEPS_CORRECT_MARKER) {
        return StepSignal::Complete;
    }
    if response.contains(NEXT_STEP_MARKER) {
        return match extract_between(response, NEXT_STEP_MARKER, END_STEP_MARKER) {
            Some(step) => StepSignal::Advance(step.to_string()),
            None => StepSignal::Unparseable,
        };
    }
    if response.contains(RETRY_STEP_MARKER) {
        return match extract_between(response, RETRY_STEP_MARKER, END_STEP_MARKER) {
            Some(step) => StepSignal::Retry(step.to_string()),
            None => StepSignal::Unparseable,
        };
    }
    StepSignal::Unparseable
}

/// First `max_chars` characters of `text`, with a trailing ellipsis when
/// anything was cut off. Counts characters, not bytes, so Hebrew text
/// never splits mid-codepoint.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
