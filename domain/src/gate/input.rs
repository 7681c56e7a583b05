//! Input Validation gate

use super::verdict::{GateKind, ValidationVerdict};
use crate::core::query::{LanguageTag, UserQueryPackage};

pub const EMPTY_QUESTION: &str = "question text must not be empty";

/// Checks a query package before any agent is dispatched.
///
/// Every rule is evaluated; all violations are reported together.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputValidation;

impl InputValidation {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, query: &UserQueryPackage) -> ValidationVerdict {
        let mut diagnostics = Vec::new();

        if query.question().trim().is_empty() {
            diagnostics.push(EMPTY_QUESTION.to_string());
        }

        if query.language_tag().is_none() {
            let expected = LanguageTag::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>();
            diagnostics.push(format!(
                "unsupported language tag '{}' (expected {} or {})",
                query.language(),
                expected[..expected.len() - 1].join(", "),
                expected[expected.len() - 1]
            ));
        }

        if let Some(problem) = encoding_problem(query.question()) {
            diagnostics.push(format!("question text contains malformed encoding ({problem})"));
        }

        if let Some(problem) = query.prior_context().and_then(encoding_problem) {
            diagnostics.push(format!("prior context contains malformed encoding ({problem})"));
        }

        ValidationVerdict::from_diagnostics(GateKind::Input, diagnostics)
    }
}

/// Text decoded lossily upstream carries U+FFFD; stray control characters
/// indicate a binary or mis-decoded payload.
fn encoding_problem(text: &str) -> Option<String> {
    for (offset, ch) in text.char_indices() {
        if ch == char::REPLACEMENT_CHARACTER {
            return Some(format!("replacement character at byte {offset}"));
        }
        if ch.is_control() && !matches!(ch, '\n' | '\r' | '\t') {
            return Some(format!(
                "control character U+{:04X} at byte {offset}",
                ch as u32
            ));
        }
    }
    None
}
