//! Configuration validation results
//!
//! Configuration is checked as a whole and every problem is reported, so a
//! user can fix a file in one pass. Issues carry a severity: errors make the
//! workflow unusable, warnings only flag surprising values.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A timeout or deadline of zero seconds.
    ZeroDuration,
    /// `max_attempts` (global or per stage) of zero.
    ZeroAttempts,
    /// Objectivity threshold outside `[0, 1]`.
    ThresholdOutOfRange,
    /// A role key that is not advocate, adversary or judicial.
    UnknownRole,
    /// A stage key that does not name a retryable workflow state.
    UnknownStage,
    /// An agent role without a command to run.
    MissingAgentCommand,
    /// An agent timeout longer than the overall deadline.
    TimeoutExceedsDeadline,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}", self.message)
    }
}
