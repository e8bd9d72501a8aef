//! Validation (§4.7): a default rule set plus the trait/result types the
//! facade runs before every write.
//!
//! A rule is anything implementing [`ValidationRule`]; [`validate`] runs
//! the default set sequentially and in a fixed order, exactly as
//! documented, rather than treating rules as a dynamically discovered
//! plugin set.

mod rules;

pub use rules::default_rules;

use crate::model::AudioFileInfo;

/// Severity of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks a write when `validate_before_writing` is set.
    Error,
    /// Surfaced but never blocks a write.
    Warning,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    severity: Severity,
    message: String,
    context: Option<String>,
}

impl Issue {
    /// Builds an error-severity issue.
    pub fn error(message: impl Into<String>) -> Self {
        Issue {
            severity: Severity::Error,
            message: message.into(),
            context: None,
        }
    }

    /// Builds a warning-severity issue.
    pub fn warning(message: impl Into<String>) -> Self {
        Issue {
            severity: Severity::Warning,
            message: message.into(),
            context: None,
        }
    }

    /// Attaches free-text context (e.g. which chapter index triggered this).
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// This issue's severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether this issue is error-severity.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional context attached to the issue.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{} ({ctx})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A named validation rule: a pure function from [`AudioFileInfo`] to a
/// (possibly empty) list of issues.
pub trait ValidationRule {
    /// A short, stable identifier for this rule, e.g. `"chapter-order"`.
    fn name(&self) -> &'static str;

    /// Checks `info`, returning zero or more issues.
    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue>;
}

/// The aggregated result of running a rule set against an `AudioFileInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    issues: Vec<Issue>,
}

impl ValidationResult {
    /// All issues found, in rule order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Error-severity issues only.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Warning-severity issues only.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// True iff no error-severity issue was found. Warnings alone are valid.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(Issue::is_error)
    }

    /// Consumes the result, returning every issue.
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Runs `rules` against `info` sequentially, in the given order, and
/// aggregates every issue found.
pub fn validate_with_rules(info: &AudioFileInfo, rules: &[Box<dyn ValidationRule>]) -> ValidationResult {
    let mut issues = Vec::new();
    for rule in rules {
        let found = rule.validate(info);
        if !found.is_empty() {
            tracing::debug!(rule = rule.name(), count = found.len(), "validation rule produced issues");
        }
        issues.extend(found);
    }
    ValidationResult { issues }
}

/// Runs the default ten-rule set (§4.7) against `info`.
pub fn validate(info: &AudioFileInfo) -> ValidationResult {
    validate_with_rules(info, &default_rules())
}

/// Runs the default rule set and fails with [`crate::error::Error::ValidationFailed`]
/// if any error-severity issue was found.
pub fn validate_or_throw(info: &AudioFileInfo) -> crate::error::Result<()> {
    let result = validate(info);
    if result.is_valid() {
        Ok(())
    } else {
        Err(crate::error::Error::ValidationFailed {
            issues: result.into_issues(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, Timestamp};

    #[test]
    fn valid_info_has_no_errors() {
        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("Title".to_string());
        let result = validate(&info);
        assert!(result.is_valid());
    }

    #[test]
    fn out_of_order_chapters_fail_validation() {
        let mut info = AudioFileInfo::new();
        info.chapters.append(Chapter::new(Timestamp::from_millis(10_000), "Two").unwrap());
        info.chapters.append(Chapter::new(Timestamp::from_millis(5_000), "One").unwrap());
        let result = validate(&info);
        assert!(!result.is_valid());
    }

    #[test]
    fn missing_title_is_a_warning_not_an_error() {
        let info = AudioFileInfo::new();
        let result = validate(&info);
        assert!(result.is_valid());
        assert!(result.warnings().any(|i| i.message().contains("title")));
    }
}
