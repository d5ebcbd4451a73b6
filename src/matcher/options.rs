use serde::{Deserialize, Serialize};

use super::label::{DEFAULT_LABEL_PATTERN, LabelMatcher};
use crate::common::error::Result;
use crate::document::LabelSubstituter;

/// What happens to a label that has no binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Replace the label with an empty string
    #[default]
    Erase,
    /// Leave the label text untouched
    Preserve,
}

/// How labels are located inside a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStrategy {
    /// Each run is matched on its own; a label split across runs is not seen
    #[default]
    PerRun,
    /// Labels spanning runs are joined into the run where they start
    MergeRuns,
}

/// Settings for a substitution session.
///
/// # Examples
///
/// ```
/// use officekit::matcher::{RunStrategy, SubstitutionOptions, UnresolvedPolicy};
///
/// let opts = SubstitutionOptions::new()
///     .with_unresolved(UnresolvedPolicy::Preserve)
///     .with_run_strategy(RunStrategy::MergeRuns);
/// assert!(opts.matcher().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionOptions {
    /// Label pattern with exactly one capture group
    pub pattern: String,
    pub unresolved: UnresolvedPolicy,
    pub run_strategy: RunStrategy,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_LABEL_PATTERN.to_string(),
            unresolved: UnresolvedPolicy::default(),
            run_strategy: RunStrategy::default(),
        }
    }
}

impl SubstitutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_unresolved(mut self, unresolved: UnresolvedPolicy) -> Self {
        self.unresolved = unresolved;
        self
    }

    pub fn with_run_strategy(mut self, run_strategy: RunStrategy) -> Self {
        self.run_strategy = run_strategy;
        self
    }

    /// Compile the configured pattern.
    ///
    /// The default pattern reuses the shared matcher.
    pub fn matcher(&self) -> Result<LabelMatcher> {
        if self.pattern == DEFAULT_LABEL_PATTERN {
            return Ok(LabelMatcher::shared_default().clone());
        }
        LabelMatcher::new(&self.pattern)
    }

    /// Build the substitution engine these options describe.
    pub fn substituter(&self) -> Result<LabelSubstituter> {
        LabelSubstituter::from_options(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;

    #[test]
    fn test_defaults() {
        let opts = SubstitutionOptions::default();
        assert_eq!(opts.pattern, DEFAULT_LABEL_PATTERN);
        assert_eq!(opts.unresolved, UnresolvedPolicy::Erase);
        assert_eq!(opts.run_strategy, RunStrategy::PerRun);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let opts: SubstitutionOptions =
            serde_json::from_str(r#"{"unresolved": "preserve"}"#).unwrap();
        assert_eq!(opts.unresolved, UnresolvedPolicy::Preserve);
        assert_eq!(opts.pattern, DEFAULT_LABEL_PATTERN);

        let opts: SubstitutionOptions =
            serde_json::from_str(r#"{"pattern": "\\[\\[(\\w+)\\]\\]", "run_strategy": "merge_runs"}"#)
                .unwrap();
        assert_eq!(opts.run_strategy, RunStrategy::MergeRuns);
        assert_eq!(opts.matcher().unwrap().first_group("[[total]]"), "total");
    }

    #[test]
    fn test_bad_pattern_reported_by_matcher() {
        let opts = SubstitutionOptions::new().with_pattern("no group");
        assert!(matches!(opts.matcher(), Err(Error::Configuration(_))));
    }
}
