use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};

use super::options::UnresolvedPolicy;
use super::Substitutions;
use crate::common::error::{Error, Result};

/// Default label pattern: `${name}` with a non-greedy name.
pub const DEFAULT_LABEL_PATTERN: &str = r"\$\{(.+?)\}";

static SHARED_DEFAULT: Lazy<LabelMatcher> = Lazy::new(|| {
    LabelMatcher::new(DEFAULT_LABEL_PATTERN).expect("Failed to build default label matcher")
});

/// Compiled label pattern.
///
/// Matching is always case-insensitive. Group 1 of the pattern is the label
/// name looked up in the bindings.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    regex: Regex,
    /// Same pattern anchored at both ends, for whole-string matches
    whole: Regex,
}

/// Output of [`LabelMatcher::replace_all_labels`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReplacement {
    /// Text after substitution
    pub output: String,
    /// Labels that had a binding, with the value inserted
    pub resolved: Substitutions,
}

impl LabelMatcher {
    /// Compile `pattern` case-insensitively.
    ///
    /// Fails with [`Error::Configuration`] if the pattern is empty, does not
    /// compile, or does not have exactly one capture group.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::Configuration("label pattern is empty".to_string()));
        }
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        if regex.captures_len() != 2 {
            return Err(Error::Configuration(format!(
                "label pattern {:?} must have exactly one capture group, found {}",
                pattern,
                regex.captures_len() - 1
            )));
        }
        let whole = RegexBuilder::new(&format!("^(?:{})$", pattern))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex, whole })
    }

    /// Process-wide matcher for [`DEFAULT_LABEL_PATTERN`].
    ///
    /// Immutable; substitution state never lives in the matcher.
    #[inline]
    pub fn shared_default() -> &'static LabelMatcher {
        &SHARED_DEFAULT
    }

    /// Source pattern.
    #[inline]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the whole of `text` is one label.
    #[inline]
    pub fn is_match_whole(&self, text: &str) -> bool {
        self.whole.is_match(text)
    }

    /// Whether `text` contains a label anywhere.
    #[inline]
    pub fn find(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Name captured by the first label in `text`, or an empty string.
    pub fn first_group(&self, text: &str) -> String {
        self.regex
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Every full label occurrence in `text`, left to right.
    ///
    /// Each call starts a fresh scan.
    pub fn all_matches<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> + use<'_, 't> {
        self.regex.find_iter(text).map(|m| m.as_str())
    }

    /// Byte ranges of every label in `text`.
    pub(crate) fn spans(&self, text: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(text).map(|m| m.range()).collect()
    }

    /// Replace the first label with `replacement`, taken literally.
    pub fn replace_first(&self, text: &str, replacement: &str) -> String {
        self.regex.replacen(text, 1, NoExpand(replacement)).into_owned()
    }

    /// Replace every label with `replacement`, taken literally.
    pub fn replace_all(&self, text: &str, replacement: &str) -> String {
        self.regex.replace_all(text, NoExpand(replacement)).into_owned()
    }

    /// Substitute every label in `text` from `bindings`.
    ///
    /// Labels with a binding are replaced by the bound value and recorded in
    /// [`LabelReplacement::resolved`]. Labels without one are erased or kept
    /// verbatim according to `unresolved`. Scanning continues after each
    /// inserted value, so a value that looks like a label is never expanded.
    pub fn replace_all_labels(
        &self,
        text: &str,
        bindings: &HashMap<String, String>,
        unresolved: UnresolvedPolicy,
    ) -> LabelReplacement {
        let mut output = String::with_capacity(text.len());
        let mut resolved = Substitutions::new();
        let mut last = 0;

        for caps in self.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let name = caps.get(1).map_or("", |g| g.as_str());
            output.push_str(&text[last..whole.start()]);
            match bindings.get(name) {
                Some(value) => {
                    output.push_str(value);
                    resolved.insert(name.to_string(), value.clone());
                },
                None => {
                    tracing::trace!(label = name, "unresolved label");
                    if unresolved == UnresolvedPolicy::Preserve {
                        output.push_str(whole.as_str());
                    }
                },
            }
            last = whole.end();
        }
        output.push_str(&text[last..]);

        LabelReplacement { output, resolved }
    }
}

impl Default for LabelMatcher {
    fn default() -> Self {
        SHARED_DEFAULT.clone()
    }
}
