//! Label matching for placeholder substitution.
//!
//! A [`LabelMatcher`] wraps a case-insensitive regular expression with one
//! capture group naming the label, `${name}` by default. It is immutable
//! once built and can be shared freely between substitution sessions.
//!
//! ```
//! use std::collections::HashMap;
//! use officekit::matcher::{LabelMatcher, UnresolvedPolicy};
//!
//! let matcher = LabelMatcher::default();
//! let bindings = HashMap::from([("name".to_string(), "Alice".to_string())]);
//! let out = matcher.replace_all_labels("Hi ${name}${x}", &bindings, UnresolvedPolicy::Erase);
//! assert_eq!(out.output, "Hi Alice");
//! assert_eq!(out.resolved.get("name").map(String::as_str), Some("Alice"));
//! ```

mod label;
mod options;

pub use label::{DEFAULT_LABEL_PATTERN, LabelMatcher, LabelReplacement};
pub use options::{RunStrategy, SubstitutionOptions, UnresolvedPolicy};

use std::collections::HashMap;

/// Caller-supplied mapping from label name to replacement text.
pub type Bindings = HashMap<String, String>;

/// Labels that were found and resolved, with the value each received.
pub type Substitutions = HashMap<String, String>;
