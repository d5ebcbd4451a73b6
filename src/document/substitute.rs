//! Run-aware label substitution and the scope walkers built on it.
//!
//! Labels are matched run by run. A label whose characters all sit in one
//! run is replaced in place, keeping that run's formatting. A label split
//! across runs is left alone unless [`RunStrategy::MergeRuns`] is selected,
//! in which case its characters are first moved into the run where it
//! starts.

use aho_corasick::{AhoCorasick, MatchKind};

use super::{BodyElement, Document, Paragraph, Table};
use crate::common::error::Result;
use crate::matcher::{
    Bindings, LabelMatcher, RunStrategy, SubstitutionOptions, Substitutions, UnresolvedPolicy,
};

/// Immutable substitution engine.
///
/// Holds the compiled matcher and the policies of a session. It carries no
/// per-call state and can be shared by reference between documents.
#[derive(Debug, Clone)]
pub struct LabelSubstituter {
    matcher: LabelMatcher,
    unresolved: UnresolvedPolicy,
    run_strategy: RunStrategy,
}

impl Default for LabelSubstituter {
    fn default() -> Self {
        Self::new(LabelMatcher::default())
    }
}

impl LabelSubstituter {
    /// Engine with default policies around `matcher`.
    pub fn new(matcher: LabelMatcher) -> Self {
        Self {
            matcher,
            unresolved: UnresolvedPolicy::default(),
            run_strategy: RunStrategy::default(),
        }
    }

    /// Compile the pattern of `options` and take over its policies.
    pub fn from_options(options: &SubstitutionOptions) -> Result<Self> {
        Ok(Self {
            matcher: options.matcher()?,
            unresolved: options.unresolved,
            run_strategy: options.run_strategy,
        })
    }

    #[inline]
    pub fn with_unresolved(mut self, unresolved: UnresolvedPolicy) -> Self {
        self.unresolved = unresolved;
        self
    }

    #[inline]
    pub fn with_run_strategy(mut self, run_strategy: RunStrategy) -> Self {
        self.run_strategy = run_strategy;
        self
    }

    #[inline]
    pub fn matcher(&self) -> &LabelMatcher {
        &self.matcher
    }

    /// Substitute the labels of one paragraph.
    ///
    /// Returns the labels that had a binding, with their values.
    pub fn substitute_in_paragraph(
        &self,
        paragraph: &mut Paragraph,
        bindings: &Bindings,
    ) -> Substitutions {
        let mut resolved = Substitutions::new();
        // Nothing can change: no value to insert, no label to erase
        if bindings.is_empty() && self.unresolved == UnresolvedPolicy::Preserve {
            return resolved;
        }
        if !self.matcher.find(&paragraph.text()) {
            return resolved;
        }
        if self.run_strategy == RunStrategy::MergeRuns {
            merge_split_labels(paragraph, &self.matcher);
        }

        for run in paragraph.runs_mut() {
            let text = run.text();
            if text.is_empty() || !self.matcher.find(&text) {
                continue;
            }
            let replaced = self
                .matcher
                .replace_all_labels(&text, bindings, self.unresolved);
            if replaced.output != text {
                run.set_text(&replaced.output);
            }
            resolved.extend(replaced.resolved);
        }
        resolved
    }

    /// Substitute in every body paragraph, in document order.
    ///
    /// Paragraphs inside tables are not visited.
    pub fn substitute_in_all_paragraphs(
        &self,
        document: &mut Document,
        bindings: &Bindings,
    ) -> Substitutions {
        let mut resolved = Substitutions::new();
        for paragraph in document.paragraphs_mut() {
            resolved.extend(self.substitute_in_paragraph(paragraph, bindings));
        }
        tracing::debug!(scope = "paragraphs", resolved = resolved.len(), "substituted labels");
        resolved
    }

    /// Substitute in a table: rows top to bottom, cells left to right,
    /// paragraphs in order. Tables nested in a cell are walked in place.
    pub fn substitute_in_table(&self, table: &mut Table, bindings: &Bindings) -> Substitutions {
        let mut resolved = Substitutions::new();
        walk_table(table, &mut |p| self.substitute_in_paragraph(p, bindings), &mut resolved);
        resolved
    }

    /// Substitute in every top-level table, in document order.
    pub fn substitute_in_all_tables(
        &self,
        document: &mut Document,
        bindings: &Bindings,
    ) -> Substitutions {
        let mut resolved = Substitutions::new();
        for table in document.tables_mut() {
            resolved.extend(self.substitute_in_table(table, bindings));
        }
        tracing::debug!(scope = "tables", resolved = resolved.len(), "substituted labels");
        resolved
    }

    /// Body paragraphs, then tables.
    pub fn substitute_everywhere(&self, document: &mut Document, bindings: &Bindings) -> Substitutions {
        let mut resolved = self.substitute_in_all_paragraphs(document, bindings);
        resolved.extend(self.substitute_in_all_tables(document, bindings));
        resolved
    }
}

fn walk_table<F>(table: &mut Table, visit: &mut F, resolved: &mut Substitutions)
where
    F: FnMut(&mut Paragraph) -> Substitutions,
{
    for row in table.rows_mut() {
        for cell in row.cells_mut() {
            for element in cell.elements_mut() {
                match element {
                    BodyElement::Paragraph(p) => resolved.extend(visit(p)),
                    BodyElement::Table(t) => walk_table(t, visit, resolved),
                    BodyElement::Raw(_) => {},
                }
            }
        }
    }
}

/// Move the characters of every run-spanning label into the run where the
/// label starts. The paragraph text is unchanged; emptied runs stay in place.
///
/// A span whose later runs already hold a complete label is not merged, so
/// that label is resolved in its own run as with [`RunStrategy::PerRun`].
fn merge_split_labels(paragraph: &mut Paragraph, matcher: &LabelMatcher) {
    let mut runs = paragraph.runs_mut();
    let mut texts: Vec<String> = runs.iter().map(|r| r.text()).collect();
    let full: String = texts.concat();
    let mut touched = vec![false; texts.len()];

    for span in matcher.spans(&full) {
        let mut offset = 0;
        let mut first = None;
        let mut last = None;
        for (i, text) in texts.iter().enumerate() {
            let end = offset + text.len();
            if first.is_none() && span.start < end {
                first = Some((i, offset));
            }
            if span.end <= end && !text.is_empty() {
                last = Some((i, offset));
                break;
            }
            offset = end;
        }
        let (Some((first, _)), Some((last, last_offset))) = (first, last) else {
            continue;
        };
        if first == last {
            continue;
        }

        let split_at = span.end - last_offset;
        // An unclosed label must not swallow a complete one from a later run
        if texts[first + 1..last].iter().any(|t| matcher.find(t)) || matcher.find(&texts[last][..split_at]) {
            continue;
        }
        let mut moved = String::new();
        for text in &mut texts[first + 1..last] {
            moved.push_str(text);
            text.clear();
        }
        moved.push_str(&texts[last][..split_at]);
        texts[last] = texts[last][split_at..].to_string();
        texts[first].push_str(&moved);
        for flag in &mut touched[first..=last] {
            *flag = true;
        }
    }

    for ((run, text), touched) in runs.iter_mut().zip(&texts).zip(&touched) {
        if *touched {
            run.set_text(text);
        }
    }
}

/// Literal key set for the `replace_literal_in_*` walkers.
struct LiteralSet<'b> {
    automaton: AhoCorasick,
    keys: Vec<&'b str>,
    values: Vec<&'b str>,
}

impl<'b> LiteralSet<'b> {
    fn new(bindings: &'b Bindings) -> Result<Option<Self>> {
        let (keys, values): (Vec<&str>, Vec<&str>) = bindings
            .iter()
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .unzip();
        if keys.is_empty() {
            return Ok(None);
        }
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&keys)?;
        Ok(Some(Self {
            automaton,
            keys,
            values,
        }))
    }

    fn apply(&self, paragraph: &mut Paragraph) -> Substitutions {
        let mut replaced = Substitutions::new();
        if !self.automaton.is_match(&paragraph.text()) {
            return replaced;
        }
        for run in paragraph.runs_mut() {
            let text = run.text();
            let mut hit = false;
            for m in self.automaton.find_iter(&text) {
                let id = m.pattern().as_usize();
                replaced.insert(self.keys[id].to_string(), self.values[id].to_string());
                hit = true;
            }
            if hit {
                run.set_text(&self.automaton.replace_all(&text, &self.values));
            }
        }
        replaced
    }
}

/// Replace every literal occurrence of each binding key inside each run of
/// `paragraph`. Keys are complete labels such as `${name}`.
///
/// Returns the keys that occurred, with their values.
pub fn replace_literal_in_paragraph(
    paragraph: &mut Paragraph,
    bindings: &Bindings,
) -> Result<Substitutions> {
    Ok(match LiteralSet::new(bindings)? {
        Some(set) => set.apply(paragraph),
        None => Substitutions::new(),
    })
}

/// Literal replacement over every body paragraph.
pub fn replace_literal_in_all_paragraphs(
    document: &mut Document,
    bindings: &Bindings,
) -> Result<Substitutions> {
    let mut replaced = Substitutions::new();
    if let Some(set) = LiteralSet::new(bindings)? {
        for paragraph in document.paragraphs_mut() {
            replaced.extend(set.apply(paragraph));
        }
    }
    Ok(replaced)
}

/// Literal replacement over one table.
pub fn replace_literal_in_table(table: &mut Table, bindings: &Bindings) -> Result<Substitutions> {
    let mut replaced = Substitutions::new();
    if let Some(set) = LiteralSet::new(bindings)? {
        walk_table(table, &mut |p| set.apply(p), &mut replaced);
    }
    Ok(replaced)
}

/// Literal replacement over every top-level table.
pub fn replace_literal_in_all_tables(
    document: &mut Document,
    bindings: &Bindings,
) -> Result<Substitutions> {
    let mut replaced = Substitutions::new();
    if let Some(set) = LiteralSet::new(bindings)? {
        for table in document.tables_mut() {
            walk_table(table, &mut |p| set.apply(p), &mut replaced);
        }
    }
    Ok(replaced)
}

/// Literal replacement over body paragraphs, then tables.
pub fn replace_literal_everywhere(
    document: &mut Document,
    bindings: &Bindings,
) -> Result<Substitutions> {
    let mut replaced = replace_literal_in_all_paragraphs(document, bindings)?;
    replaced.extend(replace_literal_in_all_tables(document, bindings)?);
    Ok(replaced)
}
