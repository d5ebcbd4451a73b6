//! Paragraphs and runs.

/// Character formatting of a run.
///
/// Documents decoded from DOCX keep the original `<w:rPr>` markup, which is
/// written back untouched. Calling any setter switches the run to the typed
/// fields, and the markup is regenerated from them on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProperties {
    pub(crate) raw: Option<String>,
    pub(crate) bold: Option<bool>,
    pub(crate) italic: Option<bool>,
    pub(crate) underline: Option<bool>,
    /// Size in half-points
    pub(crate) font_size: Option<u32>,
    pub(crate) font_name: Option<String>,
    /// Hex RGB, e.g. `FF0000`
    pub(crate) color: Option<String>,
}

impl RunProperties {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bold(&self) -> Option<bool> {
        self.bold
    }

    #[inline]
    pub fn italic(&self) -> Option<bool> {
        self.italic
    }

    #[inline]
    pub fn underline(&self) -> Option<bool> {
        self.underline
    }

    /// Font size in half-points (24 = 12pt).
    #[inline]
    pub fn font_size(&self) -> Option<u32> {
        self.font_size
    }

    #[inline]
    pub fn font_name(&self) -> Option<&str> {
        self.font_name.as_deref()
    }

    #[inline]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn set_bold(&mut self, bold: bool) -> &mut Self {
        self.raw = None;
        self.bold = Some(bold);
        self
    }

    pub fn set_italic(&mut self, italic: bool) -> &mut Self {
        self.raw = None;
        self.italic = Some(italic);
        self
    }

    pub fn set_underline(&mut self, underline: bool) -> &mut Self {
        self.raw = None;
        self.underline = Some(underline);
        self
    }

    pub fn set_font_size(&mut self, half_points: u32) -> &mut Self {
        self.raw = None;
        self.font_size = Some(half_points);
        self
    }

    pub fn set_font_name(&mut self, name: &str) -> &mut Self {
        self.raw = None;
        self.font_name = Some(name.to_string());
        self
    }

    pub fn set_color(&mut self, rgb: &str) -> &mut Self {
        self.raw = None;
        self.color = Some(rgb.to_string());
        self
    }

    /// Whether no formatting is set at all.
    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.underline.is_none()
            && self.font_size.is_none()
            && self.font_name.is_none()
            && self.color.is_none()
    }
}

/// One child of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Tab,
    /// Line break
    Break,
    /// Markup that is carried through unchanged (fields, drawings, page breaks)
    Raw(String),
}

/// A formatting-homogeneous fragment of paragraph text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub(crate) open_tag: Option<String>,
    pub(crate) properties: RunProperties,
    pub(crate) content: Vec<RunContent>,
}

impl Run {
    /// Create an unformatted run holding `text`.
    pub fn new(text: &str) -> Self {
        let mut run = Self::default();
        run.set_text(text);
        run
    }

    /// Visible text. Tabs read as `\t` and line breaks as `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(s) => text.push_str(s),
                RunContent::Tab => text.push('\t'),
                RunContent::Break => text.push('\n'),
                RunContent::Raw(_) => {},
            }
        }
        text
    }

    /// Replace the run's whole text in one operation.
    ///
    /// Formatting and non-text children are kept; the new text takes the
    /// place of the first text child.
    pub fn set_text(&mut self, text: &str) {
        let position = self
            .content
            .iter()
            .position(|c| !matches!(c, RunContent::Raw(_)))
            .unwrap_or(self.content.len());
        let kept_before = self.content[..position].to_vec();
        let kept_after: Vec<RunContent> = self.content[position..]
            .iter()
            .filter(|c| matches!(c, RunContent::Raw(_)))
            .cloned()
            .collect();

        self.content = kept_before;
        self.content.extend(split_text(text));
        self.content.extend(kept_after);
    }

    #[inline]
    pub fn properties(&self) -> &RunProperties {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut RunProperties {
        &mut self.properties
    }

    #[inline]
    pub fn content(&self) -> &[RunContent] {
        &self.content
    }
}

/// Break text into run children, mapping `\t` and `\n` to their elements.
fn split_text(text: &str) -> Vec<RunContent> {
    let mut content = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '\t' | '\n' => {
                if !current.is_empty() {
                    content.push(RunContent::Text(std::mem::take(&mut current)));
                }
                content.push(if ch == '\t' {
                    RunContent::Tab
                } else {
                    RunContent::Break
                });
            },
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        content.push(RunContent::Text(current));
    }
    content
}

/// One child of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphItem {
    Run(Run),
    /// Inline wrapper whose runs are part of the paragraph text, such as a
    /// hyperlink or an inserted-revision mark
    Group {
        open: String,
        close: String,
        items: Vec<ParagraphItem>,
    },
    /// Inline markup carried through unchanged
    Raw(String),
}

/// An ordered sequence of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub(crate) open_tag: Option<String>,
    /// Raw paragraph properties markup
    pub(crate) properties: Option<String>,
    pub(crate) items: Vec<ParagraphItem>,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single unformatted run.
    pub fn with_text(text: &str) -> Self {
        let mut paragraph = Self::new();
        if !text.is_empty() {
            paragraph.add_run(text);
        }
        paragraph
    }

    /// Full visible text: the concatenation of every run's text.
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Runs in document order, including runs inside inline wrappers.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        let mut runs = Vec::new();
        collect_runs(&self.items, &mut runs);
        runs.into_iter()
    }

    /// Mutable runs in document order.
    pub fn runs_mut(&mut self) -> Vec<&mut Run> {
        let mut runs = Vec::new();
        collect_runs_mut(&mut self.items, &mut runs);
        runs
    }

    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Append a run and return it for formatting.
    pub fn add_run(&mut self, text: &str) -> &mut Run {
        self.items.push(ParagraphItem::Run(Run::new(text)));
        match self.items.last_mut() {
            Some(ParagraphItem::Run(run)) => run,
            _ => unreachable!("a run was just pushed"),
        }
    }

    #[inline]
    pub fn items(&self) -> &[ParagraphItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.runs().all(|r| r.text().is_empty())
    }
}

fn collect_runs<'a>(items: &'a [ParagraphItem], out: &mut Vec<&'a Run>) {
    for item in items {
        match item {
            ParagraphItem::Run(run) => out.push(run),
            ParagraphItem::Group { items, .. } => collect_runs(items, out),
            ParagraphItem::Raw(_) => {},
        }
    }
}

fn collect_runs_mut<'a>(items: &'a mut [ParagraphItem], out: &mut Vec<&'a mut Run>) {
    for item in items {
        match item {
            ParagraphItem::Run(run) => out.push(run),
            ParagraphItem::Group { items, .. } => collect_runs_mut(items, out),
            ParagraphItem::Raw(_) => {},
        }
    }
}
