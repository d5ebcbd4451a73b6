//! Cell formats (`xl/styles.xml`).
//!
//! Reading keeps only what the workbook model carries: whether a format
//! shows dates, bold fonts and solid fill colors.

use std::collections::HashMap;
use std::fmt::Write;

use quick_xml::events::{BytesStart, Event};

use crate::common::Result;
use crate::common::xml::{SpanReader, attribute, escape_xml};
use crate::ooxml::constants::namespace;
use crate::sheet::CellStyle;
use crate::sheet::format::{is_builtin_date_format, is_date_format_code};

/// Built-in `m/d/yy h:mm` format used for date cells on write
pub const DATE_TIME_FORMAT_ID: u16 = 22;

/// One entry of `cellXfs`, reduced to what cells need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormat {
    pub is_date: bool,
    pub style: Option<CellStyle>,
}

/// Cell formats indexed by the `s` attribute of a cell.
#[derive(Debug, Default)]
pub struct StyleSheet {
    formats: Vec<CellFormat>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    NumFmts,
    Fonts,
    Fills,
    CellXfs,
    Other,
}

#[derive(Default)]
struct Fill {
    solid: bool,
    color: Option<String>,
}

struct Xf {
    num_fmt: u16,
    font: usize,
    fill: usize,
}

impl StyleSheet {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut spans = SpanReader::new(xml);
        let mut section = Section::Other;
        let mut custom_formats: HashMap<u16, String> = HashMap::new();
        let mut bold_fonts: Vec<bool> = Vec::new();
        let mut fills: Vec<Fill> = Vec::new();
        let mut xfs: Vec<Xf> = Vec::new();

        loop {
            let (event, _, _) = spans.next()?;
            let (e, is_start) = match event {
                Event::Start(e) => (e, true),
                Event::Empty(e) => (e, false),
                Event::End(e) => {
                    if matches!(e.local_name().as_ref(), b"numFmts" | b"fonts" | b"fills" | b"cellXfs") {
                        section = Section::Other;
                    }
                    continue;
                },
                Event::Eof => break,
                _ => continue,
            };
            match (section, e.local_name().as_ref()) {
                (_, b"numFmts") if is_start => section = Section::NumFmts,
                (_, b"fonts") if is_start => section = Section::Fonts,
                (_, b"fills") if is_start => section = Section::Fills,
                (_, b"cellXfs") if is_start => section = Section::CellXfs,
                (Section::NumFmts, b"numFmt") => {
                    if let (Some(id), Some(code)) = (number(&e, b"numFmtId"), attribute(&e, b"formatCode")) {
                        custom_formats.insert(id as u16, code);
                    }
                },
                (Section::Fonts, b"font") => bold_fonts.push(false),
                (Section::Fonts, b"b") => {
                    if let Some(bold) = bold_fonts.last_mut() {
                        *bold = attribute(&e, b"val").is_none_or(|v| v != "0" && v != "false");
                    }
                },
                (Section::Fills, b"fill") => fills.push(Fill::default()),
                (Section::Fills, b"patternFill") => {
                    if let Some(fill) = fills.last_mut() {
                        fill.solid = attribute(&e, b"patternType").as_deref() == Some("solid");
                    }
                },
                (Section::Fills, b"fgColor") => {
                    if let Some(fill) = fills.last_mut() {
                        fill.color = attribute(&e, b"rgb").and_then(|rgb| rgb_suffix(&rgb));
                    }
                },
                (Section::CellXfs, b"xf") => xfs.push(Xf {
                    num_fmt: number(&e, b"numFmtId").unwrap_or(0) as u16,
                    font: number(&e, b"fontId").unwrap_or(0),
                    fill: number(&e, b"fillId").unwrap_or(0),
                }),
                _ => {},
            }
        }

        let formats = xfs
            .into_iter()
            .map(|xf| {
                let is_date = match custom_formats.get(&xf.num_fmt) {
                    Some(code) => is_date_format_code(code),
                    None => is_builtin_date_format(xf.num_fmt),
                };
                let style = CellStyle {
                    bold: bold_fonts.get(xf.font).copied().unwrap_or(false),
                    fill_color: fills
                        .get(xf.fill)
                        .filter(|f| f.solid)
                        .and_then(|f| f.color.clone()),
                };
                CellFormat {
                    is_date,
                    style: (!style.is_plain()).then_some(style),
                }
            })
            .collect();
        Ok(Self { formats })
    }

    pub fn get(&self, index: usize) -> Option<&CellFormat> {
        self.formats.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.formats.len()
    }
}

fn number(e: &BytesStart<'_>, name: &[u8]) -> Option<usize> {
    attribute(e, name).and_then(|v| v.trim().parse().ok())
}

/// `RRGGBB` from `AARRGGBB` or `RRGGBB`.
fn rgb_suffix(rgb: &str) -> Option<String> {
    (rgb.len() >= 6 && rgb.is_char_boundary(rgb.len() - 6)).then(|| rgb[rgb.len() - 6..].to_ascii_uppercase())
}

/// Builds `styles.xml` from the styles cells use, one `xf` per distinct
/// (style, date) pair. Index 0 is the default format.
#[derive(Debug)]
pub struct StylesBuilder {
    /// Whether a bold font is needed; font 1 when it is
    bold_font: bool,
    fills: Vec<String>,
    xfs: Vec<(Option<CellStyle>, bool)>,
    index: HashMap<(Option<CellStyle>, bool), usize>,
}

impl Default for StylesBuilder {
    fn default() -> Self {
        let mut index = HashMap::new();
        index.insert((None, false), 0);
        Self {
            bold_font: false,
            fills: Vec::new(),
            xfs: vec![(None, false)],
            index,
        }
    }
}

impl StylesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `s` index for a cell with this style, formatted as a date or not.
    pub fn add(&mut self, style: Option<&CellStyle>, is_date: bool) -> usize {
        let key = (style.filter(|s| !s.is_plain()).cloned(), is_date);
        if let Some(&index) = self.index.get(&key) {
            return index;
        }
        if let Some(style) = &key.0 {
            self.bold_font |= style.bold;
            if let Some(color) = &style.fill_color
                && !self.fills.contains(color)
            {
                self.fills.push(color.clone());
            }
        }
        let index = self.xfs.len();
        self.xfs.push(key.clone());
        self.index.insert(key, index);
        index
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024 + self.xfs.len() * 96);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<styleSheet xmlns="{}">"#, namespace::SML_MAIN);

        let font_count = if self.bold_font { 2 } else { 1 };
        let _ = write!(xml, r#"<fonts count="{}">"#, font_count);
        xml.push_str(r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
        if self.bold_font {
            xml.push_str(r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
        }
        xml.push_str("</fonts>");

        // Fills 0 and 1 are reserved
        let _ = write!(xml, r#"<fills count="{}">"#, self.fills.len() + 2);
        xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#);
        xml.push_str(r#"<fill><patternFill patternType="gray125"/></fill>"#);
        for color in &self.fills {
            let _ = write!(
                xml,
                r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{}"/><bgColor indexed="64"/></patternFill></fill>"#,
                escape_xml(color)
            );
        }
        xml.push_str("</fills>");

        xml.push_str(r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#);
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        let _ = write!(xml, r#"<cellXfs count="{}">"#, self.xfs.len());
        for (style, is_date) in &self.xfs {
            let num_fmt = if *is_date { DATE_TIME_FORMAT_ID } else { 0 };
            let font = usize::from(style.as_ref().is_some_and(|s| s.bold));
            let fill = style
                .as_ref()
                .and_then(|s| s.fill_color.as_ref())
                .and_then(|c| self.fills.iter().position(|f| f == c))
                .map_or(0, |i| i + 2);
            let _ = write!(
                xml,
                r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="0" xfId="0""#,
                num_fmt, font, fill
            );
            if num_fmt != 0 {
                xml.push_str(r#" applyNumberFormat="1""#);
            }
            if font != 0 {
                xml.push_str(r#" applyFont="1""#);
            }
            if fill != 0 {
                xml.push_str(r#" applyFill="1""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</cellXfs>");
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}
