//! Cell values and simple cell styling.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::format::{format_number, serial_to_datetime};

/// Types of data that can be stored in a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Empty cell
    #[default]
    Empty,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// String value
    String(String),
    /// Date/time value (stored as serial number)
    DateTime(f64),
    /// Error value, e.g. `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Date/time value for a timestamp.
    pub fn from_datetime(value: NaiveDateTime, date1904: bool) -> Self {
        CellValue::DateTime(super::format::datetime_to_serial(value, date1904))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text shown for the value.
    ///
    /// Numbers never use scientific notation and integral numbers have no
    /// fraction. Dates go through the strftime `date_pattern`. Empty and
    /// error cells read as an empty string.
    pub fn render(&self, date_pattern: &str, date1904: bool) -> String {
        match self {
            CellValue::Empty | CellValue::Error(_) => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_number(*f),
            CellValue::String(s) => s.clone(),
            CellValue::DateTime(serial) => match serial_to_datetime(*serial, date1904) {
                Some(dt) => dt.format(date_pattern).to_string(),
                None => format_number(*serial),
            },
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

/// Formatting applied to a single cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellStyle {
    pub bold: bool,
    /// Solid background as `RRGGBB`
    pub fill_color: Option<String>,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    #[inline]
    pub fn with_fill_color(mut self, rgb: &str) -> Self {
        self.fill_color = Some(rgb.to_string());
        self
    }

    /// True when the style changes nothing.
    pub fn is_plain(&self) -> bool {
        !self.bold && self.fill_color.is_none()
    }
}
