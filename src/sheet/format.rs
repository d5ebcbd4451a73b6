//! Number and date conversions shared by the spreadsheet codecs.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Largest serial Excel accepts (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

fn epoch(date1904: bool) -> NaiveDateTime {
    let (y, m, d) = if date1904 { (1904, 1, 1) } else { (1899, 12, 30) };
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a date serial number to a timestamp, rounded to the second.
///
/// Serials below 61 in the 1900 system account for the fictitious
/// 1900-02-29.
pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let adjusted = if !date1904 && serial < 61.0 { serial + 1.0 } else { serial };
    let seconds = (adjusted * SECONDS_PER_DAY).round() as i64;
    epoch(date1904).checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Convert a timestamp to a date serial number.
pub fn datetime_to_serial(value: NaiveDateTime, date1904: bool) -> f64 {
    let seconds = (value - epoch(date1904)).num_milliseconds() as f64 / 1000.0;
    let serial = seconds / SECONDS_PER_DAY;
    if !date1904 && serial < 61.0 { serial - 1.0 } else { serial }
}

/// Render a number without scientific notation or a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Whether a built-in number format id is a date or time format.
pub fn is_builtin_date_format(id: u16) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Whether a custom number format code displays a date or time.
///
/// Quoted literals, escaped characters and bracketed sections other than
/// elapsed-time markers are ignored; any remaining `y m d h s` makes it a
/// date format.
pub fn is_date_format_code(code: &str) -> bool {
    let section = code.split(';').next().unwrap_or_default();
    let mut chars = section.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            },
            '\\' | '_' | '*' => {
                chars.next();
            },
            '[' => {
                let mut inner = String::new();
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                    inner.push(b);
                }
                let lower = inner.to_ascii_lowercase();
                if !lower.is_empty() && lower.chars().all(|ch| matches!(ch, 'h' | 'm' | 's')) {
                    return true;
                }
            },
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' | 'm' | 'M' => return true,
            _ => {},
        }
    }
    false
}
