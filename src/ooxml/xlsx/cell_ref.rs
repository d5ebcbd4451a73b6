//! A1-style cell references.

use crate::common::{Error, Result};
use crate::sheet::MergedRegion;

/// Column letters for a zero-based column index: 0 is `A`, 26 is `AA`.
pub fn column_name(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// `A1` reference for a zero-based row and column.
pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Zero-based (row, column) of a reference such as `B3` or `$B$3`.
pub fn parse_cell_ref(reference: &str) -> Result<(usize, usize)> {
    let invalid = || Error::CorruptedFile(format!("invalid cell reference {:?}", reference));
    let bytes = reference.as_bytes();
    let mut pos = 0;
    if bytes.first() == Some(&b'$') {
        pos += 1;
    }
    let mut col = 0usize;
    let letters_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add((bytes[pos].to_ascii_uppercase() - b'A' + 1) as usize))
            .ok_or_else(invalid)?;
        pos += 1;
    }
    if pos == letters_start {
        return Err(invalid());
    }
    if bytes.get(pos) == Some(&b'$') {
        pos += 1;
    }
    let row: usize = reference[pos..].parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }
    Ok((row - 1, col - 1))
}

/// Region of a range such as `A1:C2`. A single reference is a one-cell range.
pub fn parse_range(range: &str) -> Result<MergedRegion> {
    let (first, last) = range.split_once(':').unwrap_or((range, range));
    let (first_row, first_col) = parse_cell_ref(first)?;
    let (last_row, last_col) = parse_cell_ref(last)?;
    Ok(MergedRegion {
        first_row: first_row.min(last_row),
        last_row: first_row.max(last_row),
        first_col: first_col.min(last_col),
        last_col: first_col.max(last_col),
    })
}

pub fn range_name(region: &MergedRegion) -> String {
    format!(
        "{}:{}",
        cell_name(region.first_row, region.first_col),
        cell_name(region.last_row, region.last_col)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1").unwrap(), (0, 0));
        assert_eq!(parse_cell_ref("ab12").unwrap(), (11, 27));
        assert_eq!(parse_cell_ref("$C$4").unwrap(), (3, 2));
        for bad in ["", "12", "A", "A0", "A-1", "1A"] {
            assert!(parse_cell_ref(bad).is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_ranges() {
        let region = parse_range("C2:A1").unwrap();
        assert_eq!((region.first_row, region.last_row), (0, 1));
        assert_eq!((region.first_col, region.last_col), (0, 2));
        assert_eq!(range_name(&region), "A1:C2");
        assert_eq!(range_name(&parse_range("B7").unwrap()), "B7:B7");
    }
}
