//! Cell address type

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "AA10")
///
/// Both components are one-based: column `A` is 1, row `1` is 1. Addresses
/// order column-major (`A1 < A2 < B1`), which is the order used for
/// iteration and for breaking ties during recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Column index (1-based, A=1, B=2, ..., Z=26, AA=27)
    pub col: u32,
    /// Row index (1-based)
    pub row: u32,
}

impl CellAddress {
    /// Create a new cell address.
    ///
    /// Returns an error if either component is zero.
    pub fn new(col: u32, row: u32) -> Result<Self> {
        if col == 0 {
            return Err(Error::InvalidAddress("column must be >= 1".into()));
        }
        if row == 0 {
            return Err(Error::InvalidAddress("row must be >= 1".into()));
        }
        Ok(Self { col, row })
    }

    /// Parse a cell address from A1-style notation
    ///
    /// The accepted form is `^[A-Z]+[0-9]+$`; lowercase letters, `$` markers
    /// and surrounding whitespace are rejected.
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!((addr.col, addr.row), (1, 1));
    ///
    /// let addr = CellAddress::parse("AA10").unwrap();
    /// assert_eq!((addr.col, addr.row), (27, 10));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let letters_end = s
            .bytes()
            .position(|b| !b.is_ascii_uppercase())
            .unwrap_or(s.len());

        if letters_end == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[..letters_end])?;

        let row_str = &s[letters_end..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "invalid row number in '{}'",
                s
            )));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::RowOutOfBounds(row_str.to_string()))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        Ok(Self { col, row })
    }

    /// Convert a column index to letters (1 = A, 26 = Z, 27 = AA, etc.)
    ///
    /// Column 0 has no letter form and yields an empty string.
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert uppercase column letters to an index (A = 1, Z = 26, AA = 27, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_uppercase() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            let digit = c as u32 - 'A' as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| Error::ColumnOutOfBounds(letters.to_string()))?;
        }

        Ok(col)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(col: u32, row: u32) -> CellAddress {
        CellAddress::new(col, row).unwrap()
    }

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(1), "A");
        assert_eq!(CellAddress::column_to_letters(2), "B");
        assert_eq!(CellAddress::column_to_letters(26), "Z");
        assert_eq!(CellAddress::column_to_letters(27), "AA");
        assert_eq!(CellAddress::column_to_letters(28), "AB");
        assert_eq!(CellAddress::column_to_letters(702), "ZZ");
        assert_eq!(CellAddress::column_to_letters(703), "AAA");
        assert_eq!(CellAddress::column_to_letters(0), "");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 1);
        assert_eq!(CellAddress::letters_to_column("Z").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("AA").unwrap(), 27);
        assert_eq!(CellAddress::letters_to_column("ZZ").unwrap(), 702);
        assert_eq!(CellAddress::letters_to_column("AAA").unwrap(), 703);

        // Uppercase only
        assert!(CellAddress::letters_to_column("a").is_err());
        // Overflows u32
        assert!(CellAddress::letters_to_column("ZZZZZZZZZZ").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        assert_eq!(CellAddress::parse("A1").unwrap(), addr(1, 1));
        assert_eq!(CellAddress::parse("B2").unwrap(), addr(2, 2));
        assert_eq!(CellAddress::parse("AA10").unwrap(), addr(27, 10));
        assert_eq!(CellAddress::parse("C007").unwrap(), addr(3, 7));
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("a1").is_err());
        assert!(CellAddress::parse("$A$1").is_err());
        assert!(CellAddress::parse(" A1").is_err());
        assert!(CellAddress::parse("A1B").is_err());
        assert!(CellAddress::parse("A99999999999").is_err());
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(CellAddress::new(0, 1).is_err());
        assert!(CellAddress::new(1, 0).is_err());
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(addr(1, 1).to_string(), "A1");
        assert_eq!(addr(3, 100).to_string(), "C100");
        assert_eq!(addr(28, 5).to_string(), "AB5");
    }

    #[test]
    fn test_ordering_is_column_major() {
        let mut cells = vec![addr(2, 1), addr(1, 2), addr(1, 1), addr(27, 1)];
        cells.sort();
        assert_eq!(cells, vec![addr(1, 1), addr(1, 2), addr(2, 1), addr(27, 1)]);
    }
}
