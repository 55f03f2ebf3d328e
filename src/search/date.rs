use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use time::Date;
use time::macros::format_description;

/// Width of the `YYYY-MM-DD` prefix every log line starts with.
pub const DATE_LEN: usize = 10;

/// A validated `YYYY-MM-DD` calendar date.
///
/// Lines are compared against it byte-wise: for this fixed-width form the
/// lexicographic order is the chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey {
    text: [u8; DATE_LEN],
    date: Date,
}

impl DateKey {
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != DATE_LEN || !s.is_ascii() {
            bail!("invalid date {s:?}: expected YYYY-MM-DD");
        }
        let date = Date::parse(s, format_description!("[year]-[month]-[day]"))
            .with_context(|| format!("invalid date {s:?}: expected YYYY-MM-DD"))?;
        let mut text = [0u8; DATE_LEN];
        text.copy_from_slice(s.as_bytes());
        Ok(Self { text, date })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    pub fn as_str(&self) -> &str {
        // validated as ASCII in `parse`
        std::str::from_utf8(&self.text).unwrap_or_default()
    }

    /// The following calendar day, rolling over months and years.
    ///
    /// `None` after 9999-12-31, the last date the key can spell.
    pub fn next_day(&self) -> Option<Self> {
        let date = self.date.next_day()?;
        let mut text = [0u8; DATE_LEN];
        let formatted = date.format(format_description!("[year]-[month]-[day]")).ok()?;
        if formatted.len() != DATE_LEN {
            return None;
        }
        text.copy_from_slice(formatted.as_bytes());
        Some(Self { text, date })
    }

    /// Does `line` begin with this date?
    pub fn prefixes(&self, line: &[u8]) -> bool {
        line.starts_with(&self.text)
    }
}

impl FromStr for DateKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(s: &str) -> String {
        DateKey::parse(s).unwrap().next_day().unwrap().to_string()
    }

    #[test]
    fn next_day_rolls_over() {
        assert_eq!(next("2024-12-01"), "2024-12-02");
        assert_eq!(next("2024-11-30"), "2024-12-01");
        assert_eq!(next("2024-12-31"), "2025-01-01");
        assert_eq!(next("2024-02-28"), "2024-02-29");
        assert_eq!(next("2023-02-28"), "2023-03-01");
    }

    #[test]
    fn last_spellable_day_has_no_successor() {
        assert_eq!(DateKey::parse("9999-12-31").unwrap().next_day(), None);
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["2024-1-01", "2024/12/01", "2024-13-01", "2023-02-29", "", "2024-12-01 "] {
            assert!(DateKey::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn matches_line_prefix() {
        let key = DateKey::parse("2024-12-01").unwrap();
        assert!(key.prefixes(b"2024-12-01 12:00:00 started"));
        assert!(!key.prefixes(b"2024-12-0"));
        assert!(!key.prefixes(b" 2024-12-01"));
    }
}
