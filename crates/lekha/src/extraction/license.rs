//! Licence number canonical form: `PP-OOO-NNNNNN` (province, office, serial).

use super::patterns::LICENSE_NUMBER;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LicenseNumber {
    pub province: u8,
    pub office: u16,
    pub serial: u32,
}

impl LicenseNumber {
    /// Parses any tolerated spelling (`03-066-041605`, `03 066 041605`, `03066041605`).
    /// Devanagari digits must already be transliterated.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = LICENSE_NUMBER.captures(text.trim())?;
        Some(Self {
            province: caps[1].parse().ok()?,
            office: caps[2].parse().ok()?,
            serial: caps[3].parse().ok()?,
        })
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LicenseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:03}-{:06}", self.province, self.office, self.serial)
    }
}

/// Canonical form of `text`, or `None` when it is not a licence number.
pub fn canonicalize(text: &str) -> Option<String> {
    LicenseNumber::parse(text).map(|n| n.canonical())
}

/// Regrouping of exactly 11 digits, ignoring any other characters.
pub fn regroup_digits(text: &str) -> Option<String> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 {
        Some(format!("{}-{}-{}", &digits[0..2], &digits[2..5], &digits[5..11]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        let canonical = "03-066-041605";
        let parsed = LicenseNumber::parse(canonical).unwrap();
        assert_eq!(parsed.canonical(), canonical);
        assert_eq!(canonicalize(&parsed.canonical()).as_deref(), Some(canonical));
    }

    #[test]
    fn test_eleven_digits_normalize_to_canonical() {
        assert_eq!(canonicalize("03066041605").as_deref(), Some("03-066-041605"));
        assert_eq!(canonicalize("03 066 041605").as_deref(), Some("03-066-041605"));
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let parsed = LicenseNumber::parse("01-001-000042").unwrap();
        assert_eq!(parsed.province, 1);
        assert_eq!(parsed.serial, 42);
        assert_eq!(parsed.to_string(), "01-001-000042");
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert_eq!(canonicalize("3-66-41605"), None);
        assert_eq!(canonicalize("9812345678"), None);
    }

    #[test]
    fn test_regroup_digits() {
        assert_eq!(regroup_digits("0306604160 5").as_deref(), Some("03-066-041605"));
        assert_eq!(regroup_digits("123"), None);
    }
}
