//! Brazilian individual taxpayer number (CPF).
//!
//! Validation and formatting are independent operations. [`validate`] checks
//! the two mod-11 check digits, [`format`] only re-punctuates. Callers that
//! need both use [`NationalId::parse`], which is the only way to build a
//! [`NationalId`] outside of storage.
//!
//! ```
//! use ranking_core::national_id;
//!
//! assert!(national_id::validate("529.982.247-25"));
//! assert!(!national_id::validate("111.111.111-11"));
//! assert_eq!(national_id::format("52998224725"), "529.982.247-25");
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a CPF.
pub const LENGTH: usize = 11;

/// Errors that can occur when parsing a [`NationalId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NationalIdError {
    /// Not exactly 11 digits once punctuation is removed.
    #[error("CPF must have {LENGTH} digits (found {found})")]
    WrongLength {
        /// Number of digits found.
        found: usize,
    },
    /// All digits are the same (e.g. `111.111.111-11`).
    #[error("CPF cannot repeat a single digit")]
    RepeatedDigits,
    /// One of the two check digits does not match.
    #[error("CPF check digits do not match")]
    InvalidCheckDigit,
}

/// Returns `true` if `raw` is a valid CPF.
///
/// Every non-digit character is ignored, so both `52998224725` and
/// `529.982.247-25` are accepted.
#[must_use]
pub fn validate(raw: &str) -> bool {
    check(&digits_of(raw)).is_ok()
}

/// Formats `raw` as `ddd.ddd.ddd-dd`.
///
/// Non-digit characters are stripped first. If the result is not exactly 11
/// digits, the stripped digits are returned unchanged. No check-digit
/// validation is performed.
#[must_use]
pub fn format(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != LENGTH {
        return digits;
    }

    let mut formatted = String::with_capacity(LENGTH + 3);
    for (i, c) in digits.chars().enumerate() {
        match i {
            3 | 6 => formatted.push('.'),
            9 => formatted.push('-'),
            _ => {}
        }
        formatted.push(c);
    }
    formatted
}

fn digits_of(raw: &str) -> Vec<u8> {
    raw.bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect()
}

fn check(digits: &[u8]) -> Result<(), NationalIdError> {
    if digits.len() != LENGTH {
        return Err(NationalIdError::WrongLength {
            found: digits.len(),
        });
    }

    if let Some(&first) = digits.first()
        && digits.iter().all(|&d| d == first)
    {
        return Err(NationalIdError::RepeatedDigits);
    }

    let (body, checks) = digits.split_at(9);
    let first = check_digit(body);
    let second = check_digit(digits.split_at(10).0);

    if checks == [first, second] {
        Ok(())
    } else {
        Err(NationalIdError::InvalidCheckDigit)
    }
}

/// Mod-11 check digit over `prefix`, weights descending from `len + 1` to 2.
fn check_digit(prefix: &[u8]) -> u8 {
    let top = prefix.len() + 1;
    let sum: usize = prefix
        .iter()
        .enumerate()
        .map(|(i, &d)| usize::from(d) * (top - i))
        .sum();

    match sum % 11 {
        0 | 1 => 0,
        rem => u8::try_from(11 - rem).unwrap_or(0),
    }
}

/// A validated CPF, held in its formatted `ddd.ddd.ddd-dd` form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

impl NationalId {
    /// Placeholder some legacy rows carry instead of a real CPF.
    pub const LEGACY_PLACEHOLDER: &'static str = "000.000.000-00";

    /// Validate and format a CPF.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not contain exactly 11 digits, repeats
    /// a single digit, or fails the check-digit test.
    pub fn parse(raw: &str) -> Result<Self, NationalIdError> {
        check(&digits_of(raw))?;
        Ok(Self(format(raw)))
    }

    /// Returns the formatted CPF.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `NationalId` and returns its formatted string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for NationalId {
    type Err = NationalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NationalId {
    type Error = NationalIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NationalId> for String {
    fn from(id: NationalId) -> Self {
        id.0
    }
}

impl AsRef<str> for NationalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID: &[&str] = &["52998224725", "11144477735", "39053344705", "12345678909"];

    #[test]
    fn test_validate_known_good() {
        for cpf in VALID {
            assert!(validate(cpf), "{cpf} should be valid");
        }
        assert!(validate("529.982.247-25"));
    }

    #[test]
    fn test_validate_rejects_repeated_digits() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(LENGTH);
            assert!(!validate(&cpf), "{cpf} should be rejected");
        }
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        assert!(!validate(""));
        assert!(!validate("5299822472"));
        assert!(!validate("529982247250"));
        assert!(!validate("abc"));
    }

    // Remainders 0 and 1 both map to check digit 0, so a few valid CPFs have
    // a valid single-digit neighbour (39053344705 -> 49053344705). These two
    // do not.
    #[test]
    fn test_any_single_digit_mutation_fails() {
        for cpf in &["52998224725", "11144477735"] {
            let digits: Vec<u8> = cpf.bytes().collect();
            for pos in 0..digits.len() {
                for replacement in b'0'..=b'9' {
                    if digits.get(pos) == Some(&replacement) {
                        continue;
                    }
                    let mut mutated = digits.clone();
                    if let Some(slot) = mutated.get_mut(pos) {
                        *slot = replacement;
                    }
                    let mutated = String::from_utf8(mutated).unwrap();
                    assert!(!validate(&mutated), "{mutated} (from {cpf}) should fail");
                }
            }
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(format("52998224725"), "529.982.247-25");
        assert_eq!(format("529.982.247-25"), "529.982.247-25");
        assert_eq!(format(" 529 982 247 25 "), "529.982.247-25");
    }

    #[test]
    fn test_format_does_not_validate() {
        assert_eq!(format("11111111111"), "111.111.111-11");
    }

    #[test]
    fn test_format_wrong_length_returns_digits() {
        assert_eq!(format("123.456"), "123456");
        assert_eq!(format("no digits"), "");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            NationalId::parse("123"),
            Err(NationalIdError::WrongLength { found: 3 })
        );
        assert_eq!(
            NationalId::parse("000.000.000-00"),
            Err(NationalIdError::RepeatedDigits)
        );
        assert_eq!(
            NationalId::parse("52998224726"),
            Err(NationalIdError::InvalidCheckDigit)
        );
    }

    #[test]
    fn test_parse_formats() {
        let id = NationalId::parse("52998224725").unwrap();
        assert_eq!(id.as_str(), "529.982.247-25");
        assert_eq!(id.to_string(), "529.982.247-25");
    }

    #[test]
    fn test_deserialize_validates() {
        let id: NationalId = serde_json::from_str("\"52998224725\"").unwrap();
        assert_eq!(id.as_str(), "529.982.247-25");
        assert!(serde_json::from_str::<NationalId>("\"11111111111\"").is_err());
    }
}
