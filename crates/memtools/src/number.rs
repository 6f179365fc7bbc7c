//! Numeric literals with C style base detection.

use std::num::IntErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNumberError {
    #[error("empty number")]
    Empty,
    #[error("invalid number `{0}`")]
    Invalid(String),
    #[error("number `{0}` is too large")]
    Overflow(String),
}

/// Parses an unsigned literal, picking the base from its prefix.
///
/// `0x`/`0X` is hexadecimal, a leading `0` is octal, anything else is decimal. Surrounding
/// whitespace and a leading `+` are accepted, trailing garbage is not.
pub fn parse_u64(input: &str) -> Result<u64, ParseNumberError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(ParseNumberError::Empty);
    }

    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    // from_str_radix would accept another sign here
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseNumberError::Invalid(input.to_string()));
    }
    u64::from_str_radix(digits, radix).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => ParseNumberError::Overflow(input.to_string()),
        _ => ParseNumberError::Invalid(input.to_string()),
    })
}

/// Parses an address or length, which must fit in a `usize`.
pub fn parse_usize(input: &str) -> Result<usize, ParseNumberError> {
    let value = parse_u64(input)?;
    usize::try_from(value).map_err(|_| ParseNumberError::Overflow(input.to_string()))
}
