//! Phone number normalization to E.164.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("phone number is empty")]
    Empty,

    #[error("phone number contains invalid characters")]
    InvalidCharacters,

    #[error("phone number has {0} digits")]
    InvalidLength(usize),
}

const NATIONAL_DIGITS: usize = 10;

/// Normalize a user-entered phone number to `+<country><number>`.
///
/// Accepts separators (space, `-`, `.`, `/`, parentheses), an international
/// `+` or `00` prefix, a trunk `0`, or a bare national number, which gets
/// `default_country_code` prepended.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PhoneError::Empty);
    }

    let mut digits = String::with_capacity(trimmed.len());
    let mut international = false;
    for (i, c) in trimmed.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if i == 0 => international = true,
            ' ' | '-' | '.' | '/' | '(' | ')' => {}
            _ => return Err(PhoneError::InvalidCharacters),
        }
    }
    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    if !international {
        if let Some(rest) = digits.strip_prefix("00") {
            digits = rest.to_string();
            international = true;
        }
    }

    if international {
        return if (8..=15).contains(&digits.len()) {
            Ok(format!("+{digits}"))
        } else {
            Err(PhoneError::InvalidLength(digits.len()))
        };
    }

    let cc = default_country_code;
    match digits.len() {
        NATIONAL_DIGITS if !digits.starts_with('0') => Ok(format!("+{cc}{digits}")),
        n if n == NATIONAL_DIGITS + 1 && digits.starts_with('0') => {
            Ok(format!("+{cc}{}", &digits[1..]))
        }
        n if n == NATIONAL_DIGITS + cc.len() && digits.starts_with(cc) => Ok(format!("+{digits}")),
        n => Err(PhoneError::InvalidLength(n)),
    }
}
