//! Common validation utilities.

use validator::ValidationError;

/// Maximum number of digits in a phone number (E.164).
const MAX_PHONE_DIGITS: usize = 15;

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 7;

/// Validates a phone number.
/// - Optional leading `+`
/// - 7 to 15 digits
/// - Spaces, dashes and parentheses allowed as separators
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let mut digits = 0usize;
    for (i, c) in phone.chars().enumerate() {
        match c {
            '0'..='9' => digits += 1,
            '+' if i == 0 => {}
            ' ' | '-' | '(' | ')' => {}
            _ => {
                let mut err = ValidationError::new("phone_format");
                err.message = Some("Phone number contains invalid characters".into());
                return Err(err);
            }
        }
    }
    if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_length");
        err.message = Some("Phone number must contain 7 to 15 digits".into());
        Err(err)
    }
}

/// Validates a person name: 1 to 100 characters, at least one letter,
/// letters plus spaces, hyphens, apostrophes and periods only.
pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        let mut err = ValidationError::new("name_length");
        err.message = Some("Name must be between 1 and 100 characters".into());
        return Err(err);
    }
    if !trimmed.chars().any(|c| c.is_alphabetic()) {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name must contain at least one letter".into());
        return Err(err);
    }
    if trimmed
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'))
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name contains invalid characters".into());
        Err(err)
    }
}
