use super::StoreError;
use regex::Regex;

pub const IDENTIFIER_MIN_LEN: usize = 4;
pub const IDENTIFIER_MAX_LEN: usize = 30;

/// True when `identifier` is `IDENTIFIER_MIN_LEN..=IDENTIFIER_MAX_LEN` ASCII
/// alphanumerics.
pub fn valid_identifier(identifier: &str) -> bool {
    Regex::new(&format!(
        "^[A-Za-z0-9]{{{IDENTIFIER_MIN_LEN},{IDENTIFIER_MAX_LEN}}}$"
    ))
    .is_ok_and(|re| re.is_match(identifier))
}

/// Reject identifiers that could break the record format or fall outside the
/// permitted character set.
///
/// # Errors
/// Returns `StoreError::InvalidIdentifier`.
pub fn validate_identifier(identifier: &str) -> Result<(), StoreError> {
    if identifier.contains(super::DELIMITER) || !valid_identifier(identifier) {
        return Err(StoreError::InvalidIdentifier);
    }

    Ok(())
}
