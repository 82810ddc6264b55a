use crate::error::{BoardError, Result};
use crate::sanitize;

pub const MIN_PASSPHRASE_CHARS: usize = 12;
pub const MAX_HINT_CHARS: usize = 100;

/// Enforce the share passphrase policy: at least 12 characters with a
/// lowercase letter, an uppercase letter, a digit and a symbol.
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    let mut missing = Vec::new();

    if passphrase.chars().count() < MIN_PASSPHRASE_CHARS {
        missing.push("at least 12 characters");
    }
    if !passphrase.chars().any(|c| c.is_lowercase()) {
        missing.push("a lowercase letter");
    }
    if !passphrase.chars().any(|c| c.is_uppercase()) {
        missing.push("an uppercase letter");
    }
    if !passphrase.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit");
    }
    if !passphrase.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        missing.push("a symbol");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BoardError::validation(format!("passphrase needs {}", missing.join(", "))))
    }
}

/// Normalise an optional passphrase hint. The hint is sent in clear text, so
/// one that contains the passphrase is refused.
pub fn validate_hint(hint: Option<&str>, passphrase: &str) -> Result<Option<String>> {
    let Some(hint) = hint else {
        return Ok(None);
    };
    let hint = sanitize::plain_text(hint, MAX_HINT_CHARS);
    if hint.is_empty() {
        return Ok(None);
    }
    if hint.to_lowercase().contains(&passphrase.to_lowercase()) {
        return Err(BoardError::validation("hint must not contain the passphrase"));
    }
    Ok(Some(hint))
}

/// The two entries of a passphrase form must match.
pub fn confirm(passphrase: &str, confirmed: &str) -> Result<()> {
    if passphrase != confirmed {
        return Err(BoardError::validation("passphrases do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strong_passphrase() {
        assert!(validate_passphrase("Str0ng!Passw0rd").is_ok());
    }

    #[test]
    fn reports_each_missing_class() {
        let err = validate_passphrase("short").unwrap_err().to_string();
        assert!(err.contains("at least 12 characters"));
        assert!(err.contains("an uppercase letter"));
        assert!(err.contains("a digit"));
        assert!(err.contains("a symbol"));
        assert!(!err.contains("a lowercase letter"));
    }

    #[test]
    fn rejects_missing_symbol() {
        let err = validate_passphrase("Str0ngPassw0rd").unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn hint_cannot_leak_passphrase() {
        let err = validate_hint(Some("it is str0ng!passw0rd"), "Str0ng!Passw0rd").unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn hint_is_trimmed_and_stripped() {
        let hint = validate_hint(Some("  <b>our usual</b> one  "), "Str0ng!Passw0rd").unwrap();
        assert_eq!(hint.as_deref(), Some("our usual one"));
        assert_eq!(validate_hint(Some("   "), "Str0ng!Passw0rd").unwrap(), None);
        assert_eq!(validate_hint(None, "Str0ng!Passw0rd").unwrap(), None);
    }

    #[test]
    fn confirmation_must_match() {
        assert!(confirm("Str0ng!Passw0rd", "Str0ng!Passw0rd").is_ok());
        assert!(confirm("Str0ng!Passw0rd", "Str0ng!Passw0rD").is_err());
    }
}
