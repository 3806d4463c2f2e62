//! Row and file key rules.

use crate::errors::ModelError;

/// Longest key the remote platform accepts.
pub const MAX_ID_LEN: usize = 36;

/// Check a caller-chosen key (a post slug or explicit file id).
///
/// Keys are at most 36 chars of `a-z A-Z 0-9 . - _` and may not start
/// with one of the special characters.
pub fn validate_id(id: &str) -> Result<(), ModelError> {
    if id.is_empty() {
        return Err(ModelError::Validation("id must not be empty".into()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(ModelError::Validation(format!("id longer than {MAX_ID_LEN} characters")));
    }
    if let Some(bad) = id.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))) {
        return Err(ModelError::Validation(format!("id contains invalid character {bad:?}")));
    }
    if id.starts_with(&['.', '-', '_'][..]) {
        return Err(ModelError::Validation("id must not start with a special character".into()));
    }
    Ok(())
}

/// Fresh server-side key: 32 lowercase hex characters.
pub fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slugs() {
        for ok in ["hello-world", "a", "post_1.draft", "X9"] {
            assert!(validate_id(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_bad_ids() {
        let long = "a".repeat(37);
        for bad in ["", "-leading", "_x", ".x", "has space", "ünicode", long.as_str()] {
            assert!(validate_id(bad).is_err(), "{bad}");
        }
        assert!(validate_id(&"a".repeat(36)).is_ok());
    }

    #[test]
    fn unique_ids_are_valid_and_distinct() {
        let a = unique();
        let b = unique();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        validate_id(&a).unwrap();
    }
}
