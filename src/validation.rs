use std::fmt;

/// Every issued anon key is a JWT, and base64url of `{"` is `eyJ`.
pub const KEY_PREFIX: &str = "eyJ";
pub const KEY_SEPARATOR: char = '.';
pub const KEY_PARTS: usize = 3;
pub const MIN_KEY_LEN: usize = 100;

/// First rule a candidate key broke, in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRejection {
    Empty,
    MissingPrefix,
    MissingSeparator,
    WrongPartCount(usize),
    TooShort(usize),
}

impl fmt::Display for KeyRejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyRejection::Empty => write!(f, "API key is empty"),
            KeyRejection::MissingPrefix => {
                write!(f, "JWT tokens should start with '{}'", KEY_PREFIX)
            }
            KeyRejection::MissingSeparator => write!(f, "JWT tokens should contain dots"),
            KeyRejection::WrongPartCount(_) => write!(
                f,
                "JWT tokens should have exactly {} parts separated by dots",
                KEY_PARTS
            ),
            KeyRejection::TooShort(_) => write!(f, "API key seems too short"),
        }
    }
}

/// Shape check for an anon key. No decoding or signature verification.
pub fn validate_api_key(key: &str) -> Result<(), KeyRejection> {
    if key.is_empty() {
        return Err(KeyRejection::Empty);
    }
    if !key.starts_with(KEY_PREFIX) {
        return Err(KeyRejection::MissingPrefix);
    }
    if !key.contains(KEY_SEPARATOR) {
        return Err(KeyRejection::MissingSeparator);
    }
    let parts = key.split(KEY_SEPARATOR).count();
    if parts != KEY_PARTS {
        return Err(KeyRejection::WrongPartCount(parts));
    }
    let len = key.chars().count();
    if len < MIN_KEY_LEN {
        return Err(KeyRejection::TooShort(len));
    }
    Ok(())
}

/// Acceptance rule for text scraped off the dashboard.
pub fn looks_like_key(text: &str) -> bool {
    text.starts_with(KEY_PREFIX)
        && text.chars().count() > MIN_KEY_LEN
        && text.split(KEY_SEPARATOR).count() == KEY_PARTS
}

/// Validate environment variable key naming for shells and process envs.
/// Pattern: [A-Za-z_][A-Za-z0-9_]*
pub fn is_valid_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
pub(crate) fn sample_key(len: usize) -> String {
    // eyJ<header>.<payload>.<signature>, padded out to `len`
    let fixed = "eyJhbGciOiJIUzI1NiJ9..sig".len();
    assert!(len >= fixed, "sample key needs at least {} chars", fixed);
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.sig",
        "x".repeat(len - fixed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key() {
        let key = sample_key(120);
        assert_eq!(key.len(), 120);
        assert_eq!(validate_api_key(&key), Ok(()));
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(validate_api_key(""), Err(KeyRejection::Empty));
    }

    #[test]
    fn test_prefix_checked_before_anything_else() {
        let err = validate_api_key("abc.def").unwrap_err();
        assert_eq!(err, KeyRejection::MissingPrefix);
        assert_eq!(err.to_string(), "JWT tokens should start with 'eyJ'");

        for candidate in ["x", "EYJ.a.b", " eyJ.a.b", "abc.def.ghi"] {
            assert_eq!(
                validate_api_key(candidate),
                Err(KeyRejection::MissingPrefix),
                "{candidate}"
            );
        }
    }

    #[test]
    fn test_missing_separator() {
        let key = format!("eyJ{}", "a".repeat(150));
        assert_eq!(validate_api_key(&key), Err(KeyRejection::MissingSeparator));
    }

    #[test]
    fn test_part_count_after_prefix() {
        let two = format!("eyJ{}.{}", "a".repeat(80), "b".repeat(80));
        let four = format!("{}.extra", sample_key(150));
        assert_eq!(validate_api_key(&two), Err(KeyRejection::WrongPartCount(2)));
        assert_eq!(validate_api_key(&four), Err(KeyRejection::WrongPartCount(4)));
        assert_eq!(
            validate_api_key(&two).unwrap_err().to_string(),
            "JWT tokens should have exactly 3 parts separated by dots"
        );
    }

    #[test]
    fn test_too_short() {
        let key = sample_key(99);
        assert_eq!(validate_api_key(&key), Err(KeyRejection::TooShort(99)));
        assert_eq!(
            validate_api_key(&key).unwrap_err().to_string(),
            "API key seems too short"
        );
        assert_eq!(validate_api_key(&sample_key(100)), Ok(()));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 57 characters, 107 bytes
        let key = format!("eyJ{}.a.b", "é".repeat(50));
        assert_eq!(validate_api_key(&key), Err(KeyRejection::TooShort(57)));
        assert!(!looks_like_key(&format!("eyJ{}.a.b", "é".repeat(60))));

        let key = format!("eyJ{}.a.b", "é".repeat(95));
        assert_eq!(key.chars().count(), 102);
        assert_eq!(validate_api_key(&key), Ok(()));
        assert!(looks_like_key(&key));
    }

    #[test]
    fn test_looks_like_key_requires_more_than_minimum() {
        assert!(!looks_like_key(&sample_key(100)));
        assert!(looks_like_key(&sample_key(101)));
        assert!(!looks_like_key("eyJ.short.key"));
        assert!(!looks_like_key(&format!("{}.x", sample_key(150))));
    }

    #[test]
    fn test_env_key_names() {
        assert!(is_valid_env_key("NEXT_PUBLIC_SUPABASE_ANON_KEY"));
        assert!(is_valid_env_key("_private"));
        assert!(!is_valid_env_key(""));
        assert!(!is_valid_env_key("1ABC"));
        assert!(!is_valid_env_key("WITH-DASH"));
    }
}
