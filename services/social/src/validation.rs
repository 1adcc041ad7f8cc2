//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Validate username: 3 to 20 characters
pub fn validate_username(username: &str) -> Result<(), String> {
    let length = username.chars().count();

    if !(3..=20).contains(&length) {
        return Err("Username must be between 3-20 characters".to_string());
    }

    if username.trim() != username {
        return Err("Username must not start or end with whitespace".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 254 {
        return Err("Invalid email format".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password strength
///
/// At least 6 characters with a lowercase letter, an uppercase letter, a
/// digit and a symbol.
pub fn validate_password(password: &str) -> Result<(), String> {
    const MESSAGE: &str = "Password must be at least 6 characters and contain a mix of \
                           uppercase and lowercase letters, numbers, and symbols";

    if password.chars().count() < 6 || password.len() > 128 {
        return Err(MESSAGE.to_string());
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_uppercase() {
            has_upper = true;
        } else if c.is_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(MESSAGE.to_string())
    }
}

/// Validate an http(s) URL used as an image reference
pub fn validate_image_url(value: &str) -> Result<(), String> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err("Invalid image URL format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(validate_username("al").is_err());
        assert!(validate_username("ali").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
        // Counted in characters, not bytes.
        assert!(validate_username("éèà").is_ok());
        assert!(validate_username(" alice").is_err());
    }

    #[test]
    fn test_email_format() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@@x.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password("Abc123!").is_ok());
        assert!(validate_password("Ab1!").is_err());
        assert!(validate_password("abc123!").is_err());
        assert!(validate_password("ABC123!").is_err());
        assert!(validate_password("Abcdef!").is_err());
        assert!(validate_password("Abc1234").is_err());
    }

    #[test]
    fn test_image_url() {
        assert!(validate_image_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_image_url("http://localhost:9000/a.png").is_ok());
        assert!(validate_image_url("ftp://cdn.example.com/a.png").is_err());
        assert!(validate_image_url("a.png").is_err());
        assert!(validate_image_url("javascript:alert(1)").is_err());
    }
}
