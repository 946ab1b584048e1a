//! Input validation helpers.

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate email format (basic validation).
///
/// # Examples
///
/// ```
/// use sweet_shop_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// assert!(!is_valid_email("user@example"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain needs a dot with something on both sides
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if host.is_empty() || tld.is_empty() {
        return false;
    }

    !email.chars().any(char::is_whitespace)
}

/// Check the password policy: at least eight characters, one letter, one digit.
///
/// # Examples
///
/// ```
/// use sweet_shop_auth::utils::is_strong_password;
///
/// assert!(is_strong_password("caramel42"));
/// assert!(!is_strong_password("caramel"));
/// assert!(!is_strong_password("12345678"));
/// ```
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Canonical form used for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_rejects_whitespace_and_double_at() {
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("a@.com"));
    }

    #[test]
    fn test_password_policy_counts_characters() {
        assert!(is_strong_password("bonbón12"));
        assert!(!is_strong_password("abc1"));
    }
}
