use once_cell::sync::Lazy;
use regex::Regex;

pub fn is_valid_email(string: &str) -> Result<(), String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
        r#"(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])"#
    ).unwrap()
    });
    match RE.is_match(string) {
        true => Ok(()),
        false => Err("invalid email".to_string()),
    }
}

pub fn is_valid_pool_name(string: &str) -> Result<(), String> {
    let trimmed = string.trim();
    match !trimmed.is_empty() && trimmed.len() <= 64 {
        true => Ok(()),
        false => {
            Err("pool name must be between 1 and 64 characters".to_string())
        }
    }
}

pub fn is_valid_invite_code(string: &str) -> Result<(), String> {
    let cmp = string.len() == 6
        && string
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

    match cmp {
        true => Ok(()),
        false => Err("invalid invite code".to_string()),
    }
}

#[cfg(test)]
#[test]
fn test_email() {
    assert!(is_valid_email("hello@example.com").is_ok())
}

#[cfg(test)]
#[test]
fn test_invite_code() {
    assert!(is_valid_invite_code("ABC123").is_ok());
    assert!(is_valid_invite_code("abc123").is_err());
    assert!(is_valid_invite_code("ABC12").is_err());
}
