//! Input validation and sanitization for registration fields.

use once_cell::sync::Lazy;
use regex::Regex;

static ACCOUNT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{8,20}$").unwrap());
static ID_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{8,20}$").unwrap());

pub fn valid_full_name(full_name: &str) -> bool {
    let len = full_name.chars().count();
    (2..=100).contains(&len)
}

pub fn valid_account_number(account_number: &str) -> bool {
    ACCOUNT_NUMBER_RE.is_match(account_number)
}

pub fn valid_id_number(id_number: &str) -> bool {
    ID_NUMBER_RE.is_match(id_number)
}

/// Password complexity: at least 8 characters with one uppercase letter, one
/// lowercase letter, one digit and one symbol.
pub fn strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

/// Escape HTML-significant characters before a value is persisted, so stored
/// markup can never reach a browser intact.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}
