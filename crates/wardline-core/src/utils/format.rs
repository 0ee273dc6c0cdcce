/// Strip a mobile number down to its 10 local digits.
/// Accepts spaces, dashes and a leading +91/91 country code.
/// Returns None if what remains is not exactly 10 digits.
pub fn normalize_mobile(mobile: &str) -> Option<String> {
    let trimmed = mobile.trim();
    if trimmed.chars().any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '+'))) {
        return None;
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => Some(digits),
        12 if digits.starts_with("91") => Some(digits[2..].to_string()),
        _ => None,
    }
}

/// Format a mobile number for display as "98470 12345".
/// Returns the original text if it can't be normalized.
pub fn format_mobile(mobile: &str) -> String {
    match normalize_mobile(mobile) {
        Some(digits) => format!("{} {}", &digits[0..5], &digits[5..10]),
        None => mobile.to_string(),
    }
}

/// Case-insensitive substring test. `needle` should already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(needle)
}

/// Truncate a string to a maximum length in chars, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
