// Allow dead code: formatting helpers exercised by tests
#![allow(dead_code)]

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Format an optional count for table cells
pub fn format_count(value: Option<i64>) -> String {
    match value {
        Some(n) => n.to_string(),
        None => "-".to_string(),
    }
}

/// Format an ISO date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(Some(2310)), "2310");
        assert_eq!(format_count(None), "-");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-03-01T07:30:00Z"), "Mar 01, 2026");
        assert_eq!(format_date("2026-03-01"), "2026-03-01");
        assert_eq!(format_date("bad"), "bad");
    }
}
