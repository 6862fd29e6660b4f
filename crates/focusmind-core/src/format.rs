//! Formatting utilities

/// Format a millisecond duration as whole minutes ("12 minutes")
pub fn minutes(ms: i64) -> String {
    let ms = ms.max(0) as f64;
    let minutes = (ms / 60_000.0).round() as u64;
    format!("{} minutes", minutes)
}

/// Keep at most `max_chars` characters of `s`
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for display, ending in an ellipsis when shortened
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        "...".to_string()
    } else {
        format!("{}...", truncate_chars(s, max_chars - 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes() {
        assert_eq!(minutes(0), "0 minutes");
        assert_eq!(minutes(-5), "0 minutes");
        assert_eq!(minutes(90_000), "2 minutes");
        assert_eq!(minutes(25 * 60_000), "25 minutes");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("a long line of text", 10), "a long ...");
    }
}
