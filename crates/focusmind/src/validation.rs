//! Input validation for user-edited domain lists

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn domain_regex() -> &'static Regex {
    static DOMAIN: OnceLock<Regex> = OnceLock::new();
    DOMAIN.get_or_init(|| {
        Regex::new(r"(?i)^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$")
            .expect("domain pattern is valid")
    })
}

/// Check whether `domain` is a syntactically valid host name
pub fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.trim();
    !domain.is_empty() && domain_regex().is_match(domain)
}

/// Turn free-form textarea input into a clean blocked-domain list.
///
/// Entries are split on newlines, commas and semicolons, trimmed and
/// lowercased. Invalid entries are dropped and duplicates removed, keeping
/// the order of first occurrence.
pub fn sanitize_domain_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(['\n', ',', ';'])
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| is_valid_domain(entry))
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
