use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

pub static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug pattern"));

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 100;

pub fn normalize_slug(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Returns the first slug that occurs more than once, comparing normalized forms.
pub fn first_duplicate<'a, I>(slugs: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    slugs
        .into_iter()
        .map(normalize_slug)
        .find(|s| !seen.insert(s.clone()))
}
