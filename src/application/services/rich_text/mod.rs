//! Sanitizing and length checks for editor-produced HTML descriptions.

use std::collections::{HashMap, HashSet};

pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const DESCRIPTION_MAX_LEN: usize = 5000;

const ALLOWED_TAGS: [&str; 29] = [
    "p",
    "br",
    "strong",
    "em",
    "u",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "blockquote",
    "a",
    "img",
    "code",
    "pre",
    "table",
    "thead",
    "tbody",
    "tr",
    "th",
    "td",
    "figure",
    "figcaption",
    "span",
    "div",
];

const ALLOWED_ATTRIBUTES: [&str; 12] = [
    "href", "title", "target", "rel", "src", "alt", "width", "height", "class", "style",
    "colspan", "rowspan",
];

#[derive(Debug, Clone, Copy)]
pub struct LengthLimits {
    pub min: usize,
    pub max: usize,
}

impl Default for LengthLimits {
    fn default() -> Self {
        Self {
            min: DESCRIPTION_MIN_LEN,
            max: DESCRIPTION_MAX_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid description: {}", .errors.join(", "))]
pub struct InvalidRichText {
    pub errors: Vec<String>,
}

pub fn sanitize_rich_text(dirty: &str) -> String {
    if dirty.is_empty() {
        return String::new();
    }
    let mut builder = ammonia::Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect::<HashSet<_>>())
        .tag_attributes(HashMap::new())
        // `rel` is an allowed attribute, so ammonia must not manage it itself
        .link_rel(None);
    builder.clean(dirty).to_string()
}

pub fn validate_rich_text(content: &str, limits: LengthLimits) -> Result<(), Vec<String>> {
    if content.is_empty() {
        return Err(vec!["Description must be a valid string".to_string()]);
    }
    let len = content.trim().chars().count();
    let mut errors = Vec::new();
    if len < limits.min {
        errors.push(format!(
            "Description must be at least {} characters long",
            limits.min
        ));
    }
    if len > limits.max {
        errors.push(format!("Description cannot exceed {} characters", limits.max));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the raw text, then sanitizes it for storage.
pub fn process_rich_text(dirty: &str) -> Result<RichText, InvalidRichText> {
    validate_rich_text(dirty, LengthLimits::default()).map_err(|errors| InvalidRichText { errors })?;
    Ok(RichText {
        content: sanitize_rich_text(dirty),
    })
}
