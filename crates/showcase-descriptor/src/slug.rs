//! Filesystem-safe slugs for generated image names.

use std::sync::LazyLock;

use deunicode::deunicode;
use regex::Regex;

/// Default maximum slug length.
pub const DEFAULT_SLUG_LEN: usize = 80;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug pattern"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("valid separator pattern"));

/// Convert free text to a lowercase, hyphenated ASCII slug of at most `max_len` chars.
///
/// Empty results become `image`.
pub fn slugify(text: &str, max_len: usize) -> String {
    let ascii = deunicode(text.trim()).to_lowercase();
    let cleaned = DISALLOWED.replace_all(&ascii, "");
    let collapsed = SEPARATORS.replace_all(&cleaned, "-");

    let trimmed = collapsed.trim_matches('-');
    let slug = if trimmed.is_empty() { "image" } else { trimmed };

    let truncated: String = slug.chars().take(max_len).collect();
    truncated.trim_end_matches('-').to_string()
}

/// File name for a generated image: `<section-slug>-<alt-slug>.png`.
pub fn image_file_name(section: &str, alt: &str) -> String {
    format!(
        "{}-{}.png",
        slugify(section, DEFAULT_SLUG_LEN),
        slugify(alt, DEFAULT_SLUG_LEN)
    )
}
