// src/utils/html.rs

use std::collections::HashSet;

/// Reduces user-supplied text (e.g. a display name) to plain text.
///
/// No tags are allowed, so markup is stripped; `<script>` and `<style>`
/// lose their contents too. The result is trimmed.
pub fn clean_text(input: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_kept() {
        assert_eq!(clean_text("  Aziza Karimova "), "Aziza Karimova");
    }

    #[test]
    fn test_markup_is_stripped() {
        assert_eq!(clean_text("<b>Aziza</b><script>alert(1)</script>"), "Aziza");
    }
}
