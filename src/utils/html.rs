/// Clean user-supplied HTML using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) are kept, dangerous tags
/// (like <script>, <iframe>) and attributes (like onclick) are stripped.
/// Applied to profile bios and assessment descriptions before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script() {
        let cleaned = clean_html("<p>Hi</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Hi</p>");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(clean_html("Rust developer"), "Rust developer");
    }
}
