//! Terminal capture cleanup.

/// Keep only 7-bit ASCII. Box drawing, powerline glyphs and other wide
/// characters from the capture are dropped entirely.
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_non_ascii() {
        assert_eq!(sanitize("a\u{e9}b"), "ab");
        assert_eq!(sanitize("\u{2500}\u{2500} ~/repo \u{e0b0} git"), " ~/repo  git");
    }

    #[test]
    fn keeps_control_characters() {
        assert_eq!(sanitize("ls\n\tfoo\r\n"), "ls\n\tfoo\r\n");
    }

    #[test]
    fn empty_input() {
        assert_eq!(sanitize(""), "");
    }
}
