// ============================================================
// Layer 4 — Plain Corpus Preprocessor
// ============================================================
// Turns raw corpus text into the flat token stream used for
// language-model batching:
//
//   1. Lower-case the whole text
//   2. Split on Unicode whitespace
//
// Nothing else is stripped. Punctuation attached to words stays
// attached, and zero-width characters (U+200B, a leading BOM)
// are not whitespace, so they stay inside the token they touch.
// The corpus vocabulary and LM windows depend on exactly this
// token stream.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Lower-case and whitespace-split `text` into owned tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_splits() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("The Cat  SAT\n"), vec!["the", "cat", "sat"]);
    }

    #[test]
    fn test_keeps_punctuation_attached() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("Hello, world."), vec!["hello,", "world."]);
    }

    #[test]
    fn test_splits_on_tabs_and_nbsp() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("a\tb\u{00A0}c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_width_characters_do_not_split() {
        let p = Preprocessor::new();
        assert_eq!(
            p.tokenize("\u{FEFF}The a\u{200B}b"),
            vec!["\u{feff}the", "a\u{200b}b"]
        );
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert!(p.tokenize("").is_empty());
    }
}
