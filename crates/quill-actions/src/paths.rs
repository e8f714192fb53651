//! Path cleanup for model-written paths.
//!
//! Models decorate paths with markdown artifacts: surrounding backticks or
//! quotes, and dash rules spilling in from separator lines. Cleanup here is
//! purely lexical; resolving the cleaned path against the index happens at
//! execution time.

/// Strips decoration from a model-written path.
///
/// Removes surrounding whitespace, runs of `-` at either end, and one or
/// more matched pairs of surrounding quotes or backticks. Interior
/// characters are untouched.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let mut s = raw.trim();
    loop {
        let before = s;
        s = s.trim_matches('-').trim();
        for quote in ['`', '"', '\''] {
            if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
                s = s[1..s.len() - 1].trim();
            }
        }
        if s == before {
            break;
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_unchanged() {
        assert_eq!(normalize_path("src/main.rs"), "src/main.rs");
    }

    #[test]
    fn strips_whitespace_and_dashes() {
        assert_eq!(normalize_path("  --- src/main.rs ---  "), "src/main.rs");
    }

    #[test]
    fn strips_quotes_and_backticks() {
        assert_eq!(normalize_path("`src/main.rs`"), "src/main.rs");
        assert_eq!(normalize_path("\"src/main.rs\""), "src/main.rs");
        assert_eq!(normalize_path("'`src/main.rs`'"), "src/main.rs");
    }

    #[test]
    fn interior_dashes_survive() {
        assert_eq!(normalize_path("docs/read-me.md"), "docs/read-me.md");
    }

    #[test]
    fn unmatched_quote_survives() {
        assert_eq!(normalize_path("\"src/main.rs"), "\"src/main.rs");
    }
}
