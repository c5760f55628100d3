//! Block-aware text views over decoded model output.

pub mod format;

use std::sync::LazyLock;

use regex::Regex;

pub use format::{join_with_separator, text_with_morphs};

/// Special tokens stripped from decoded text regardless of what the
/// tokenizer declares.
pub const SPECIAL_TOKENS_TO_IGNORE: [&str; 3] = ["<unk>", "</s>", "<pad>"];

static SENTINEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<extra_id_(\d+)>").expect("valid sentinel regex"));

/// Split on literal `separator`, trimming each piece.
///
/// With `skip_empty` pieces that are empty after trimming are dropped;
/// otherwise they are kept so positions line up with the separators.
pub fn split_text(text: &str, separator: &str, skip_empty: bool) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|block| !skip_empty || !block.is_empty())
        .map(str::to_string)
        .collect()
}

/// The text with block boundaries ignored.
pub fn strip_separators(text: &str, separator: &str) -> String {
    split_text(text, separator, true).join(" ")
}

/// Every block collapsed into one whitespace-free token.
pub fn unify_blocks(text: &str, separator: &str) -> String {
    split_text(text, separator, true)
        .iter()
        .map(|block| block.split_whitespace().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove each of `tokens` from `text`, trimming after every removal.
pub fn remove_special_tokens<S: AsRef<str>>(text: &str, tokens: &[S]) -> String {
    let mut out = text.to_string();
    for token in tokens {
        out = out.replace(token.as_ref(), "").trim().to_string();
    }
    out
}

/// Special tokens to strip from decoded text: the fixed ones plus those the
/// tokenizer declares, minus the sentinels.
pub fn tokens_to_ignore(declared: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = SPECIAL_TOKENS_TO_IGNORE.iter().map(|t| t.to_string()).collect();
    for token in declared {
        if !tokens.contains(token) && !SENTINEL_RE.is_match(token) {
            tokens.push(token.clone());
        }
    }
    tokens
}

/// Render `<extra_id_N>` as `<N>`.
pub fn simplify_sentinels(text: &str) -> String {
    SENTINEL_RE.replace_all(text, "<$1>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENT: &str = "this is <sep> an example <sep> <sep> text <sep>";

    #[test]
    fn split_text_skips_or_keeps_empty_blocks() {
        assert_eq!(
            split_text("this is <s> an example <s> <s> sentence", "<s>", true),
            vec!["this is", "an example", "sentence"]
        );
        assert_eq!(
            split_text("this is <s> an example <s> <s> sentence", "<s>", false),
            vec!["this is", "an example", "", "sentence"]
        );
        assert_eq!(split_text(SENT, "<sep>", false), vec!["this is", "an example", "", "text", ""]);
    }

    #[test]
    fn split_text_without_separator_is_one_block() {
        assert_eq!(split_text("  plain  ", "<s>", true), vec!["plain"]);
        assert!(split_text("", "<s>", true).is_empty());
        assert_eq!(split_text("", "<s>", false), vec![""]);
    }

    #[test]
    fn strip_separators_joins_blocks() {
        assert_eq!(strip_separators(SENT, "<sep>"), "this is an example text");
    }

    #[test]
    fn unify_blocks_removes_inner_whitespace() {
        assert_eq!(unify_blocks("this is <s> an example <s>", "<s>"), "thisis anexample");
        assert_eq!(unify_blocks(SENT, "<sep>"), "thisis anexample text");
    }

    #[test]
    fn remove_special_tokens_trims() {
        let out = remove_special_tokens("<pad> in the beginning <extra_id_2> was</s>", &SPECIAL_TOKENS_TO_IGNORE);
        assert_eq!(out, "in the beginning <extra_id_2> was");
    }

    #[test]
    fn sentinels_are_never_ignored() {
        let declared = vec!["<extra_id_0>".to_string(), "<mask>".to_string(), "</s>".to_string()];
        let tokens = tokens_to_ignore(&declared);
        assert_eq!(tokens, vec!["<unk>", "</s>", "<pad>", "<mask>"]);
    }

    #[test]
    fn simplifies_sentinels() {
        assert_eq!(simplify_sentinels("a <extra_id_2>b <extra_id_12>"), "a <2>b <12>");
        assert_eq!(simplify_sentinels("no sentinels"), "no sentinels");
    }
}
