//! Tokenisation helpers shared by the similarity scorer and the learning
//! promoter.

/// Tokens must be longer than this many characters to count as significant.
///
/// One constant for both the similarity scorer and the learning promoter, so
/// the two subsystems cannot drift on what counts as an informative word.
pub(crate) const MIN_SIGNIFICANT_TOKEN_LENGTH: usize = 3;

/// Split `text` into lower-cased whitespace-delimited tokens.
pub(crate) fn tokenise(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.to_lowercase())
        .collect()
}

/// Whether a token is long enough to carry signal about the merchant.
///
/// Short words ("the", "pos", "w/d") show up in every statement line and say
/// nothing about where the money went.
pub(crate) fn is_significant(token: &str) -> bool {
    token.chars().count() > MIN_SIGNIFICANT_TOKEN_LENGTH
}

/// The significant tokens of `text`, deduplicated, in order of first
/// appearance.
pub(crate) fn significant_tokens(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();

    tokenise(text)
        .into_iter()
        .filter(|token| is_significant(token))
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

#[cfg(test)]
mod tokens_tests {
    use super::{is_significant, significant_tokens, tokenise};

    #[test]
    fn tokenise_lower_cases_and_splits_on_whitespace() {
        assert_eq!(
            tokenise("Amazon  Marketplace\tPurchase"),
            vec!["amazon", "marketplace", "purchase"]
        );
    }

    #[test]
    fn significance_requires_more_than_three_characters() {
        assert!(!is_significant("pos"));
        assert!(!is_significant("w/d"));
        assert!(is_significant("cafe"));
        assert!(is_significant("starbucks"));
    }

    #[test]
    fn significant_tokens_deduplicates_in_first_appearance_order() {
        let tokens = significant_tokens("Uber Trip UBER trip fee");

        assert_eq!(tokens, vec!["uber", "trip"]);
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        assert_eq!(significant_tokens("   "), Vec::<String>::new());
    }
}
