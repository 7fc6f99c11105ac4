//! Tweet text tokenization
//!
//! Splits content on whitespace and picks out `@mention` and `#hashtag`
//! tokens. Names are taken exactly as typed after the prefix character.

/// Mentions and hashtags found in a piece of tweet text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    /// Usernames without the leading `@`, first occurrence order
    pub mentions: Vec<String>,
    /// Labels without the leading `#`, first occurrence order
    pub hashtags: Vec<String>,
}

/// Classify the whitespace-separated tokens of `content`.
///
/// A bare `@` or `#` is ignored. Repeated names are reported once.
pub fn tokenize(content: &str) -> Tokens {
    let mut tokens = Tokens::default();

    for word in content.split_whitespace() {
        if let Some(name) = word.strip_prefix('@') {
            push_unique(&mut tokens.mentions, name);
        } else if let Some(label) = word.strip_prefix('#') {
            push_unique(&mut tokens.hashtags, label);
        }
    }

    tokens
}

fn push_unique(values: &mut Vec<String>, candidate: &str) {
    if candidate.is_empty() || values.iter().any(|value| value == candidate) {
        return;
    }
    values.push(candidate.to_string());
}
