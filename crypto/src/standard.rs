//! The results grammar oracles sign over.
//!
//! A results string is one or more groups separated by `|`; each group is one
//! or more integers separated by `,`. Every segment must be non-empty, so a
//! leading, trailing or doubled separator invalidates the whole string.

/// Check that `text` follows the results grammar.
pub fn enforce_format(text: &str) -> bool {
    text.split('|')
        .all(|group| group.split(',').all(is_integer))
}

fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
