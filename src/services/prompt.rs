//! Prompt normalizer
//!
//! Free text from the form is trimmed and capped before it leaves the
//! process. The cap counts Unicode scalar values, so a multi-byte character
//! is either kept whole or dropped whole.

/// Longest prompt ever sent to the provider, in characters
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Trim surrounding whitespace and keep at most [`MAX_PROMPT_CHARS`] characters.
///
/// An empty result means no prompt was supplied.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}
