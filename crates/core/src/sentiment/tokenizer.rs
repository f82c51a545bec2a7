//! Whitespace tokenizer that keeps emoticons and original casing.
//!
//! Splits on whitespace and strips surrounding ASCII punctuation from each
//! token, unless stripping would leave two characters or fewer (so `:)` and
//! `<3` survive intact). Casing is preserved because ALL-CAPS emphasis is a
//! scoring signal. Uses byte spans into the original text, no per-token
//! allocation.

/// Tokenized text: borrows the input, provides `&str` slices via byte spans.
pub struct Tokens<'a> {
    text: &'a str,
    spans: Vec<(u32, u32)>,
}

impl<'a> Tokens<'a> {
    /// Returns an iterator over the token slices, original casing.
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        let text = self.text;
        self.spans
            .iter()
            .map(move |&(s, e)| &text[s as usize..e as usize])
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns `true` if there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Tokenize review text for sentiment scoring.
pub fn tokenize(text: &str) -> Tokens<'_> {
    let mut spans = Vec::new();
    let base = text.as_ptr() as usize;

    for raw in text.split_whitespace() {
        // split_whitespace yields subslices of `text`
        let start = raw.as_ptr() as usize - base;
        let end = start + raw.len();

        let stripped = raw.trim_matches(|c: char| c.is_ascii_punctuation());
        if stripped.chars().count() <= 2 {
            spans.push((start as u32, end as u32));
        } else {
            let lead = raw.len() - raw.trim_start_matches(|c: char| c.is_ascii_punctuation()).len();
            let s = start + lead;
            spans.push((s as u32, (s + stripped.len()) as u32));
        }
    }

    Tokens { text, spans }
}

/// Python-style `isupper`: at least one cased character, none lowercase.
pub fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}
