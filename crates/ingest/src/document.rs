use serde::{Deserialize, Serialize};

/// A corpus entry read into memory. Consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name of the entry, used as provenance for stored facts.
    pub identifier: String,
    pub text: String,
}

impl Document {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
        }
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Borrow at most `max_chars` characters from the start of the text,
    /// never splitting a UTF-8 sequence.
    pub fn prefix(&self, max_chars: usize) -> &str {
        truncate_chars(&self.text, max_chars)
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_respects_char_boundaries() {
        let doc = Document::new("a.txt", "héllo wörld");
        assert_eq!(doc.prefix(2), "hé");
        assert_eq!(doc.prefix(100), "héllo wörld");
        assert_eq!(doc.char_len(), 11);
    }

    #[test]
    fn test_truncate_zero() {
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
