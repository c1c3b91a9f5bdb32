use crate::TripleExtractor;
use crate::error::ExtractError;
use crate::schema::Triple;
use async_trait::async_trait;

pub const MENTIONS: &str = "MENTIONS";

/// Local placeholder used when no generation credential is configured.
///
/// Splits on `.`, looks at the first few sentences and links the first word
/// to the last word of each. No claim of semantic correctness.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    max_sentences: usize,
    max_triples: usize,
    min_tokens: usize,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self {
            max_sentences: 5,
            max_triples: 10,
            min_tokens: 3,
        }
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract_triples(&self, text: &str) -> Vec<Triple> {
        text.split('.')
            .take(self.max_sentences)
            .filter_map(|sentence| {
                let words: Vec<&str> = sentence.split_whitespace().collect();
                if words.len() < self.min_tokens {
                    return None;
                }
                Some(Triple::new(words[0], MENTIONS, words[words.len() - 1]))
            })
            .take(self.max_triples)
            .collect()
    }
}

#[async_trait]
impl TripleExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn try_extract(&self, text: &str) -> Result<Vec<Triple>, ExtractError> {
        Ok(self.extract_triples(text))
    }
}
