//! Translation option storage.
//!
//! `PhraseTable` is the narrow lookup the decoder consumes: source span text in,
//! ranked target renderings out. `MemoryPhraseTable` is a hash-backed table
//! with the top-k truncation and identity fallback the decoder expects of a loader.

mod memory;

pub use memory::MemoryPhraseTable;

/// One target-language rendering of a source phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPhrase {
    /// Target words separated by single spaces.
    pub text: String,
    /// Translation log-probability.
    pub log_prob: f64,
}

impl TargetPhrase {
    pub fn new(text: impl Into<String>, log_prob: f64) -> Self {
        Self {
            text: text.into(),
            log_prob,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhraseTableError {
    #[error("empty source phrase")]
    EmptySource,
    #[error("empty target phrase for source \"{0}\"")]
    EmptyTarget(String),
    #[error("NaN log-probability for \"{phrase}\" -> \"{target}\"")]
    NanLogProb { phrase: String, target: String },
    #[error("candidate limit must be positive")]
    ZeroLimit,
}

pub trait PhraseTable: Send + Sync {
    /// Candidates for the exact source span text (tokens joined by single
    /// spaces), best first. Empty when the span has no known translation.
    fn lookup(&self, source: &str) -> &[TargetPhrase];

    fn contains(&self, source: &str) -> bool {
        !self.lookup(source).is_empty()
    }
}

/// Join tokens the way span text is keyed: single spaces, no padding.
pub fn span_text<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(token.as_ref());
    }
    text
}
