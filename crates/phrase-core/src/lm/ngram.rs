use std::collections::HashMap;

use super::LanguageModel;

pub type WordId = u32;

/// Stand-in id for words outside the vocabulary. Never present in the table.
const UNKNOWN_ID: WordId = WordId::MAX;

pub const BOS: &str = "<s>";
pub const EOS: &str = "</s>";
pub const UNK: &str = "<unk>";

/// Log-probability used for out-of-vocabulary words when the model has no
/// `<unk>` unigram of its own.
pub const DEFAULT_UNKNOWN_LOG_PROB: f64 = -10.0;

#[derive(Debug, thiserror::Error)]
pub enum NgramError {
    #[error("model order must be at least 1")]
    ZeroOrder,
    #[error("empty n-gram")]
    EmptyNgram,
    #[error("n-gram \"{ngram}\" is longer than the model order {order}")]
    TooLong { ngram: String, order: usize },
    #[error("n-gram \"{0}\" has a NaN weight")]
    NanWeight(String),
}

/// Trailing word history: at most `order - 1` word ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NgramState(Vec<WordId>);

impl NgramState {
    pub fn history(&self) -> &[WordId] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct NgramEntry {
    log_prob: f64,
    backoff: f64,
}

/// In-memory backoff n-gram language model.
///
/// Scoring looks up the longest n-gram ending in the new word that the model
/// knows, paying the backoff weight of every history it had to drop on the
/// way. Words the model has never seen score as `<unk>` and clear the history.
#[derive(Debug)]
pub struct NgramModel {
    order: usize,
    vocab: HashMap<String, WordId>,
    table: HashMap<Vec<WordId>, NgramEntry>,
    unknown_log_prob: f64,
}

impl NgramModel {
    pub fn builder(order: usize) -> NgramModelBuilder {
        NgramModelBuilder {
            order,
            entries: Vec::new(),
            unknown_log_prob: DEFAULT_UNKNOWN_LOG_PROB,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.vocab.get(word).copied()
    }

    fn id_or_unknown(&self, word: &str) -> WordId {
        self.word_id(word).unwrap_or(UNKNOWN_ID)
    }
}

impl LanguageModel for NgramModel {
    type State = NgramState;

    fn begin(&self) -> NgramState {
        match self.word_id(BOS) {
            Some(id) if self.order > 1 => NgramState(vec![id]),
            _ => NgramState::default(),
        }
    }

    fn score(&self, state: &NgramState, word: &str) -> (NgramState, f64) {
        let mut ngram = Vec::with_capacity(state.0.len() + 1);
        ngram.extend_from_slice(&state.0);
        ngram.push(self.id_or_unknown(word));

        let mut total = 0.0;
        let mut from = 0;
        while from < ngram.len() {
            let suffix = &ngram[from..];
            if let Some(entry) = self.table.get(suffix) {
                let keep = (self.order - 1).min(suffix.len());
                let history = suffix[suffix.len() - keep..].to_vec();
                return (NgramState(history), total + entry.log_prob);
            }
            if suffix.len() > 1 {
                let history = &suffix[..suffix.len() - 1];
                total += self.table.get(history).map_or(0.0, |e| e.backoff);
            }
            from += 1;
        }
        (NgramState::default(), total + self.unknown_log_prob)
    }

    fn end(&self, state: &NgramState) -> f64 {
        self.score(state, EOS).1
    }
}

/// Collects n-grams before assigning word ids.
pub struct NgramModelBuilder {
    order: usize,
    entries: Vec<(String, f64, f64)>,
    unknown_log_prob: f64,
}

impl NgramModelBuilder {
    /// Add a space-separated n-gram with its log-probability and backoff weight.
    pub fn ngram(mut self, words: &str, log_prob: f64, backoff: f64) -> Self {
        self.entries.push((words.to_string(), log_prob, backoff));
        self
    }

    /// Log-probability for out-of-vocabulary words, used when no `<unk>` unigram exists.
    pub fn unknown_log_prob(mut self, log_prob: f64) -> Self {
        self.unknown_log_prob = log_prob;
        self
    }

    pub fn build(self) -> Result<NgramModel, NgramError> {
        if self.order == 0 {
            return Err(NgramError::ZeroOrder);
        }
        let mut vocab: HashMap<String, WordId> = HashMap::new();
        let mut table = HashMap::with_capacity(self.entries.len());
        for (words, log_prob, backoff) in self.entries {
            if log_prob.is_nan() || backoff.is_nan() {
                return Err(NgramError::NanWeight(words));
            }
            let mut key = Vec::new();
            for word in words.split_whitespace() {
                let next_id = vocab.len() as WordId;
                key.push(*vocab.entry(word.to_string()).or_insert(next_id));
            }
            if key.is_empty() {
                return Err(NgramError::EmptyNgram);
            }
            if key.len() > self.order {
                return Err(NgramError::TooLong {
                    ngram: words,
                    order: self.order,
                });
            }
            table.insert(key, NgramEntry { log_prob, backoff });
        }

        let unknown_log_prob = vocab
            .get(UNK)
            .and_then(|&id| table.get(&vec![id]))
            .map_or(self.unknown_log_prob, |e| e.log_prob);

        Ok(NgramModel {
            order: self.order,
            vocab,
            table,
            unknown_log_prob,
        })
    }
}
