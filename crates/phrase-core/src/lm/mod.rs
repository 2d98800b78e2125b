//! Language model port.
//!
//! The decoder only needs three operations from an n-gram scorer: an initial
//! context, a single-word scoring step, and an end-of-sentence term. The
//! context type is opaque to the decoder but must be hashable, because it is
//! part of the recombination key.

mod ngram;

use std::fmt::Debug;
use std::hash::Hash;

pub use ngram::{NgramError, NgramModel, NgramModelBuilder, NgramState, WordId};

pub trait LanguageModel: Send + Sync {
    /// Scoring context carried by each hypothesis.
    type State: Clone + Eq + Hash + Debug;

    /// Context before any target word has been produced.
    fn begin(&self) -> Self::State;

    /// Feed one target word. Returns the new context and the word's log-probability.
    fn score(&self, state: &Self::State, word: &str) -> (Self::State, f64);

    /// Log-probability of ending the sentence in `state`.
    fn end(&self, state: &Self::State) -> f64;

    /// Score a whitespace-separated phrase word by word.
    fn score_phrase(&self, state: &Self::State, phrase: &str) -> (Self::State, f64) {
        let mut state = state.clone();
        let mut total = 0.0;
        for word in phrase.split_whitespace() {
            let (next, log_prob) = self.score(&state, word);
            state = next;
            total += log_prob;
        }
        (state, total)
    }
}
