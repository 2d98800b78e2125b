//! Multi-sentence decoding on a scoped worker pool.
//!
//! Sentences are independent: workers pull the next index from a shared
//! counter, decode against the shared read-only models, and send results
//! back over a channel. Results are returned in input order.

use std::io;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use phrase_core::settings::{BatchSettings, FailurePolicy, Settings};
use phrase_core::{decode_with_deadline, DecodeError, LanguageModel, PhraseTable, Translation};
use tracing::{debug, debug_span, warn};

/// Outcome for one sentence of a batch.
#[derive(Debug)]
pub struct SentenceResult {
    /// Position of the sentence in the input.
    pub index: usize,
    pub outcome: Result<Translation, DecodeError>,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to spawn decode worker: {0}")]
    Spawn(#[from] io::Error),
    #[error("no result was produced for sentence {0}")]
    MissingResult(usize),
}

pub struct BatchDecoder<'a, L: ?Sized> {
    table: &'a dyn PhraseTable,
    lm: &'a L,
    settings: Settings,
}

impl<'a, L: LanguageModel + ?Sized> BatchDecoder<'a, L> {
    pub fn new(table: &'a dyn PhraseTable, lm: &'a L, settings: Settings) -> Self {
        Self {
            table,
            lm,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decode every sentence. A failed sentence is reported in its slot and
    /// does not affect the others.
    pub fn decode_all<S>(&self, sentences: &[Vec<S>]) -> Result<Vec<SentenceResult>, BatchError>
    where
        S: AsRef<str> + Sync,
    {
        let workers = self.worker_count(sentences.len());
        let _span = debug_span!("decode_all", sentences = sentences.len(), workers).entered();

        if workers <= 1 {
            return Ok(sentences
                .iter()
                .enumerate()
                .map(|(index, sentence)| self.decode_one(index, sentence))
                .collect());
        }

        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<SentenceResult>();
        thread::scope(|scope| -> Result<(), BatchError> {
            for worker in 0..workers {
                let tx = tx.clone();
                let next = &next;
                thread::Builder::new()
                    .name(format!("phrase-decode-{worker}"))
                    .spawn_scoped(scope, move || loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(sentence) = sentences.get(index) else {
                            break;
                        };
                        if tx.send(self.decode_one(index, sentence)).is_err() {
                            break;
                        }
                    })?;
            }
            Ok(())
        })?;
        drop(tx);

        let mut slots: Vec<Option<SentenceResult>> = (0..sentences.len()).map(|_| None).collect();
        for result in rx {
            let index = result.index;
            slots[index] = Some(result);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(BatchError::MissingResult(index)))
            .collect()
    }

    /// Decode every sentence and render each as a line of text, applying
    /// the configured failure policy to sentences without a translation.
    pub fn translate_all<S>(&self, sentences: &[Vec<S>]) -> Result<Vec<String>, BatchError>
    where
        S: AsRef<str> + Sync,
    {
        let batch = &self.settings.batch;
        Ok(self
            .decode_all(sentences)?
            .into_iter()
            .map(|result| render(result.outcome, batch))
            .collect())
    }

    fn worker_count(&self, sentences: usize) -> usize {
        let configured = match self.settings.batch.workers {
            0 => thread::available_parallelism().map_or(1, NonZeroUsize::get),
            n => n,
        };
        configured.min(sentences).max(1)
    }

    fn decode_one<S: AsRef<str>>(&self, index: usize, sentence: &[S]) -> SentenceResult {
        let deadline = match self.settings.batch.timeout_ms {
            0 => None,
            ms => Instant::now().checked_add(Duration::from_millis(ms)),
        };
        let outcome = decode_with_deadline(
            self.table,
            self.lm,
            sentence,
            &self.settings.search,
            deadline,
        );
        match &outcome {
            Ok(t) => debug!(sentence = index, score = t.score),
            Err(e) => warn!(sentence = index, error = %e, "sentence not translated"),
        }
        SentenceResult { index, outcome }
    }
}

/// Output line for one sentence. Only a missing coverage path carries a
/// partial translation; other failures render as empty under `partial`.
fn render(outcome: Result<Translation, DecodeError>, batch: &BatchSettings) -> String {
    match (outcome, batch.on_failure) {
        (Ok(translation), _) => translation.text,
        (Err(_), FailurePolicy::Marker) => batch.failure_marker.clone(),
        (Err(DecodeError::NoCoveragePath { partial, .. }), FailurePolicy::Partial) => partial.text,
        (Err(_), _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_core::settings::defaults;
    use phrase_core::{decode, MemoryPhraseTable, NgramModel};
    use proptest::prelude::*;

    fn table() -> MemoryPhraseTable {
        MemoryPhraseTable::from_entries(
            10,
            vec![
                ("le", "the", -0.1),
                ("chat", "cat", -0.2),
                ("noir", "black", -0.3),
                ("chat noir", "black cat", -0.15),
            ],
        )
        .unwrap()
    }

    fn lm() -> NgramModel {
        NgramModel::builder(2)
            .ngram("<s>", -99.0, -0.5)
            .ngram("</s>", -1.0, 0.0)
            .ngram("the", -1.0, -0.5)
            .ngram("cat", -1.0, -0.5)
            .ngram("black", -1.0, -0.5)
            .ngram("<s> the", -0.2, 0.0)
            .ngram("the black", -0.3, 0.0)
            .ngram("black cat", -0.3, 0.0)
            .ngram("cat </s>", -0.3, 0.0)
            .build()
            .unwrap()
    }

    fn sentences(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn settings(workers: usize, on_failure: FailurePolicy) -> Settings {
        let mut settings = defaults().clone();
        settings.batch.workers = workers;
        settings.batch.on_failure = on_failure;
        settings
    }

    #[test]
    fn test_results_keep_input_order() {
        let (table, lm) = (table(), lm());
        let input = sentences(&[
            "le chat",
            "chat noir",
            "le",
            "noir",
            "le chat noir",
            "chat",
            "le noir",
        ]);
        let batch = BatchDecoder::new(&table, &lm, settings(3, FailurePolicy::Empty));
        let results = batch.decode_all(&input).unwrap();

        assert_eq!(results.len(), input.len());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
            let alone = decode(&table, &lm, &input[i], &batch.settings().search).unwrap();
            assert_eq!(result.outcome.as_ref().unwrap().text, alone.text);
        }
    }

    #[test]
    fn test_failed_sentence_does_not_stop_batch() {
        let (table, lm) = (table(), lm());
        let input = sentences(&["le chat", "le xyz", "noir"]);
        let batch = BatchDecoder::new(&table, &lm, settings(2, FailurePolicy::Empty));
        let results = batch.decode_all(&input).unwrap();

        assert!(results[0].outcome.is_ok());
        assert!(matches!(
            results[1].outcome,
            Err(DecodeError::NoCoveragePath { .. })
        ));
        assert_eq!(results[2].outcome.as_ref().unwrap().text, "black");
    }

    #[test]
    fn test_failure_policies() {
        let (table, lm) = (table(), lm());
        let input = sentences(&["le xyz", "le"]);
        let cases = [
            (FailurePolicy::Empty, ""),
            (FailurePolicy::Partial, "the"),
            (FailurePolicy::Marker, "<untranslatable>"),
        ];
        for (policy, expected) in cases {
            let batch = BatchDecoder::new(&table, &lm, settings(2, policy));
            let lines = batch.translate_all(&input).unwrap();
            assert_eq!(lines, vec![expected.to_string(), "the".to_string()], "{policy:?}");
        }
    }

    #[test]
    fn test_malformed_sentence_renders_empty_under_partial() {
        let (table, lm) = (table(), lm());
        let input = vec![vec!["le".to_string(), String::new()]];
        let batch = BatchDecoder::new(&table, &lm, settings(1, FailurePolicy::Partial));
        assert_eq!(batch.translate_all(&input).unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_empty_batch() {
        let (table, lm) = (table(), lm());
        let batch = BatchDecoder::new(&table, &lm, settings(4, FailurePolicy::Empty));
        let none: Vec<Vec<String>> = Vec::new();
        assert!(batch.decode_all(&none).unwrap().is_empty());
    }

    #[test]
    fn test_worker_count_clamped() {
        let (table, lm) = (table(), lm());
        let batch = BatchDecoder::new(&table, &lm, settings(8, FailurePolicy::Empty));
        assert_eq!(batch.worker_count(3), 3);
        assert_eq!(batch.worker_count(0), 1);
        let auto = BatchDecoder::new(&table, &lm, settings(0, FailurePolicy::Empty));
        assert!(auto.worker_count(100) >= 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn worker_count_does_not_change_output(
            input in prop::collection::vec(
                prop::collection::vec(prop::sample::select(vec!["le", "chat", "noir"]), 1..=4),
                0..10,
            ),
            workers in 1usize..=4,
        ) {
            let (table, lm) = (table(), lm());
            let sequential = BatchDecoder::new(&table, &lm, settings(1, FailurePolicy::Partial));
            let pooled = BatchDecoder::new(&table, &lm, settings(workers, FailurePolicy::Partial));
            prop_assert_eq!(
                sequential.translate_all(&input).unwrap(),
                pooled.translate_all(&input).unwrap()
            );
        }
    }
}
