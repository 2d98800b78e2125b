use std::ops::Index;

use tracing::{debug, debug_span};

use crate::coverage::Coverage;
use crate::phrase_table::{span_text, PhraseTable};

use super::DecodeError;

/// One way to translate one source span.
#[derive(Debug, Clone)]
pub(crate) struct PhraseOption {
    /// Start position (token index, inclusive)
    pub start: usize,
    /// End position (token index, exclusive)
    pub end: usize,
    pub source: String,
    pub target: String,
    pub log_prob: f64,
}

impl PhraseOption {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Every phrase-table candidate for every span of one sentence.
///
/// Collected once per sentence so the search never touches the phrase
/// table: expansions only filter these by coverage and distortion.
pub(crate) struct TranslationOptions {
    sentence_len: usize,
    options: Vec<PhraseOption>,
    /// by_start[i] = option indices whose span starts at i, shorter spans first
    by_start: Vec<Vec<usize>>,
}

impl TranslationOptions {
    pub fn sentence_len(&self) -> usize {
        self.sentence_len
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhraseOption> {
        self.options.iter()
    }

    /// Legal continuations of a hypothesis with the given coverage and
    /// frontier (rightmost translated index + 1).
    ///
    /// A start position too far from the frontier is skipped, not treated as
    /// the end of the scan: with gaps to the left of the frontier, a later
    /// start can be closer than an earlier one.
    pub fn extensions<'a>(
        &'a self,
        coverage: &'a Coverage,
        frontier: usize,
        distortion_limit: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        (0..self.sentence_len)
            .filter(move |&start| {
                !coverage.is_covered(start) && frontier.abs_diff(start) <= distortion_limit
            })
            .flat_map(move |start| self.by_start[start].iter().copied())
            .filter(move |&idx| {
                let option = &self.options[idx];
                coverage.is_span_free(option.start, option.end)
            })
    }
}

impl Index<usize> for TranslationOptions {
    type Output = PhraseOption;

    fn index(&self, idx: usize) -> &PhraseOption {
        &self.options[idx]
    }
}

/// Look up every contiguous span of `source` in the phrase table.
///
/// At most `max_candidates` candidates are kept per span, in the table's
/// order. Empty tokens, empty target text and NaN log-probabilities are
/// rejected before any search happens.
pub(crate) fn collect_options<S: AsRef<str>>(
    table: &dyn PhraseTable,
    source: &[S],
    max_candidates: usize,
) -> Result<TranslationOptions, DecodeError> {
    let sentence_len = source.len();
    let _span = debug_span!("collect_options", sentence_len).entered();

    if let Some(position) = source.iter().position(|t| t.as_ref().trim().is_empty()) {
        return Err(DecodeError::EmptyToken { position });
    }

    let mut options = Vec::new();
    let mut by_start: Vec<Vec<usize>> = vec![Vec::new(); sentence_len];

    for start in 0..sentence_len {
        for end in start + 1..=sentence_len {
            let text = span_text(&source[start..end]);
            for candidate in table.lookup(&text).iter().take(max_candidates) {
                if candidate.text.trim().is_empty() {
                    return Err(DecodeError::MalformedOption {
                        phrase: text,
                        reason: "empty target text".to_string(),
                    });
                }
                if candidate.log_prob.is_nan() {
                    return Err(DecodeError::MalformedOption {
                        phrase: text,
                        reason: format!("NaN log-probability for \"{}\"", candidate.text),
                    });
                }
                by_start[start].push(options.len());
                options.push(PhraseOption {
                    start,
                    end,
                    source: text.clone(),
                    target: candidate.text.clone(),
                    log_prob: candidate.log_prob,
                });
            }
        }
    }

    debug!(option_count = options.len());
    Ok(TranslationOptions {
        sentence_len,
        options,
        by_start,
    })
}
