//! Phrase-based translation via stack decoding.
//!
//! Collects every translation option for the sentence, then runs a beam
//! search over stack groups keyed by the number of covered source words,
//! recombining hypotheses that no future step can tell apart. The best
//! full-coverage hypothesis is walked back to the root to produce the output.

pub mod explain;
mod hypothesis;
mod options;
mod score;
mod search;
mod stack;
pub(crate) mod testutil;

#[cfg(test)]
mod tests;

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::lm::LanguageModel;
use crate::phrase_table::PhraseTable;
use crate::settings::SearchSettings;

use hypothesis::{HypId, HypothesisArena, ROOT};
use options::{collect_options, TranslationOptions};
use search::stack_search;

pub use explain::{explain, ExplainOption, ExplainResult};

/// The decoder's answer for one sentence.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    /// Target phrases in output order, joined by single spaces.
    pub text: String,
    pub score: f64,
    pub phrases: Vec<TranslatedPhrase>,
    pub breakdown: ScoreBreakdown,
    pub stats: SearchStats,
}

/// One phrase of a translation, in output order.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedPhrase {
    /// Start position in the source (token index, inclusive)
    pub source_start: usize,
    /// End position in the source (token index, exclusive)
    pub source_end: usize,
    pub source: String,
    pub target: String,
    pub translation: f64,
    pub language_model: f64,
    pub distortion: f64,
}

/// Total score split by model component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub translation: f64,
    pub language_model: f64,
    pub distortion: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.translation + self.language_model + self.distortion
    }
}

/// Search effort counters for one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Hypotheses that were extended (beam survivors).
    pub expanded: usize,
    /// Hypotheses stored in a stack group.
    pub created: usize,
    /// Stored hypotheses that displaced a worse one with the same recombination key.
    pub recombined: usize,
    /// Candidates dropped because a same-key hypothesis scored at least as well.
    pub discarded: usize,
    /// Hypotheses cut by the beam before expansion.
    pub pruned: usize,
    /// Final size of each stack group, `0..=sentence_len`.
    pub group_sizes: Vec<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// No combination of options covers the whole sentence. `partial` is the
    /// best hypothesis of the deepest group that was reached.
    #[error("no translation covers all {len} source words (deepest reachable: {deepest})")]
    NoCoveragePath {
        len: usize,
        deepest: usize,
        partial: Box<Translation>,
    },
    #[error("decode abandoned after {elapsed_ms} ms")]
    TimedOut { elapsed_ms: u64 },
    #[error("empty source token at position {position}")]
    EmptyToken { position: usize },
    #[error("malformed translation option for \"{phrase}\": {reason}")]
    MalformedOption { phrase: String, reason: String },
}

/// Translate one tokenized sentence.
///
/// `table` and `lm` are only read, so any number of sentences may be decoded
/// concurrently against the same models. An empty sentence translates to an
/// empty string with score 0.
pub fn decode<L, S>(
    table: &dyn PhraseTable,
    lm: &L,
    source: &[S],
    settings: &SearchSettings,
) -> Result<Translation, DecodeError>
where
    L: LanguageModel + ?Sized,
    S: AsRef<str>,
{
    decode_with_deadline(table, lm, source, settings, None)
}

/// [`decode`] that gives up with [`DecodeError::TimedOut`] once `deadline`
/// passes. The deadline is checked between stack groups.
pub fn decode_with_deadline<L, S>(
    table: &dyn PhraseTable,
    lm: &L,
    source: &[S],
    settings: &SearchSettings,
    deadline: Option<Instant>,
) -> Result<Translation, DecodeError>
where
    L: LanguageModel + ?Sized,
    S: AsRef<str>,
{
    let _span = debug_span!("decode", len = source.len()).entered();
    let options = collect_options(table, source, settings.max_candidates_per_span)?;
    translate(lm, &options, settings, deadline)
}

fn translate<L: LanguageModel + ?Sized>(
    lm: &L,
    options: &TranslationOptions,
    settings: &SearchSettings,
    deadline: Option<Instant>,
) -> Result<Translation, DecodeError> {
    let output = stack_search(lm, options, settings, deadline)?;
    let len = options.sentence_len();

    if let Some(winner) = output.stacks.group(len).best(&output.arena) {
        let translation = extract(&output.arena, options, winner, output.stats);
        debug!(score = translation.score, text = %translation.text);
        return Ok(translation);
    }

    let (deepest, best) = output.stacks.deepest_best(&output.arena).unwrap_or((0, ROOT));
    debug!(len, deepest, "no full-coverage hypothesis");
    Err(DecodeError::NoCoveragePath {
        len,
        deepest,
        partial: Box::new(extract(&output.arena, options, best, output.stats)),
    })
}

/// Walk back from `id` to the root and assemble the output.
fn extract<S>(
    arena: &HypothesisArena<S>,
    options: &TranslationOptions,
    id: HypId,
    stats: SearchStats,
) -> Translation {
    let mut breakdown = ScoreBreakdown::default();
    let phrases: Vec<TranslatedPhrase> = arena
        .backtrace(id)
        .into_iter()
        .filter_map(|hyp| hyp.phrase)
        .map(|step| {
            let option = &options[step.option];
            breakdown.translation += step.translation;
            breakdown.language_model += step.language_model;
            breakdown.distortion += step.distortion;
            TranslatedPhrase {
                source_start: option.start,
                source_end: option.end,
                source: option.source.clone(),
                target: option.target.clone(),
                translation: step.translation,
                language_model: step.language_model,
                distortion: step.distortion,
            }
        })
        .collect();

    let text = phrases
        .iter()
        .map(|p| p.target.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Translation {
        text,
        score: arena[id].score,
        phrases,
        breakdown,
        stats,
    }
}
