use crate::lm::LanguageModel;

use super::hypothesis::{HypId, Hypothesis, PhraseStep};
use super::options::PhraseOption;

/// Positions jumped between the end of the previous phrase and `start`.
pub(crate) fn distortion(frontier: usize, start: usize) -> usize {
    frontier.abs_diff(start)
}

/// Score `option` on top of `parent` and build the resulting child.
///
/// child = parent + translation + language model + distortion. The language
/// model term includes the end-of-sentence score when the child covers the
/// whole sentence.
pub(crate) fn extend<L: LanguageModel + ?Sized>(
    lm: &L,
    parent: &Hypothesis<L::State>,
    parent_id: HypId,
    option: &PhraseOption,
    option_idx: usize,
    distortion_weight: f64,
) -> Hypothesis<L::State> {
    let coverage = parent.coverage.with_span(option.start, option.end);
    let (lm_state, mut language_model) = lm.score_phrase(&parent.lm_state, &option.target);
    if coverage.is_full() {
        language_model += lm.end(&lm_state);
    }
    let distortion = distortion_weight * distortion(parent.frontier(), option.start) as f64;

    Hypothesis {
        score: parent.score + option.log_prob + language_model + distortion,
        coverage,
        lm_state,
        right_edge: Some(option.end - 1),
        parent: Some(parent_id),
        phrase: Some(PhraseStep {
            option: option_idx,
            translation: option.log_prob,
            language_model,
            distortion,
        }),
    }
}
