use std::time::Instant;

use tracing::{debug, debug_span};

use crate::lm::LanguageModel;
use crate::settings::SearchSettings;

use super::hypothesis::{Hypothesis, HypothesisArena};
use super::options::TranslationOptions;
use super::score::extend;
use super::stack::{InsertOutcome, StackSet};
use super::{DecodeError, SearchStats};

/// Everything the stack search leaves behind for extraction.
pub(crate) struct SearchOutput<S> {
    pub arena: HypothesisArena<S>,
    pub stacks: StackSet<S>,
    pub stats: SearchStats,
}

/// Expand stack groups in order of covered-word count.
///
/// Group `i` is pruned to the beam and every survivor is extended by every
/// legal option; children land in group `i + option length`. Groups only
/// ever feed later groups, so one pass over `0..sentence_len` is complete.
/// The deadline is checked between groups.
pub(crate) fn stack_search<L: LanguageModel + ?Sized>(
    lm: &L,
    options: &TranslationOptions,
    settings: &SearchSettings,
    deadline: Option<Instant>,
) -> Result<SearchOutput<L::State>, DecodeError> {
    let sentence_len = options.sentence_len();
    let _span = debug_span!("stack_search", sentence_len, option_count = options.len()).entered();
    let started = Instant::now();

    let mut arena = HypothesisArena::new();
    let mut stacks = StackSet::new(sentence_len);
    let mut stats = SearchStats::default();

    stacks.insert(0, &mut arena, Hypothesis::root(sentence_len, lm.begin()));

    for i in 0..sentence_len {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!(group = i, "deadline reached");
            return Err(DecodeError::TimedOut {
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        let group = stacks.group(i);
        if group.is_empty() {
            continue;
        }
        let survivors = group.survivors(&arena, settings.beam_size);
        let pruned = group.len() - survivors.len();
        stats.pruned += pruned;
        debug!(group = i, size = group.len(), survivors = survivors.len(), pruned);

        for id in survivors {
            let parent = &arena[id];
            let legal: Vec<usize> = options
                .extensions(&parent.coverage, parent.frontier(), settings.distortion_limit)
                .collect();
            stats.expanded += 1;

            for option_idx in legal {
                let option = &options[option_idx];
                let child = extend(
                    lm,
                    &arena[id],
                    id,
                    option,
                    option_idx,
                    settings.distortion_weight,
                );
                match stacks.insert(i + option.len(), &mut arena, child) {
                    InsertOutcome::Inserted(_) => stats.created += 1,
                    InsertOutcome::Replaced { .. } => {
                        stats.created += 1;
                        stats.recombined += 1;
                    }
                    InsertOutcome::Discarded => stats.discarded += 1,
                }
            }
        }
    }

    stats.group_sizes = stacks.sizes();
    debug!(
        created = stats.created,
        recombined = stats.recombined,
        discarded = stats.discarded,
        pruned = stats.pruned,
        arena_size = arena.len()
    );
    Ok(SearchOutput {
        arena,
        stacks,
        stats,
    })
}
