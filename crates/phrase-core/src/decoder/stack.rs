use std::collections::HashMap;
use std::hash::Hash;

use crate::settings::BeamSize;

use super::hypothesis::{HypId, Hypothesis, HypothesisArena, RecombinationKey};

/// What happened to a hypothesis offered to a stack group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    /// First hypothesis with its recombination key.
    Inserted(HypId),
    /// Beat the incumbent with the same key, which is no longer reachable from the group.
    Replaced { new: HypId, old: HypId },
    /// An incumbent with the same key scored at least as well. Nothing was stored.
    Discarded,
}

/// Hypotheses covering the same number of source words.
///
/// `index` maps each recombination key to a slot; `slots` remembers the order
/// in which keys first arrived. A replacement takes over its predecessor's slot.
pub(crate) struct StackGroup<S> {
    index: HashMap<RecombinationKey<S>, usize>,
    slots: Vec<HypId>,
}

impl<S: Clone + Eq + Hash> StackGroup<S> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Hypothesis ids in first-arrival order of their keys.
    pub fn ids(&self) -> &[HypId] {
        &self.slots
    }

    /// Recombine `hyp` into the group. Ties favor the incumbent.
    ///
    /// The arena only grows for hypotheses that are kept.
    pub fn insert(&mut self, arena: &mut HypothesisArena<S>, hyp: Hypothesis<S>) -> InsertOutcome {
        let key = hyp.recombination_key();
        match self.index.get(&key) {
            Some(&slot) => {
                let old = self.slots[slot];
                if arena[old].score >= hyp.score {
                    return InsertOutcome::Discarded;
                }
                let new = arena.push(hyp);
                self.slots[slot] = new;
                InsertOutcome::Replaced { new, old }
            }
            None => {
                let id = arena.push(hyp);
                self.index.insert(key, self.slots.len());
                self.slots.push(id);
                InsertOutcome::Inserted(id)
            }
        }
    }

    /// The hypotheses that get expanded: best `beam` by score, ties in slot order.
    pub fn survivors(&self, arena: &HypothesisArena<S>, beam: BeamSize) -> Vec<HypId> {
        let mut ids = self.slots.clone();
        // sort_by is stable, so equal scores keep arrival order
        ids.sort_by(|&a, &b| arena[b].score.total_cmp(&arena[a].score));
        if let Some(limit) = beam.limit() {
            ids.truncate(limit);
        }
        ids
    }

    /// Highest-scoring hypothesis; the first one seen wins a tie.
    pub fn best(&self, arena: &HypothesisArena<S>) -> Option<HypId> {
        let mut best: Option<HypId> = None;
        for &id in &self.slots {
            match best {
                Some(b) if arena[b].score >= arena[id].score => {}
                _ => best = Some(id),
            }
        }
        best
    }
}

/// One group per number of covered source words, `0..=sentence_len`.
pub(crate) struct StackSet<S> {
    groups: Vec<StackGroup<S>>,
}

impl<S: Clone + Eq + Hash> StackSet<S> {
    pub fn new(sentence_len: usize) -> Self {
        Self {
            groups: (0..=sentence_len).map(|_| StackGroup::new()).collect(),
        }
    }

    /// Insert into group `index`, which must equal the hypothesis's coverage size.
    pub fn insert(
        &mut self,
        index: usize,
        arena: &mut HypothesisArena<S>,
        hyp: Hypothesis<S>,
    ) -> InsertOutcome {
        debug_assert_eq!(
            hyp.coverage.count(),
            index,
            "hypothesis placed in the wrong stack group"
        );
        self.groups[index].insert(arena, hyp)
    }

    pub fn group(&self, index: usize) -> &StackGroup<S> {
        &self.groups[index]
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(StackGroup::len).collect()
    }

    /// Best hypothesis of the highest non-empty group, with that group's index.
    pub fn deepest_best(&self, arena: &HypothesisArena<S>) -> Option<(usize, HypId)> {
        self.groups
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, g)| g.best(arena).map(|id| (i, id)))
    }
}
