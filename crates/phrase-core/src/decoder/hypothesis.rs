use std::ops::Index;

use crate::coverage::Coverage;

/// Index of a hypothesis in its sentence's arena.
pub(crate) type HypId = usize;

/// The root is always the first hypothesis pushed.
pub(crate) const ROOT: HypId = 0;

/// Contributions of the phrase a hypothesis added on top of its parent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PhraseStep {
    /// Index into the sentence's translation options.
    pub option: usize,
    pub translation: f64,
    /// Includes the end-of-sentence term when this step completed coverage.
    pub language_model: f64,
    pub distortion: f64,
}

/// A node in the search tree. Fields are fixed once the node is in the arena.
#[derive(Debug, Clone)]
pub(crate) struct Hypothesis<S> {
    pub score: f64,
    pub coverage: Coverage,
    pub lm_state: S,
    /// Rightmost source index translated by the last phrase; `None` for the root.
    pub right_edge: Option<usize>,
    pub parent: Option<HypId>,
    pub phrase: Option<PhraseStep>,
}

impl<S: Clone> Hypothesis<S> {
    pub fn root(sentence_len: usize, lm_state: S) -> Self {
        Self {
            score: 0.0,
            coverage: Coverage::empty(sentence_len),
            lm_state,
            right_edge: None,
            parent: None,
            phrase: None,
        }
    }

    /// Source position right after the last translated phrase.
    pub fn frontier(&self) -> usize {
        self.right_edge.map_or(0, |r| r + 1)
    }

    pub fn recombination_key(&self) -> RecombinationKey<S> {
        RecombinationKey {
            lm_state: self.lm_state.clone(),
            coverage: self.coverage.clone(),
            right_edge: self.right_edge,
        }
    }
}

/// Everything future scoring depends on. Hypotheses with equal keys differ
/// only in the score they have accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecombinationKey<S> {
    pub lm_state: S,
    pub coverage: Coverage,
    pub right_edge: Option<usize>,
}

/// Append-only hypothesis storage; parents are referenced by index.
pub(crate) struct HypothesisArena<S> {
    nodes: Vec<Hypothesis<S>>,
}

impl<S> HypothesisArena<S> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, hyp: Hypothesis<S>) -> HypId {
        self.nodes.push(hyp);
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Non-root hypotheses on the path from the root to `id`, root side first.
    pub fn backtrace(&self, id: HypId) -> Vec<&Hypothesis<S>> {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(idx) = cur {
            let hyp = &self.nodes[idx];
            if hyp.phrase.is_some() {
                path.push(hyp);
            }
            cur = hyp.parent;
        }
        path.reverse();
        path
    }
}

impl<S> Index<HypId> for HypothesisArena<S> {
    type Output = Hypothesis<S>;

    fn index(&self, id: HypId) -> &Hypothesis<S> {
        &self.nodes[id]
    }
}
