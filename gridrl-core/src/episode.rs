//! Experience records accumulated during an episode.
use crate::state::StateKey;
use anyhow::Result;

/// One transition `(s, a, r, s')` together with what the learner needs to
/// bootstrap from `s'`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// State in which the action was taken.
    pub state: StateKey,

    /// Legal actions at `state`.
    pub legal: Vec<usize>,

    /// Action taken.
    pub act: usize,

    /// Reward received for the transition.
    pub reward: f64,

    /// Successor state.
    pub next_state: StateKey,

    /// Legal actions at the successor state.
    pub next_legal: Vec<usize>,

    /// Whether the successor state is terminal.
    pub is_terminal: bool,
}

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered sequence of transitions of the current episode.
///
/// The buffer is created empty at the start of an episode and drained by the
/// learning rule at its end, so it never carries data across episodes.
#[derive(Default, Debug)]
pub struct EpisodeBuffer {
    items: Vec<Transition>,
}

impl EpisodeBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Takes all transitions out of the buffer, oldest first.
    ///
    /// The result is an indexable sequence, so rules that scan newest-first
    /// iterate it in reverse instead of mutating the buffer while scanning.
    pub fn drain(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.items)
    }

    /// Transitions of the episode so far, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.items.iter()
    }

    /// Discards all transitions.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of rewards in the buffer.
    pub fn total_reward(&self) -> f64 {
        self.items.iter().map(|t| t.reward).sum()
    }
}

impl ExperienceBufferBase for EpisodeBuffer {
    type Item = Transition;

    fn push(&mut self, tr: Transition) -> Result<()> {
        self.items.push(tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
