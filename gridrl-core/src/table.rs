//! Tabular value and preference storage.
use crate::{
    episode::Transition,
    error::GridRlError,
    explorer::{argmax_random_tie, check_legal, softmax},
    state::StateKey,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{hash_map::Iter, HashMap};

/// All records co-located for one state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    /// State value `V(s)`.
    pub value: f64,

    /// Per-action preferences (`theta`) or action values (`Q`).
    pub prefs: Vec<f64>,

    /// Visit counter used by averaging update rules.
    pub visits: u64,
}

impl StateEntry {
    /// All-zero entry.
    pub fn zeros(n_actions: usize) -> Self {
        Self {
            value: 0.0,
            prefs: vec![0.0; n_actions],
            visits: 0,
        }
    }
}

/// Initialization of freshly created entries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntryInit {
    /// All preferences start at zero.
    Zeros,

    /// Preferences drawn uniformly from `[-scale, scale]`.
    Uniform {
        /// Half-width of the interval.
        scale: f64,
    },
}

impl Default for EntryInit {
    fn default() -> Self {
        EntryInit::Zeros
    }
}

/// Mapping from [`StateKey`] to a [`StateEntry`], lazily populated.
///
/// Read accessors ([`StateTable::get`], [`StateTable::prefs`], ...) never
/// insert and return `None` for unvisited states; [`StateTable::ensure`] is
/// the only way entries come into existence.
pub struct StateTable {
    n_actions: usize,
    init: EntryInit,
    entries: HashMap<StateKey, StateEntry>,
    rng: SmallRng,
}

impl StateTable {
    /// Creates an empty table with all-zero initialization.
    pub fn new(n_actions: usize) -> Self {
        Self::with_init(n_actions, EntryInit::Zeros, 0)
    }

    /// Creates an empty table with the given initialization.
    pub fn with_init(n_actions: usize, init: EntryInit, seed: u64) -> Self {
        Self {
            n_actions,
            init,
            entries: HashMap::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Size of the action space.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Returns the entry of `key`, inserting a fresh one for an unseen state.
    pub fn ensure(&mut self, key: &StateKey) -> &mut StateEntry {
        let n_actions = self.n_actions;
        let init = self.init;
        let rng = &mut self.rng;
        self.entries
            .entry(key.clone())
            .or_insert_with(|| match init {
                EntryInit::Zeros => StateEntry::zeros(n_actions),
                EntryInit::Uniform { scale } => StateEntry {
                    value: 0.0,
                    prefs: (0..n_actions)
                        .map(|_| rng.gen_range(-scale..=scale))
                        .collect(),
                    visits: 0,
                },
            })
    }

    /// Entry of `key`, `None` if the state was never visited.
    pub fn get(&self, key: &StateKey) -> Option<&StateEntry> {
        self.entries.get(key)
    }

    /// Preferences of `key`, `None` if the state was never visited.
    pub fn prefs(&self, key: &StateKey) -> Option<&[f64]> {
        self.entries.get(key).map(|e| e.prefs.as_slice())
    }

    /// Value of `key`, `None` if the state was never visited.
    pub fn value(&self, key: &StateKey) -> Option<f64> {
        self.entries.get(key).map(|e| e.value)
    }

    /// Softmax policy at `key`; `None` signals an unvisited state.
    pub fn softmax_policy(
        &self,
        key: &StateKey,
        legal: &[usize],
        temperature: f64,
    ) -> Option<Vec<f64>> {
        self.prefs(key).map(|p| softmax(p, legal, temperature))
    }

    /// Greedy action at `key` with random tie-breaking.
    ///
    /// An unvisited state is treated as all-zero, so every legal action ties.
    pub fn greedy_action(
        &self,
        key: &StateKey,
        legal: &[usize],
        rng: &mut impl Rng,
    ) -> Option<usize> {
        match self.prefs(key) {
            Some(p) => argmax_random_tie(p, legal, rng),
            None => argmax_random_tie(&vec![0.0; self.n_actions], legal, rng),
        }
    }

    /// Checks that `act` is within the action space.
    pub fn check_action(&self, act: usize) -> Result<(), GridRlError> {
        if act < self.n_actions {
            Ok(())
        } else {
            Err(GridRlError::ActionOutOfRange {
                act,
                n_actions: self.n_actions,
            })
        }
    }

    /// Checks that every legal action is within the action space.
    pub fn check_legal(&self, legal: &[usize]) -> Result<(), GridRlError> {
        check_legal(legal, self.n_actions)
    }

    /// Checks the taken action and both legal action lists of `tr`.
    pub fn check_transition(&self, tr: &Transition) -> Result<(), GridRlError> {
        self.check_action(tr.act)?;
        self.check_legal(&tr.legal)?;
        self.check_legal(&tr.next_legal)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of visited states.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no state has been visited.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> Iter<'_, StateKey, StateEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lazy_initialization() {
        let mut table = StateTable::new(3);
        let s = StateKey::grid(0, 0);
        assert!(table.get(&s).is_none());
        assert!(table.softmax_policy(&s, &[0, 1], 1.0).is_none());
        assert!(table.is_empty());

        table.ensure(&s).prefs[1] = 2.0;
        assert_eq!(table.len(), 1);
        assert_eq!(table.prefs(&s), Some(&[0.0, 2.0, 0.0][..]));
        assert_eq!(table.value(&s), Some(0.0));

        // A second ensure does not reset the entry.
        assert_eq!(table.ensure(&s).prefs[1], 2.0);

        table.clear();
        assert!(table.get(&s).is_none());
    }

    #[test]
    fn test_uniform_init() {
        let mut table = StateTable::with_init(4, EntryInit::Uniform { scale: 0.1 }, 7);
        let prefs = table.ensure(&StateKey::grid(1, 1)).prefs.clone();
        assert_eq!(prefs.len(), 4);
        assert!(prefs.iter().all(|p| p.abs() <= 0.1));
        assert!(prefs.iter().any(|p| *p != 0.0));
    }

    #[test]
    fn test_check_action() {
        let table = StateTable::new(2);
        assert!(table.check_action(1).is_ok());
        assert_eq!(
            table.check_action(2),
            Err(GridRlError::ActionOutOfRange {
                act: 2,
                n_actions: 2
            })
        );
    }

    #[test]
    fn test_check_transition() {
        let table = StateTable::new(2);
        let mut tr = Transition {
            state: StateKey::grid(0, 0),
            legal: vec![0, 1],
            act: 1,
            reward: 0.0,
            next_state: StateKey::grid(1, 0),
            next_legal: vec![0, 1],
            is_terminal: false,
        };
        assert!(table.check_transition(&tr).is_ok());

        tr.legal = vec![0, 3];
        assert_eq!(
            table.check_transition(&tr),
            Err(GridRlError::ActionOutOfRange {
                act: 3,
                n_actions: 2
            })
        );

        tr.legal = vec![0, 1];
        tr.next_legal = vec![4];
        assert!(table.check_transition(&tr).is_err());
        assert!(table.check_legal(&[0, 1]).is_ok());
    }

    #[test]
    fn test_greedy_action() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut table = StateTable::new(3);
        let s = StateKey::grid(0, 0);
        table.ensure(&s).prefs = vec![0.0, -1.0, 4.0];
        assert_eq!(table.greedy_action(&s, &[0, 1, 2], &mut rng), Some(2));
        assert_eq!(table.greedy_action(&s, &[0, 1], &mut rng), Some(0));
        assert_eq!(table.greedy_action(&s, &[], &mut rng), None);
    }
}
