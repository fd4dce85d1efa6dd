//! Policy reading the shared preferences.
use crate::SharedParameterStore;
use gridrl_core::{
    explorer::{argmax_random_tie, check_legal, sample_categorical, softmax},
    Policy, StateKey,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::Arc;

/// Softmax policy over the preferences in a [`SharedParameterStore`].
///
/// Unvisited states are treated as all-zero preferences. With `greedy` set,
/// the action with the highest preference is taken instead.
pub struct A3cPolicy {
    store: Arc<SharedParameterStore>,
    temperature: f64,
    greedy: bool,
    rng: SmallRng,
}

impl A3cPolicy {
    /// Creates the policy.
    pub fn new(store: Arc<SharedParameterStore>, temperature: f64, seed: u64) -> Self {
        Self {
            store,
            temperature,
            greedy: false,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Switches between sampling and greedy selection.
    pub fn greedy(mut self, v: bool) -> Self {
        self.greedy = v;
        self
    }
}

impl Policy for A3cPolicy {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        if let Err(e) = check_legal(legal, self.store.n_actions()) {
            warn!("No action selected at {}: {}", state, e);
            return None;
        }
        let prefs = self
            .store
            .prefs(state)
            .unwrap_or_else(|| vec![0.0; self.store.n_actions()]);
        if self.greedy {
            argmax_random_tie(&prefs, legal, &mut self.rng)
        } else {
            let probs = softmax(&prefs, legal, self.temperature);
            sample_categorical(&probs, &mut self.rng)
        }
    }
}
