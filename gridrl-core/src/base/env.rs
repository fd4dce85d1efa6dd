//! Environment.
use super::Step;
use crate::{record::Record, state::StateKey};
use anyhow::Result;

/// The host side of the interaction: a world that reports discrete states,
/// legal actions and rewards, and executes actions.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial state.
    fn reset(&mut self) -> Result<StateKey>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, e.g. as a random seed during
    /// evaluation. Defaults to [`Env::reset`].
    fn reset_with_index(&mut self, _ix: usize) -> Result<StateKey> {
        self.reset()
    }

    /// Current state.
    fn state(&self) -> StateKey;

    /// Actions valid at `state`.
    ///
    /// Empty only for a state without legal moves, which callers must not
    /// confuse with an unknown state.
    fn legal_actions(&self, state: &StateKey) -> Vec<usize>;

    /// Size of the action space, constant for a run.
    fn n_actions(&self) -> usize;

    /// Executes an action.
    fn step(&mut self, act: usize) -> (Step, Record);

    /// Terminal-state predicate.
    fn is_terminal(&self, state: &StateKey) -> bool;
}
