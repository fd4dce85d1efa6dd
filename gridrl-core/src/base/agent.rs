//! Agent.
use super::Policy;
use crate::{episode::Transition, record::Record};

/// Represents a trainable policy on an environment.
///
/// Step-wise rules update their tables in [`Agent::observe`]; episodic rules
/// buffer the transitions there and update in [`Agent::end_episode`].
pub trait Agent: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Reports the outcome of the last sampled action.
    fn observe(&mut self, tr: Transition) -> Record;

    /// Signals the end of an episode.
    fn end_episode(&mut self) -> Record;
}
