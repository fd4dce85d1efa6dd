//! Environment step.
use crate::state::StateKey;

/// Represents an action, next state and reward tuple `(a_t, s_t+1, r_t)`.
///
/// An environment emits a [`Step`] object at every interaction step.
/// The trainer turns it into a [`Transition`](crate::Transition) for the agent.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Action.
    pub act: usize,

    /// State after the action.
    pub next_state: StateKey,

    /// Reward.
    pub reward: f64,

    /// Flag denoting if the episode reached a terminal state.
    pub is_terminated: bool,

    /// Flag denoting if the episode was cut off without reaching a terminal state.
    pub is_truncated: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(act: usize, next_state: StateKey, reward: f64, is_terminated: bool) -> Self {
        Step {
            act,
            next_state,
            reward,
            is_terminated,
            is_truncated: false,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
