//! Interaction of an agent with an environment, one step at a time.
use crate::{
    episode::Transition,
    error::GridRlError,
    record::{Record, RecordValue},
    state::StateKey,
    Agent, Env,
};
use anyhow::Result;
use log::warn;

/// Runs an [`Agent`] on an [`Env`] and reports every transition to the agent.
///
/// The sampler keeps the current state between calls and resets the
/// environment lazily at the start of each episode.
pub struct Sampler<E: Env> {
    env: E,
    prev_state: Option<StateKey>,
    episode_steps: usize,
    episode_return: f64,
    max_steps: usize,
}

impl<E: Env> Sampler<E> {
    /// Creates a sampler truncating episodes after `max_steps` steps.
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            prev_state: None,
            episode_steps: 0,
            episode_return: 0.0,
            max_steps,
        }
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Performs one environment step and lets the agent observe it.
    ///
    /// The second element of the return value is `true` when the episode has
    /// ended; the record then contains `episode_return` and `episode_length`.
    /// A state without legal actions, or an agent that cannot select an
    /// action, ends the episode without a transition.
    pub fn sample_and_observe<A: Agent>(&mut self, agent: &mut A) -> Result<(Record, bool)> {
        let state = match self.prev_state.take() {
            Some(s) => s,
            None => {
                self.episode_steps = 0;
                self.episode_return = 0.0;
                self.env.reset()?
            }
        };

        let legal = self.env.legal_actions(&state);
        if legal.is_empty() {
            warn!("No legal action at {}, ending the episode", state);
            return Ok((self.finish(), true));
        }
        let act = match agent.sample(&state, &legal) {
            Some(act) => act,
            None => {
                warn!("{} at {}, ending the episode", GridRlError::NoSelectableAction, state);
                return Ok((self.finish(), true));
            }
        };

        let (step, mut record) = self.env.step(act);
        self.episode_steps += 1;
        self.episode_return += step.reward;

        let is_truncated = step.is_truncated || self.episode_steps >= self.max_steps;
        let next_legal = if step.is_terminated {
            vec![]
        } else {
            self.env.legal_actions(&step.next_state)
        };
        let done = step.is_terminated || is_truncated;
        let next_state = step.next_state.clone();

        let tr = Transition {
            state,
            legal,
            act,
            reward: step.reward,
            next_state: step.next_state,
            next_legal,
            is_terminal: step.is_terminated,
        };
        record.merge_inplace(agent.observe(tr));

        if done {
            record.merge_inplace(self.finish());
        } else {
            self.prev_state = Some(next_state);
        }
        Ok((record, done))
    }

    fn finish(&mut self) -> Record {
        self.prev_state = None;
        Record::from_slice(&[
            ("episode_return", RecordValue::Scalar(self.episode_return)),
            (
                "episode_length",
                RecordValue::Scalar(self.episode_steps as f64),
            ),
        ])
    }
}
