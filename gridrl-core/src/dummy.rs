//! A corridor environment used in tests.
//!
//! States are cells `0..length` of a one-dimensional corridor, the agent
//! starts at cell 0 and the last cell is the terminal goal. Action
//! [`LEFT`] moves one cell towards the start (bumping into the wall at cell 0),
//! [`RIGHT`] moves towards the goal. Entering the goal yields reward 1, every
//! other transition yields 0.
use crate::{record::Record, state::StateKey, Env, Step};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Action moving towards the start.
pub const LEFT: usize = 0;

/// Action moving towards the goal.
pub const RIGHT: usize = 1;

/// Configuration of [`Corridor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorridorConfig {
    /// The number of cells, goal included.
    pub length: i64,

    /// Reward for entering the goal.
    pub goal_reward: f64,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            length: 4,
            goal_reward: 1.0,
        }
    }
}

/// Corridor `[S, A, B, ..., Goal]`.
pub struct Corridor {
    config: CorridorConfig,
    pos: i64,
}

impl Corridor {
    /// Key of cell `x`.
    pub fn key(x: i64) -> StateKey {
        StateKey::grid(x, 0)
    }

    fn goal(&self) -> i64 {
        self.config.length - 1
    }
}

impl Env for Corridor {
    type Config = CorridorConfig;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            pos: 0,
        })
    }

    fn reset(&mut self) -> Result<StateKey> {
        self.pos = 0;
        Ok(Self::key(self.pos))
    }

    fn state(&self) -> StateKey {
        Self::key(self.pos)
    }

    fn legal_actions(&self, state: &StateKey) -> Vec<usize> {
        if self.is_terminal(state) {
            vec![]
        } else {
            vec![LEFT, RIGHT]
        }
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn step(&mut self, act: usize) -> (Step, Record) {
        self.pos = match act {
            LEFT => (self.pos - 1).max(0),
            _ => (self.pos + 1).min(self.goal()),
        };
        let is_terminated = self.pos == self.goal();
        let reward = if is_terminated {
            self.config.goal_reward
        } else {
            0.0
        };
        (
            Step::new(act, Self::key(self.pos), reward, is_terminated),
            Record::empty(),
        )
    }

    fn is_terminal(&self, state: &StateKey) -> bool {
        state.components().first() == Some(&self.goal())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_corridor_dynamics() -> Result<()> {
        let mut env = Corridor::build(&CorridorConfig::default(), 0)?;
        let s = env.reset()?;
        assert_eq!(env.legal_actions(&s), vec![LEFT, RIGHT]);

        let (step, _) = env.step(LEFT);
        assert_eq!(step.next_state, Corridor::key(0));

        for _ in 0..2 {
            let (step, _) = env.step(RIGHT);
            assert!(!step.is_done());
            assert_eq!(step.reward, 0.0);
        }
        let (step, _) = env.step(RIGHT);
        assert!(step.is_terminated);
        assert_eq!(step.reward, 1.0);
        assert!(env.legal_actions(&env.state()).is_empty());
        Ok(())
    }
}
