//! Default implementation of the [`Evaluator`] trait.
//!
//! This module provides a simple evaluator that runs a fixed number of episodes
//! and calculates the average return across all episodes.
use super::Evaluator;
use crate::{error::GridRlError, record::Record, Env, Policy};
use anyhow::Result;
use log::warn;

/// Runs a fixed number of episodes and reports the average return as
/// `eval_return`.
///
/// # Examples
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<Corridor>::new(&CorridorConfig::default(), 42, 10, 100)?;
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("Average return: {}", record.get_scalar("eval_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Episodes are cut after this many steps.
    max_steps: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy>(&mut self, policy: &mut P) -> Result<Record> {
        let mut r_total = 0.0;

        for ix in 0..self.n_episodes {
            let mut prev_state = self.env.reset_with_index(ix)?;

            for _ in 0..self.max_steps {
                let legal = self.env.legal_actions(&prev_state);
                let act = match policy.sample(&prev_state, &legal) {
                    Some(act) => act,
                    None => {
                        warn!(
                            "{} at {} during evaluation",
                            GridRlError::NoSelectableAction,
                            prev_state
                        );
                        break;
                    }
                };
                let (step, _) = self.env.step(act);
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_state = step.next_state;
            }
        }

        let n = self.n_episodes.max(1) as f64;
        Ok(Record::from_scalar("eval_return", r_total / n))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize, max_steps: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dummy::{Corridor, CorridorConfig, RIGHT},
        state::StateKey,
    };

    struct AlwaysRight;

    impl Policy for AlwaysRight {
        fn sample(&mut self, _state: &StateKey, legal: &[usize]) -> Option<usize> {
            legal.iter().copied().find(|a| *a == RIGHT)
        }
    }

    #[test]
    fn test_eval_return() -> Result<()> {
        let config = CorridorConfig::default();
        let mut evaluator = DefaultEvaluator::<Corridor>::new(&config, 0, 3, 10)?;
        let record = evaluator.evaluate(&mut AlwaysRight)?;
        assert_eq!(record.get_scalar("eval_return")?, 1.0);
        Ok(())
    }
}
