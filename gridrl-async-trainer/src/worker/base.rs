use crate::{A3cConfig, ParameterDeltas, SharedParameterStore, WorkerStat};
use anyhow::Result;
use gridrl_agent::util::softmax_grad_step;
use gridrl_core::{
    explorer::{check_legal, sample_categorical, softmax},
    Env, StateKey,
};
use log::{trace, warn};
use rand::{rngs::SmallRng, SeedableRng};
use std::{mem, sync::Arc, time::Instant};

/// One step of a rollout.
struct RolloutStep {
    state: StateKey,
    legal: Vec<usize>,
    act: usize,
    reward: f64,
    probs: Vec<f64>,
    value: f64,
}

/// n-step returns `R_t = r_t + gamma * R_{t+1}` seeded with `bootstrap`.
pub fn n_step_returns(rewards: &[f64], bootstrap: f64, gamma: f64) -> Vec<f64> {
    let mut r = bootstrap;
    let mut rs: Vec<f64> = rewards
        .iter()
        .rev()
        .map(|reward| {
            r = reward + gamma * r;
            r
        })
        .collect();
    rs.reverse();
    rs
}

/// Runs rollouts on its own environment and accumulates parameter deltas.
///
/// One unit of work ([`A3cWorker::run_unit`]) first writes the deltas of the
/// previous unit into the [`SharedParameterStore`], then rolls out at most
/// `n_steps` steps, continuing the current episode, and computes new deltas
/// from n-step returns. The new deltas stay local until the next unit.
pub struct A3cWorker<E: Env> {
    id: usize,
    env: E,
    store: Arc<SharedParameterStore>,
    pending: ParameterDeltas,
    state: Option<StateKey>,
    n_steps: usize,
    gamma: f64,
    alpha_theta: f64,
    alpha_v: f64,
    temperature: f64,
    rng: SmallRng,
    episode_return: f64,
    stat: WorkerStat,
}

impl<E: Env> A3cWorker<E> {
    /// Builds a worker with its own environment.
    pub fn build(
        id: usize,
        config: &A3cConfig,
        env_config: &E::Config,
        store: Arc<SharedParameterStore>,
    ) -> Result<Self> {
        let seed = config.seed + id as u64;
        Ok(Self {
            id,
            env: E::build(env_config, seed as i64)?,
            store,
            pending: ParameterDeltas::default(),
            state: None,
            n_steps: config.n_steps.max(1),
            gamma: config.gamma,
            alpha_theta: config.alpha_theta,
            alpha_v: config.alpha_v,
            temperature: config.temperature,
            rng: SmallRng::seed_from_u64(seed),
            episode_return: 0.0,
            stat: WorkerStat {
                id,
                ..WorkerStat::default()
            },
        })
    }

    /// Worker id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Stats so far.
    pub fn stat(&self) -> WorkerStat {
        self.stat.clone()
    }

    /// Deltas computed in the last unit, not yet written to the store.
    pub fn pending(&self) -> &ParameterDeltas {
        &self.pending
    }

    /// Writes the pending deltas into the shared store.
    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            let deltas = mem::take(&mut self.pending);
            trace!("Worker {} flushes {} states", self.id, deltas.len());
            self.store.apply(&deltas);
        }
    }

    /// Performs one unit of work.
    pub fn run_unit(&mut self) -> Result<()> {
        let start = Instant::now();
        self.flush();

        let mut state = match self.state.take() {
            Some(s) => s,
            None => {
                self.episode_return = 0.0;
                self.env.reset()?
            }
        };
        let mut steps = Vec::with_capacity(self.n_steps);
        let mut episode_end = false;
        let mut terminal = false;

        for _ in 0..self.n_steps {
            let legal = self.env.legal_actions(&state);
            if legal.is_empty() {
                warn!("Worker {}: no legal action at {}", self.id, state);
                episode_end = true;
                terminal = true;
                break;
            }
            if let Err(e) = check_legal(&legal, self.store.n_actions()) {
                warn!("Worker {}: invalid legal actions at {}: {}", self.id, state, e);
                episode_end = true;
                terminal = true;
                break;
            }
            let entry = self.store.read_or_register(&state);
            let probs = softmax(&entry.prefs, &legal, self.temperature);
            let act = match sample_categorical(&probs, &mut self.rng) {
                Some(act) => act,
                None => {
                    warn!("Worker {}: no selectable action at {}", self.id, state);
                    episode_end = true;
                    terminal = true;
                    break;
                }
            };

            let (step, _) = self.env.step(act);
            self.stat.env_steps += 1;
            self.episode_return += step.reward;
            steps.push(RolloutStep {
                state,
                legal,
                act,
                reward: step.reward,
                probs,
                value: entry.value,
            });
            let done = step.is_done();
            let is_terminated = step.is_terminated;
            state = step.next_state;

            if done {
                episode_end = true;
                terminal = is_terminated;
                break;
            }
        }

        let bootstrap = if terminal {
            0.0
        } else {
            self.store.read_or_register(&state).value
        };
        self.accumulate(&steps, bootstrap);

        if episode_end {
            self.stat.episodes += 1;
            self.stat.last_return = Some(self.episode_return);
            self.state = None;
        } else {
            self.state = Some(state);
        }
        self.stat.units += 1;
        self.stat.duration += start.elapsed();
        Ok(())
    }

    fn accumulate(&mut self, steps: &[RolloutStep], bootstrap: f64) {
        let rewards: Vec<f64> = steps.iter().map(|s| s.reward).collect();
        let returns = n_step_returns(&rewards, bootstrap, self.gamma);
        let n_actions = self.store.n_actions();

        for (step, r) in steps.iter().zip(returns.into_iter()) {
            let adv = r - step.value;
            self.pending.add_value(&step.state, self.alpha_v * adv);
            let d = self.pending.theta_mut(&step.state, n_actions);
            softmax_grad_step(d, &step.probs, &step.legal, step.act, self.alpha_theta * adv);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gridrl_core::{record::Record, Step};

    /// Every action ends the episode with reward 1. The config is the list of
    /// legal actions.
    struct OneShot {
        legal: Vec<usize>,
    }

    impl Env for OneShot {
        type Config = Vec<usize>;

        fn build(config: &Vec<usize>, _seed: i64) -> Result<Self> {
            Ok(OneShot {
                legal: config.clone(),
            })
        }

        fn reset(&mut self) -> Result<StateKey> {
            Ok(StateKey::grid(0, 0))
        }

        fn state(&self) -> StateKey {
            StateKey::grid(0, 0)
        }

        fn legal_actions(&self, _state: &StateKey) -> Vec<usize> {
            self.legal.clone()
        }

        fn n_actions(&self) -> usize {
            2
        }

        fn step(&mut self, act: usize) -> (Step, Record) {
            (Step::new(act, StateKey::grid(1, 0), 1.0, true), Record::empty())
        }

        fn is_terminal(&self, state: &StateKey) -> bool {
            state == &StateKey::grid(1, 0)
        }
    }

    #[test]
    fn test_n_step_returns() {
        assert_eq!(n_step_returns(&[1.0, 0.0, 2.0], 4.0, 0.5), vec![2.0, 2.0, 4.0]);
        assert!(n_step_returns(&[], 1.0, 0.5).is_empty());
    }

    #[test]
    fn test_deltas_are_written_at_the_next_unit() -> Result<()> {
        let config = A3cConfig::default()
            .n_actions(2)
            .alpha_v(0.5)
            .alpha_theta(1.0);
        let store = Arc::new(SharedParameterStore::new(2, 0, 0));
        let mut worker = A3cWorker::<OneShot>::build(0, &config, &vec![0, 1], store.clone())?;
        let s = StateKey::grid(0, 0);

        worker.run_unit()?;
        assert_eq!(store.value(&s), Some(0.0));
        assert!(!worker.pending().is_empty());

        worker.run_unit()?;
        // R = 1, V = 0 at the first unit.
        assert_eq!(store.value(&s), Some(0.5));
        let prefs = store.prefs(&s).unwrap();
        assert!((prefs[0] + prefs[1]).abs() < 1e-12);
        assert!((prefs[0].abs() - 0.5).abs() < 1e-12);

        let stat = worker.stat();
        assert_eq!(stat.units, 2);
        assert_eq!(stat.episodes, 2);
        assert_eq!(stat.env_steps, 2);
        assert_eq!(stat.last_return, Some(1.0));
        Ok(())
    }

    #[test]
    fn test_out_of_range_legal_action_ends_episode() -> Result<()> {
        let config = A3cConfig::default().n_actions(2);
        let store = Arc::new(SharedParameterStore::new(2, 0, 0));
        let mut worker = A3cWorker::<OneShot>::build(0, &config, &vec![0, 5], store.clone())?;

        worker.run_unit()?;
        let stat = worker.stat();
        assert_eq!(stat.env_steps, 0);
        assert_eq!(stat.episodes, 1);
        assert!(worker.pending().is_empty());
        Ok(())
    }
}
