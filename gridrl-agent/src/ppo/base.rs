//! PPO agent.
use super::PpoConfig;
use crate::util::prefs_or_zeros;
use gridrl_core::{
    explorer::{sample_categorical, softmax},
    record::{Record, RecordValue},
    Agent, Configurable, Policy, StateKey, StateTable, Transition,
};
use log::{trace, warn};
use rand::{rngs::SmallRng, SeedableRng};

/// A buffered step of [`Ppo`].
#[derive(Clone, Debug, PartialEq)]
pub struct PpoStep {
    /// State.
    pub state: StateKey,

    /// Legal actions at `state`.
    pub legal: Vec<usize>,

    /// Action taken.
    pub act: usize,

    /// One-step TD error of the critic.
    pub advantage: f64,

    /// Probability of `act` when it was taken.
    pub old_prob: f64,
}

/// PPO with a clipped probability ratio.
///
/// Every step buffers `(state, act, advantage, old_prob)`, where the advantage
/// is the critic's one-step TD error (the critic is updated immediately). When
/// `horizon` steps are buffered, or the episode ends, the buffer is replayed
/// newest-first and each preference of a taken action moves by
/// `alpha * min(rho * A, clip(rho, 1 - eps, 1 + eps) * A)` with
/// `rho = pi_new(a) / pi_old(a)`. States whose current policy is
/// deterministic (any probability above `deterministic_bound`) are skipped.
pub struct Ppo {
    table: StateTable,
    buffer: Vec<PpoStep>,
    alpha: f64,
    alpha_v: f64,
    gamma: f64,
    clip_eps: f64,
    horizon: usize,
    temperature: f64,
    deterministic_bound: f64,
    rng: SmallRng,
    train: bool,
}

impl Ppo {
    /// Preferences and state values.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Current policy at `key`, `None` for an unvisited state.
    pub fn policy(&self, key: &StateKey, legal: &[usize]) -> Option<Vec<f64>> {
        self.table.softmax_policy(key, legal, self.temperature)
    }

    /// The number of buffered steps.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clipped surrogate step for ratio `rho` and advantage `adv`.
    pub fn clipped_step(&self, rho: f64, adv: f64) -> f64 {
        let clipped = rho.max(1.0 - self.clip_eps).min(1.0 + self.clip_eps);
        self.alpha * (rho * adv).min(clipped * adv)
    }

    /// Updates the critic and buffers the step; returns the advantage.
    pub fn push(&mut self, tr: &Transition) -> f64 {
        let v_next = if tr.is_terminal {
            0.0
        } else {
            self.table.value(&tr.next_state).unwrap_or(0.0)
        };
        let temperature = self.temperature;
        let entry = self.table.ensure(&tr.state);
        let advantage = tr.reward + self.gamma * v_next - entry.value;
        entry.value += self.alpha_v * advantage;
        let old_prob = softmax(&entry.prefs, &tr.legal, temperature)[tr.act];

        self.buffer.push(PpoStep {
            state: tr.state.clone(),
            legal: tr.legal.clone(),
            act: tr.act,
            advantage,
            old_prob,
        });
        advantage
    }

    /// Replays the buffer newest-first and empties it.
    ///
    /// Returns the number of applied preference updates.
    pub fn flush(&mut self) -> usize {
        let steps = std::mem::take(&mut self.buffer);
        let mut n_updates = 0;

        for step in steps.iter().rev() {
            if step.old_prob <= 0.0 {
                continue;
            }
            let probs = softmax(
                &prefs_or_zeros(&self.table, &step.state),
                &step.legal,
                self.temperature,
            );
            if probs.iter().any(|p| *p > self.deterministic_bound) {
                trace!("Skip deterministic policy at {}", step.state);
                continue;
            }
            let rho = probs[step.act] / step.old_prob;
            let delta = self.clipped_step(rho, step.advantage);
            self.table.ensure(&step.state).prefs[step.act] += delta;
            n_updates += 1;
        }

        n_updates
    }
}

impl Policy for Ppo {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        if let Err(e) = self.table.check_legal(legal) {
            warn!("No action selected at {}: {}", state, e);
            return None;
        }
        let prefs = prefs_or_zeros(&self.table, state);
        let probs = softmax(&prefs, legal, self.temperature);
        sample_categorical(&probs, &mut self.rng)
    }
}

impl Configurable for Ppo {
    type Config = PpoConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            table: StateTable::with_init(config.n_actions, config.init, config.seed),
            buffer: Vec::with_capacity(config.horizon),
            alpha: config.alpha,
            alpha_v: config.alpha_v,
            gamma: config.gamma,
            clip_eps: config.clip_eps,
            horizon: config.horizon.max(1),
            temperature: config.temperature,
            deterministic_bound: config.deterministic_bound,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
        }
    }
}

impl Agent for Ppo {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, tr: Transition) -> Record {
        if !self.train {
            return Record::empty();
        }
        if let Err(e) = self.table.check_transition(&tr) {
            warn!("Skip PPO step: {}", e);
            return Record::empty();
        }
        let mut record = Record::from_scalar("advantage", self.push(&tr));
        if self.buffer.len() >= self.horizon {
            let n = self.flush();
            record.insert("n_policy_updates", RecordValue::Scalar(n as f64));
        }
        record
    }

    fn end_episode(&mut self) -> Record {
        if self.buffer.is_empty() {
            return Record::empty();
        }
        let n = self.flush();
        Record::from_scalar("n_policy_updates", n as f64)
    }
}
