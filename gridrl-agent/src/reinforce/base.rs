//! REINFORCE agent.
use super::ReinforceConfig;
use crate::util::{prefs_or_zeros, softmax_grad_step};
use gridrl_core::{
    explorer::{sample_categorical, softmax},
    record::{Record, RecordValue},
    Agent, Configurable, EpisodeBuffer, ExperienceBufferBase, Policy, StateKey, StateTable,
    Transition,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};

/// Monte-Carlo policy gradient on softmax preferences.
///
/// At the end of an episode, for `t` from the first step on,
/// `theta[s_t][a] += alpha * gamma^t * G_t * (1[a = a_t] - pi(a|s_t))` for every
/// legal `a`. With a baseline, `G_t` is replaced by `G_t - V(s_t)` and
/// `V(s_t) += alpha_v * (G_t - V(s_t))`.
pub struct Reinforce {
    table: StateTable,
    buffer: EpisodeBuffer,
    alpha: f64,
    alpha_v: f64,
    gamma: f64,
    temperature: f64,
    baseline: bool,
    rng: SmallRng,
    train: bool,
}

impl Reinforce {
    /// Preferences and baseline values.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Current policy at `key`, `None` for an unvisited state.
    pub fn policy(&self, key: &StateKey, legal: &[usize]) -> Option<Vec<f64>> {
        self.table.softmax_policy(key, legal, self.temperature)
    }

    /// Discounted returns `G_t`, oldest first.
    fn returns(&self, episode: &[Transition]) -> Vec<f64> {
        let mut g = 0.0;
        let mut rs: Vec<f64> = episode
            .iter()
            .rev()
            .map(|tr| {
                g = self.gamma * g + tr.reward;
                g
            })
            .collect();
        rs.reverse();
        rs
    }

    /// Applies the policy-gradient update for one episode, given oldest-first.
    ///
    /// Returns the mean of the (baselined) returns used as step scale.
    pub fn update(&mut self, episode: &[Transition]) -> f64 {
        let returns = self.returns(episode);
        let mut discount = 1.0;
        let mut sum_adv = 0.0;

        for (tr, g) in episode.iter().zip(returns.into_iter()) {
            let temperature = self.temperature;
            let entry = self.table.ensure(&tr.state);
            let adv = if self.baseline {
                let adv = g - entry.value;
                entry.value += self.alpha_v * adv;
                adv
            } else {
                g
            };
            let probs = softmax(&entry.prefs, &tr.legal, temperature);
            softmax_grad_step(
                &mut entry.prefs,
                &probs,
                &tr.legal,
                tr.act,
                self.alpha * discount * adv,
            );
            discount *= self.gamma;
            sum_adv += adv;
        }

        sum_adv / episode.len().max(1) as f64
    }
}

impl Policy for Reinforce {
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

impl Configurable for Reinforce {
    type Config = ReinforceConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            table: StateTable::with_init(config.n_actions, config.init, config.seed),
            buffer: EpisodeBuffer::new(),
            alpha: config.alpha,
            alpha_v: config.alpha_v,
            gamma: config.gamma,
            temperature: config.temperature,
            baseline: config.baseline,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
        }
    }
}

impl Agent for Reinforce {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
        self.buffer.clear();
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, tr: Transition) -> Record {
        if self.train {
            if let Err(e) = self.table.check_transition(&tr) {
                warn!("Skip transition: {}", e);
            } else if let Err(e) = self.buffer.push(tr) {
                warn!("Failed to store a transition: {}", e);
            }
        }
        Record::empty()
    }

    fn end_episode(&mut self) -> Record {
        let episode = self.buffer.drain();
        if episode.is_empty() {
            return Record::empty();
        }
        let adv = self.update(&episode);
        Record::from_slice(&[("mean_advantage", RecordValue::Scalar(adv))])
    }
}
