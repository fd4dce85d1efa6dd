//! Q-learning agent.
use super::QLearningConfig;
use crate::util::prefs_or_zeros;
use gridrl_core::{
    record::{Record, RecordValue},
    Agent, Configurable, Explorer, Policy, StateKey, StateTable, Transition,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};

/// One-step off-policy TD control.
///
/// The target is `r` for a terminal transition and `r + gamma * max_a' Q(s', a')`
/// over the legal actions at `s'` otherwise. In two-player mode the bootstrapped
/// target is negated, `-(r + gamma * max_a' Q(s', a'))`, since `s'` is evaluated
/// from the opponent's side of a shared table.
pub struct QLearning {
    table: StateTable,
    explorer: Explorer,
    alpha: f64,
    gamma: f64,
    two_player: bool,
    rng: SmallRng,
    train: bool,
}

impl QLearning {
    /// Learned action values.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// `Q(s, a)`, `None` if `s` was never updated.
    pub fn q_value(&self, key: &StateKey, act: usize) -> Option<f64> {
        self.table.prefs(key).and_then(|q| q.get(act).copied())
    }

    /// Greedy action at `key` with random tie-breaking.
    pub fn greedy_action(&mut self, key: &StateKey, legal: &[usize]) -> Option<usize> {
        self.table.greedy_action(key, legal, &mut self.rng)
    }

    fn max_q(&self, key: &StateKey, legal: &[usize]) -> Option<f64> {
        let q = self.table.prefs(key)?;
        legal
            .iter()
            .filter_map(|a| q.get(*a).copied())
            .fold(None, |m: Option<f64>, v| Some(m.map_or(v, |m| m.max(v))))
    }

    /// Applies the update for one transition and returns the TD error.
    pub fn update(&mut self, tr: &Transition) -> f64 {
        let target = if tr.is_terminal || tr.next_legal.is_empty() {
            tr.reward
        } else {
            // An unvisited successor has all-zero values.
            let max_q = self.max_q(&tr.next_state, &tr.next_legal).unwrap_or(0.0);
            let target = tr.reward + self.gamma * max_q;
            if self.two_player {
                -target
            } else {
                target
            }
        };
        let q = &mut self.table.ensure(&tr.state).prefs[tr.act];
        let td_error = target - *q;
        *q += self.alpha * td_error;
        td_error
    }
}

impl Policy for QLearning {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        if let Err(e) = self.table.check_legal(legal) {
            warn!("No action selected at {}: {}", state, e);
            return None;
        }
        let q = prefs_or_zeros(&self.table, state);
        self.explorer.action(&q, legal, self.train, &mut self.rng)
    }
}

impl Configurable for QLearning {
    type Config = QLearningConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            table: StateTable::with_init(config.n_actions, config.init, config.seed),
            explorer: config.explorer,
            alpha: config.alpha,
            gamma: config.gamma,
            two_player: config.two_player,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
        }
    }
}

impl Agent for QLearning {
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
            warn!("Skip Q-learning update: {}", e);
            return Record::empty();
        }
        let td_error = self.update(&tr);
        Record::from_slice(&[("td_error", RecordValue::Scalar(td_error))])
    }

    fn end_episode(&mut self) -> Record {
        Record::empty()
    }
}
