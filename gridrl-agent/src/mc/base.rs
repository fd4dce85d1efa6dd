//! Monte-Carlo prediction of state values.
use super::McConfig;
use crate::util::uniform_action;
use gridrl_core::{
    record::{Record, RecordValue},
    Agent, Configurable, EpisodeBuffer, ExperienceBufferBase, Policy, StateKey, StateTable,
    Transition,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};
use std::collections::HashSet;

/// Monte-Carlo prediction under a uniformly random behaviour policy.
///
/// At the end of each episode the transitions are scanned newest-first while
/// accumulating the discounted return `G <- gamma * G + r`. Each state is
/// updated once per episode, at its first occurrence in the backward scan
/// (that is, its last visit in forward time), with the running average
/// `V(s) <- V(s) + (G - V(s)) / N(s)`.
pub struct Mc {
    table: StateTable,
    buffer: EpisodeBuffer,
    gamma: f64,
    rng: SmallRng,
    train: bool,
}

impl Mc {
    /// Learned values.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Value of `key`, `None` if the state was never updated.
    pub fn value(&self, key: &StateKey) -> Option<f64> {
        self.table.value(key)
    }

    /// Applies the last-visit update for one episode, given oldest-first.
    ///
    /// Returns the number of updated states.
    pub fn update(&mut self, episode: &[Transition]) -> usize {
        let mut seen = HashSet::new();
        let mut g = 0.0;

        for tr in episode.iter().rev() {
            g = self.gamma * g + tr.reward;
            if !seen.insert(tr.state.clone()) {
                continue;
            }
            let entry = self.table.ensure(&tr.state);
            entry.visits += 1;
            entry.value += (g - entry.value) / entry.visits as f64;
        }

        seen.len()
    }
}

impl Policy for Mc {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        if let Err(e) = self.table.check_legal(legal) {
            warn!("No action selected at {}: {}", state, e);
            return None;
        }
        uniform_action(legal, &mut self.rng)
    }
}

impl Configurable for Mc {
    type Config = McConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            table: StateTable::new(config.n_actions),
            buffer: EpisodeBuffer::new(),
            gamma: config.gamma,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
        }
    }
}

impl Agent for Mc {
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
        if self.train {
            if let Err(e) = self.buffer.push(tr) {
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
        let n = self.update(&episode);
        Record::from_slice(&[("n_updated_states", RecordValue::Scalar(n as f64))])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tr(s: StateKey, reward: f64, next_state: StateKey) -> Transition {
        Transition {
            state: s,
            legal: vec![0, 1],
            act: 0,
            reward,
            next_state,
            next_legal: vec![0, 1],
            is_terminal: false,
        }
    }

    #[test]
    fn test_two_step_episode() {
        let (s0, s1, s2) = (
            StateKey::grid(0, 0),
            StateKey::grid(1, 0),
            StateKey::grid(2, 0),
        );
        let mut mc = Mc::build(McConfig::default().gamma(0.9));
        mc.observe(tr(s0.clone(), 1.0, s1.clone()));
        mc.observe(tr(s1.clone(), 1.0, s2));
        mc.end_episode();

        assert_eq!(mc.value(&s1), Some(1.0));
        assert_eq!(mc.value(&s0), Some(1.9));
    }

    #[test]
    fn test_last_visit_only() {
        let (a, b) = (StateKey::grid(0, 0), StateKey::grid(1, 0));
        let mut mc = Mc::build(McConfig::default().gamma(1.0));
        // a -> b -> a -> end, rewards 1, 2, 3.
        let episode = vec![
            tr(a.clone(), 1.0, b.clone()),
            tr(b.clone(), 2.0, a.clone()),
            tr(a.clone(), 3.0, b.clone()),
        ];
        assert_eq!(mc.update(&episode), 2);

        // Only the later visit of `a` (return 3) counts, not the earlier (6).
        assert_eq!(mc.value(&a), Some(3.0));
        assert_eq!(mc.value(&b), Some(5.0));
        assert_eq!(mc.table().get(&a).map(|e| e.visits), Some(1));
    }

    #[test]
    fn test_running_average() {
        let s = StateKey::grid(0, 0);
        let mut mc = Mc::build(McConfig::default().gamma(1.0));
        mc.update(&[tr(s.clone(), 2.0, s.clone())]);
        mc.update(&[tr(s.clone(), 4.0, s.clone())]);
        assert_eq!(mc.value(&s), Some(3.0));
    }

    #[test]
    fn test_eval_mode_does_not_learn() {
        let s = StateKey::grid(0, 0);
        let mut mc = Mc::build(McConfig::default());
        mc.eval();
        mc.observe(tr(s.clone(), 1.0, s.clone()));
        mc.end_episode();
        assert_eq!(mc.value(&s), None);
    }
}
