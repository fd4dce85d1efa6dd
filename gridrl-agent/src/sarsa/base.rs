//! SARSA agent.
use super::SarsaConfig;
use crate::util::prefs_or_zeros;
use gridrl_core::{
    record::{Record, RecordValue},
    Agent, Configurable, Explorer, Policy, StateKey, StateTable, Transition,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};

/// One-step on-policy TD control.
///
/// When observing `(s, a, r, s')` the agent already selects the next action
/// `a'` at `s'`, bootstraps from `Q(s', a')` and commits to `a'`: the next call
/// to [`Policy::sample`] at `s'` returns it.
pub struct Sarsa {
    table: StateTable,
    explorer: Explorer,
    alpha: f64,
    gamma: f64,
    rng: SmallRng,
    train: bool,
    next_act: Option<(StateKey, usize)>,
}

impl Sarsa {
    /// Learned action values.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// `Q(s, a)`, `None` if `s` was never updated.
    pub fn q_value(&self, key: &StateKey, act: usize) -> Option<f64> {
        self.table.prefs(key).and_then(|q| q.get(act).copied())
    }

    fn select(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        let q = prefs_or_zeros(&self.table, state);
        self.explorer.action(&q, legal, self.train, &mut self.rng)
    }

    /// Moves `Q(s, a)` towards `r` (terminal) or `r + gamma * Q(s', a')`.
    ///
    /// Returns the TD error.
    pub fn update(&mut self, tr: &Transition, next_act: Option<usize>) -> f64 {
        let target = match (tr.is_terminal, next_act) {
            (false, Some(a_)) => {
                let q_next = self
                    .table
                    .prefs(&tr.next_state)
                    .map_or(0.0, |q| q[a_]);
                tr.reward + self.gamma * q_next
            }
            _ => tr.reward,
        };
        let q = &mut self.table.ensure(&tr.state).prefs[tr.act];
        let td_error = target - *q;
        *q += self.alpha * td_error;
        td_error
    }
}

impl Policy for Sarsa {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        if let Err(e) = self.table.check_legal(legal) {
            warn!("No action selected at {}: {}", state, e);
            return None;
        }
        match self.next_act.take() {
            Some((s, a)) if &s == state && legal.contains(&a) => Some(a),
            _ => self.select(state, legal),
        }
    }
}

impl Configurable for Sarsa {
    type Config = SarsaConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            table: StateTable::with_init(config.n_actions, config.init, config.seed),
            explorer: config.explorer,
            alpha: config.alpha,
            gamma: config.gamma,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
            next_act: None,
        }
    }
}

impl Agent for Sarsa {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
        self.next_act = None;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe(&mut self, tr: Transition) -> Record {
        if !self.train {
            return Record::empty();
        }
        if let Err(e) = self.table.check_transition(&tr) {
            warn!("Skip SARSA update: {}", e);
            return Record::empty();
        }

        let next_act = if tr.is_terminal {
            None
        } else {
            self.select(&tr.next_state, &tr.next_legal)
        };
        let td_error = self.update(&tr, next_act);
        self.next_act = next_act.map(|a| (tr.next_state, a));

        Record::from_slice(&[("td_error", RecordValue::Scalar(td_error))])
    }

    fn end_episode(&mut self) -> Record {
        self.next_act = None;
        Record::empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gridrl_core::explorer::EpsilonGreedy;

    fn tr(is_terminal: bool, reward: f64) -> Transition {
        Transition {
            state: StateKey::grid(0, 0),
            legal: vec![0, 1],
            act: 1,
            reward,
            next_state: StateKey::grid(1, 0),
            next_legal: vec![0, 1],
            is_terminal,
        }
    }

    #[test]
    fn test_terminal_update_ignores_successor() {
        let mut agent = Sarsa::build(SarsaConfig::default().n_actions(2).alpha(0.5));
        agent.table.ensure(&StateKey::grid(0, 0)).prefs[1] = 0.2;
        agent.table.ensure(&StateKey::grid(1, 0)).prefs = vec![10.0, 10.0];

        let td = agent.update(&tr(true, 1.0), Some(0));
        assert!((td - 0.8).abs() < 1e-12);
        assert_eq!(agent.q_value(&StateKey::grid(0, 0), 1), Some(0.2 + 0.5 * 0.8));
    }

    #[test]
    fn test_bootstrap_from_selected_action() {
        let mut agent = Sarsa::build(SarsaConfig::default().n_actions(2).alpha(1.0).gamma(0.5));
        agent.table.ensure(&StateKey::grid(1, 0)).prefs = vec![2.0, 8.0];

        agent.update(&tr(false, 1.0), Some(0));
        assert_eq!(agent.q_value(&StateKey::grid(0, 0), 1), Some(2.0));
    }

    #[test]
    fn test_commits_to_next_action() {
        let config = SarsaConfig::default()
            .n_actions(2)
            .explorer(Explorer::EpsilonGreedy(EpsilonGreedy::new(1.0)));
        let mut agent = Sarsa::build(config);
        agent.observe(tr(false, 0.0));

        let (s, a) = agent.next_act.clone().unwrap();
        assert_eq!(s, StateKey::grid(1, 0));
        assert_eq!(agent.sample(&s, &[0, 1]), Some(a));
        assert!(agent.next_act.is_none());
    }
}
