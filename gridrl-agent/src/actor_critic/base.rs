//! One-step Actor-Critic agent.
use super::ActorCriticConfig;
use crate::util::{prefs_or_zeros, softmax_grad_step};
use gridrl_core::{
    explorer::{sample_categorical, softmax},
    record::{Record, RecordValue},
    Agent, Configurable, Policy, StateKey, StateTable, Transition,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};

/// Discounted one-step Actor-Critic.
///
/// Per transition, `delta = r + gamma * V(s') - V(s)` (`r - V(s)` at a terminal
/// transition), `V(s) += alpha_v * delta` and
/// `theta[s][a] += alpha_theta * I * delta * (1[a = a_t] - pi(a|s))` for every
/// legal `a`. The weight `I` is 1 at the start of an episode and is multiplied
/// by `gamma` after every step.
pub struct ActorCritic {
    table: StateTable,
    alpha_theta: f64,
    alpha_v: f64,
    gamma: f64,
    temperature: f64,
    i_gamma: f64,
    rng: SmallRng,
    train: bool,
}

impl ActorCritic {
    /// Preferences and state values.
    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Current policy at `key`, `None` for an unvisited state.
    pub fn policy(&self, key: &StateKey, legal: &[usize]) -> Option<Vec<f64>> {
        self.table.softmax_policy(key, legal, self.temperature)
    }

    /// Eligibility weight applied to the next actor update.
    pub fn i_gamma(&self) -> f64 {
        self.i_gamma
    }

    /// Applies the update for one transition and returns the TD error.
    pub fn update(&mut self, tr: &Transition) -> f64 {
        let v_next = if tr.is_terminal {
            0.0
        } else {
            self.table.value(&tr.next_state).unwrap_or(0.0)
        };
        let temperature = self.temperature;
        let entry = self.table.ensure(&tr.state);
        let delta = tr.reward + self.gamma * v_next - entry.value;

        entry.value += self.alpha_v * delta;
        let probs = softmax(&entry.prefs, &tr.legal, temperature);
        softmax_grad_step(
            &mut entry.prefs,
            &probs,
            &tr.legal,
            tr.act,
            self.alpha_theta * self.i_gamma * delta,
        );
        self.i_gamma *= self.gamma;

        delta
    }
}

impl Policy for ActorCritic {
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

impl Configurable for ActorCritic {
    type Config = ActorCriticConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            table: StateTable::with_init(config.n_actions, config.init, config.seed),
            alpha_theta: config.alpha_theta,
            alpha_v: config.alpha_v,
            gamma: config.gamma,
            temperature: config.temperature,
            i_gamma: 1.0,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
        }
    }
}

impl Agent for ActorCritic {
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
            warn!("Skip Actor-Critic update: {}", e);
            return Record::empty();
        }
        let delta = self.update(&tr);
        Record::from_slice(&[("td_error", RecordValue::Scalar(delta))])
    }

    fn end_episode(&mut self) -> Record {
        self.i_gamma = 1.0;
        Record::empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tr(is_terminal: bool, reward: f64) -> Transition {
        Transition {
            state: StateKey::grid(0, 0),
            legal: vec![0, 1],
            act: 0,
            reward,
            next_state: StateKey::grid(1, 0),
            next_legal: vec![0, 1],
            is_terminal,
        }
    }

    fn build_agent() -> ActorCritic {
        ActorCritic::build(
            ActorCriticConfig::default()
                .n_actions(2)
                .alpha_theta(1.0)
                .alpha_v(0.5)
                .gamma(0.5),
        )
    }

    #[test]
    fn test_critic_and_actor_update() {
        let mut agent = build_agent();
        agent.table.ensure(&StateKey::grid(1, 0)).value = 2.0;

        // delta = 1 + 0.5 * 2 - 0 = 2
        let delta = agent.update(&tr(false, 1.0));
        assert_eq!(delta, 2.0);
        let entry = agent.table().get(&StateKey::grid(0, 0)).unwrap();
        assert_eq!(entry.value, 1.0);
        assert_eq!(entry.prefs, vec![1.0, -1.0]);
        assert_eq!(agent.i_gamma(), 0.5);
    }

    #[test]
    fn test_terminal_ignores_successor_value() {
        let mut agent = build_agent();
        agent.table.ensure(&StateKey::grid(1, 0)).value = 100.0;
        assert_eq!(agent.update(&tr(true, 1.0)), 1.0);
    }

    #[test]
    fn test_eligibility_weight() {
        let mut agent = build_agent();
        agent.observe(tr(false, 0.0));
        agent.observe(tr(false, 0.0));
        assert_eq!(agent.i_gamma(), 0.25);

        // The second actor step is scaled by I = 0.5.
        let mut agent = build_agent();
        agent.i_gamma = 0.5;
        agent.update(&tr(true, 2.0));
        let entry = agent.table().get(&StateKey::grid(0, 0)).unwrap();
        assert_eq!(entry.prefs, vec![0.5, -0.5]);

        agent.end_episode();
        assert_eq!(agent.i_gamma(), 1.0);
    }

    #[test]
    fn test_out_of_range_legal_action() {
        let mut agent = build_agent();
        assert_eq!(agent.sample(&StateKey::grid(0, 0), &[0, 3]), None);

        let mut bad = tr(false, 1.0);
        bad.legal = vec![0, 3];
        let record = agent.observe(bad);
        assert!(record.get_scalar("td_error").is_err());
        assert!(agent.table().get(&StateKey::grid(0, 0)).is_none());
        assert_eq!(agent.i_gamma(), 1.0);
    }
}
