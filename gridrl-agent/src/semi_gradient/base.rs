//! Semi-gradient SARSA.
use super::{FunctionApproximator, SemiGradientConfig};
use gridrl_core::{
    record::{Record, RecordValue},
    explorer::check_legal,
    Agent, Explorer, Featurizer, GridRlError, Policy, StateKey, Transition,
};
use log::warn;
use rand::{rngs::SmallRng, SeedableRng};

/// SARSA with action values `q(s, .)` produced by a [`FunctionApproximator`]
/// from the features of `s`.
///
/// Only the output of the taken action is moved towards the target
/// `r + gamma * q(s', a')` (`r` at a terminal transition).
pub struct SemiGradientSarsa<F: Featurizer, A: FunctionApproximator> {
    featurizer: F,
    approximator: A,
    explorer: Explorer,
    gamma: f64,
    rng: SmallRng,
    train: bool,
    next_act: Option<(StateKey, usize)>,
}

impl<F: Featurizer, A: FunctionApproximator> SemiGradientSarsa<F, A> {
    /// Builds the agent.
    ///
    /// Fails if the featurizer and the approximator disagree on the input dimension.
    pub fn new(config: SemiGradientConfig, featurizer: F, approximator: A) -> Result<Self, GridRlError> {
        if featurizer.dim() != approximator.input_dim() {
            return Err(GridRlError::DimensionMismatch {
                expected: approximator.input_dim(),
                actual: featurizer.dim(),
            });
        }
        Ok(Self {
            featurizer,
            approximator,
            explorer: config.explorer,
            gamma: config.gamma,
            rng: SmallRng::seed_from_u64(config.seed),
            train: true,
            next_act: None,
        })
    }

    /// The function approximator.
    pub fn approximator(&self) -> &A {
        &self.approximator
    }

    /// Action values at `state`.
    pub fn q_values(&mut self, state: &StateKey) -> Result<Vec<f64>, GridRlError> {
        self.approximator
            .set_input(&self.featurizer.features(state))?;
        self.approximator.calculate();
        Ok(self.approximator.output().to_vec())
    }

    fn select(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        match self.q_values(state) {
            Ok(q) => self.explorer.action(&q, legal, self.train, &mut self.rng),
            Err(e) => {
                warn!("Cannot evaluate {}: {}", state, e);
                None
            }
        }
    }

    /// Applies the update for one transition and returns the TD error.
    pub fn update(&mut self, tr: &Transition, next_act: Option<usize>) -> Result<f64, GridRlError> {
        let target = match (tr.is_terminal, next_act) {
            (false, Some(a_)) => tr.reward + self.gamma * self.q_values(&tr.next_state)?[a_],
            _ => tr.reward,
        };
        let mut q = self.q_values(&tr.state)?;
        if tr.act >= q.len() {
            return Err(GridRlError::ActionOutOfRange {
                act: tr.act,
                n_actions: q.len(),
            });
        }
        let td_error = target - q[tr.act];
        q[tr.act] = target;
        self.approximator.learn(&q);
        Ok(td_error)
    }
}

impl<F: Featurizer, A: FunctionApproximator> Policy for SemiGradientSarsa<F, A> {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        if let Err(e) = check_legal(legal, self.approximator.output_dim()) {
            warn!("No action selected at {}: {}", state, e);
            return None;
        }
        match self.next_act.take() {
            Some((s, a)) if &s == state && legal.contains(&a) => Some(a),
            _ => self.select(state, legal),
        }
    }
}

impl<F: Featurizer, A: FunctionApproximator> Agent for SemiGradientSarsa<F, A> {
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
        let n_actions = self.approximator.output_dim();
        if let Err(e) = check_legal(&tr.legal, n_actions)
            .and_then(|_| check_legal(&tr.next_legal, n_actions))
        {
            warn!("Skip semi-gradient update: {}", e);
            return Record::empty();
        }
        let next_act = if tr.is_terminal {
            None
        } else {
            self.select(&tr.next_state, &tr.next_legal)
        };
        match self.update(&tr, next_act) {
            Ok(td_error) => {
                self.next_act = next_act.map(|a| (tr.next_state, a));
                Record::from_slice(&[("td_error", RecordValue::Scalar(td_error))])
            }
            Err(e) => {
                warn!("Skip semi-gradient update: {}", e);
                Record::empty()
            }
        }
    }

    fn end_episode(&mut self) -> Record {
        self.next_act = None;
        Record::empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::semi_gradient::LinearApproximator;
    use gridrl_core::OneHotFeaturizer;

    fn build_agent() -> SemiGradientSarsa<OneHotFeaturizer, LinearApproximator> {
        let featurizer = OneHotFeaturizer::new(3, 1, 0);
        let approximator = LinearApproximator::new(3, 2, 0.5);
        SemiGradientSarsa::new(SemiGradientConfig::default().gamma(1.0), featurizer, approximator)
            .unwrap()
    }

    fn tr(x: i64, act: usize, reward: f64, is_terminal: bool) -> Transition {
        Transition {
            state: StateKey::grid(x, 0),
            legal: vec![0, 1],
            act,
            reward,
            next_state: StateKey::grid(x + 1, 0),
            next_legal: vec![0, 1],
            is_terminal,
        }
    }

    #[test]
    fn test_terminal_update_moves_taken_action_only() {
        let mut agent = build_agent();
        let td = agent.update(&tr(1, 1, 2.0, true), None).unwrap();
        assert_eq!(td, 2.0);
        assert_eq!(agent.q_values(&StateKey::grid(1, 0)).unwrap(), vec![0.0, 1.0]);
        assert_eq!(agent.q_values(&StateKey::grid(0, 0)).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_bootstrap() {
        let mut agent = build_agent();
        agent.update(&tr(1, 1, 2.0, true), None).unwrap();
        agent.update(&tr(0, 0, 0.0, false), Some(1)).unwrap();
        // target = 0 + q(s1, 1) = 1, half-way step.
        assert_eq!(agent.q_values(&StateKey::grid(0, 0)).unwrap(), vec![0.5, 0.0]);
    }

    #[test]
    fn test_dimension_check() {
        let featurizer = OneHotFeaturizer::new(4, 1, 0);
        let approximator = LinearApproximator::new(3, 2, 0.5);
        assert!(
            SemiGradientSarsa::new(SemiGradientConfig::default(), featurizer, approximator)
                .is_err()
        );
    }
}
