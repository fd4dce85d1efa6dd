//! Action selection.
//!
//! Softmax and epsilon-greedy produce a probability vector over the whole
//! action space (zero for illegal actions); [`sample_categorical`] draws an
//! action index from any such vector.
//!
//! Indices in `legal` that lie outside the action space are ignored here;
//! learners report them through [`check_legal`] before selecting.
use crate::error::GridRlError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Checks that every index of `legal` lies in `0..n_actions`.
pub fn check_legal(legal: &[usize], n_actions: usize) -> Result<(), GridRlError> {
    match legal.iter().find(|a| **a >= n_actions) {
        Some(&act) => Err(GridRlError::ActionOutOfRange { act, n_actions }),
        None => Ok(()),
    }
}

fn in_range(legal: &[usize], n_actions: usize) -> Vec<usize> {
    legal.iter().copied().filter(|a| *a < n_actions).collect()
}

/// Boltzmann distribution over the legal actions.
///
/// Returns a vector of length `prefs.len()` where
/// `p[a] = exp(prefs[a] / T) / sum_{b in legal} exp(prefs[b] / T)` for legal `a`
/// and `0` otherwise. Preferences of illegal actions never enter the sum.
/// Returns an all-zero vector if `legal` is empty.
pub fn softmax(prefs: &[f64], legal: &[usize], temperature: f64) -> Vec<f64> {
    let mut probs = vec![0.0; prefs.len()];
    let legal = in_range(legal, prefs.len());
    if legal.is_empty() {
        return probs;
    }

    // Shifting by the maximum keeps exp() finite for small temperatures.
    let max = legal
        .iter()
        .map(|a| prefs[*a])
        .fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for a in legal.iter() {
        let e = ((prefs[*a] - max) / temperature).exp();
        probs[*a] = e;
        sum += e;
    }
    for a in legal.iter() {
        probs[*a] /= sum;
    }
    probs
}

/// Index of the maximal value among the legal actions, ties broken uniformly
/// at random. `None` if `legal` is empty.
pub fn argmax_random_tie(values: &[f64], legal: &[usize], rng: &mut impl Rng) -> Option<usize> {
    let legal = in_range(legal, values.len());
    let max = legal
        .iter()
        .map(|a| values[*a])
        .fold(f64::NEG_INFINITY, f64::max);
    let maximizers: Vec<usize> = legal
        .iter()
        .copied()
        .filter(|a| values[*a] == max)
        .collect();
    match maximizers.len() {
        0 => None,
        1 => Some(maximizers[0]),
        n => Some(maximizers[rng.gen_range(0..n)]),
    }
}

/// Epsilon-greedy distribution over the legal actions.
///
/// Every legal action gets `epsilon / |legal|`, the maximizer additionally
/// gets `1 - epsilon`. With `epsilon == 0` this is a one-hot vector on the
/// maximizer.
pub fn epsilon_greedy(
    values: &[f64],
    legal: &[usize],
    epsilon: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let mut probs = vec![0.0; values.len()];
    let legal = in_range(legal, values.len());
    if let Some(best) = argmax_random_tie(values, &legal, rng) {
        let p = epsilon / legal.len() as f64;
        for a in legal.iter() {
            probs[*a] = p;
        }
        probs[best] += 1.0 - epsilon;
    }
    probs
}

/// Draws an index from a (possibly unnormalized) probability vector.
///
/// The vector is normalized by its sum before the cumulative walk. Returns
/// `None` when the sum is not positive, which means that no action can be
/// selected. Entries with zero mass are never returned.
pub fn sample_categorical(probs: &[f64], rng: &mut impl Rng) -> Option<usize> {
    let sum: f64 = probs.iter().sum();
    if !(sum > 0.0) {
        return None;
    }

    let u: f64 = rng.gen();
    let mut cum = 0.0;
    let mut last = None;
    for (i, p) in probs.iter().enumerate() {
        if *p <= 0.0 {
            continue;
        }
        cum += p / sum;
        last = Some(i);
        if cum >= u {
            return Some(i);
        }
    }

    // Rounding can leave the cumulative sum slightly below u.
    last
}

/// Softmax explorer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {
    /// Temperature of the Boltzmann distribution.
    pub temperature: f64,
}

impl Softmax {
    /// Constructs softmax explorer.
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }
}

impl Default for Softmax {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Epsilon-greedy explorer with linearly decaying epsilon.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// The number of selections made so far.
    pub n_opts: usize,
    /// Epsilon at the first selection.
    pub eps_start: f64,
    /// Epsilon after `final_step` selections.
    pub eps_final: f64,
    /// The number of selections over which epsilon decays.
    pub final_step: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer with constant epsilon.
    pub fn new(eps: f64) -> Self {
        Self {
            n_opts: 0,
            eps_start: eps,
            eps_final: eps,
            final_step: 1,
        }
    }

    /// Constructs epsilon-greedy explorer decaying from 1.0 to 0.02.
    pub fn with_final_step(final_step: usize) -> Explorer {
        Explorer::EpsilonGreedy(Self {
            n_opts: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step,
        })
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(self, v: f64) -> Self {
        let mut s = self;
        s.eps_final = v;
        s
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(self, v: f64) -> Self {
        let mut s = self;
        s.eps_start = v;
        s
    }

    /// Current epsilon.
    pub fn eps(&self) -> f64 {
        let d = (self.eps_start - self.eps_final) / (self.final_step.max(1) as f64);
        (self.eps_start - d * self.n_opts as f64).max(self.eps_final)
    }
}

/// Action selection strategies.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum Explorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl Default for Explorer {
    fn default() -> Self {
        Explorer::EpsilonGreedy(EpsilonGreedy::new(0.1))
    }
}

impl Explorer {
    /// Action probabilities for the given preferences or action values.
    ///
    /// In evaluation mode (`is_train == false`) epsilon-greedy collapses to the
    /// greedy action. Epsilon only decays in training mode.
    pub fn action_probs(
        &mut self,
        prefs: &[f64],
        legal: &[usize],
        is_train: bool,
        rng: &mut impl Rng,
    ) -> Vec<f64> {
        match self {
            Explorer::Softmax(s) => softmax(prefs, legal, s.temperature),
            Explorer::EpsilonGreedy(e) => {
                if is_train {
                    let eps = e.eps();
                    e.n_opts += 1;
                    epsilon_greedy(prefs, legal, eps, rng)
                } else {
                    epsilon_greedy(prefs, legal, 0.0, rng)
                }
            }
        }
    }

    /// Samples an action; `None` if no action is selectable.
    pub fn action(
        &mut self,
        prefs: &[f64],
        legal: &[usize],
        is_train: bool,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        let probs = self.action_probs(prefs, legal, is_train, rng);
        sample_categorical(&probs, rng)
    }
}
