//! Helpers shared by the learning rules.
use gridrl_core::{StateKey, StateTable};
use rand::Rng;

/// Uniformly random legal action, `None` if `legal` is empty.
pub fn uniform_action(legal: &[usize], rng: &mut impl Rng) -> Option<usize> {
    if legal.is_empty() {
        None
    } else {
        Some(legal[rng.gen_range(0..legal.len())])
    }
}

/// Preferences at `key`, all-zero for an unvisited state.
pub fn prefs_or_zeros(table: &StateTable, key: &StateKey) -> Vec<f64> {
    match table.prefs(key) {
        Some(p) => p.to_vec(),
        None => vec![0.0; table.n_actions()],
    }
}

/// Gradient step on softmax preferences.
///
/// Adds `scale * (1[a == act] - probs[a])` to `prefs[a]` for every legal `a`,
/// i.e. `scale` times the gradient of `ln pi(act|s)`. Indices outside of
/// `prefs` are skipped.
pub fn softmax_grad_step(prefs: &mut [f64], probs: &[f64], legal: &[usize], act: usize, scale: f64) {
    let bound = prefs.len().min(probs.len());
    for &a in legal.iter().filter(|a| **a < bound) {
        let indicator = if a == act { 1.0 } else { 0.0 };
        prefs[a] += scale * (indicator - probs[a]);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_softmax_grad_step() {
        let mut prefs = vec![0.0, 0.0, 5.0];
        let probs = [0.5, 0.5, 0.0];
        softmax_grad_step(&mut prefs, &probs, &[0, 1], 1, 2.0);
        assert_eq!(prefs, vec![-1.0, 1.0, 5.0]);
    }

    #[test]
    fn test_uniform_action() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(uniform_action(&[], &mut rng), None);
        for _ in 0..20 {
            let a = uniform_action(&[1, 3], &mut rng).unwrap();
            assert!(a == 1 || a == 3);
        }
    }
}
