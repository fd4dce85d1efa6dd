//! Genomes: whole policy tables under evolution.
use crate::IdAllocator;
use gridrl_core::StateKey;
use itertools::Itertools;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A random preference vector with entries in `[-scale, scale)`.
pub(crate) fn random_entry(n_actions: usize, scale: f64, rng: &mut impl Rng) -> Vec<f64> {
    (0..n_actions)
        .map(|_| {
            if scale > 0.0 {
                rng.gen_range(-scale..scale)
            } else {
                0.0
            }
        })
        .collect()
}

/// A complete policy: action preferences for every state it has seen.
///
/// Entries are kept ordered by state key so that iteration, and hence every
/// random operation driven by it, is reproducible under a fixed seed.
/// There is no `Clone` impl; [`Genome::clone_with_new_id`] is the only way to
/// copy a genome and it always yields a fresh id and zero fitness.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    id: u64,
    fitness: f64,
    policy: BTreeMap<StateKey, Vec<f64>>,
}

impl Genome {
    /// An empty genome.
    pub fn new(ids: &IdAllocator) -> Self {
        Self {
            id: ids.next_id(),
            fitness: 0.0,
            policy: BTreeMap::new(),
        }
    }

    /// A genome with random entries for the given states.
    pub fn random<'a>(
        ids: &IdAllocator,
        keys: impl IntoIterator<Item = &'a StateKey>,
        n_actions: usize,
        scale: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let mut genome = Self::new(ids);
        for key in keys {
            genome
                .policy
                .insert(key.clone(), random_entry(n_actions, scale, rng));
        }
        genome
    }

    /// Unique id of this genome.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Fitness reported in the current generation, 0 until reported.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub(crate) fn set_fitness(&mut self, v: f64) {
        self.fitness = v;
    }

    /// The preference table.
    pub fn policy(&self) -> &BTreeMap<StateKey, Vec<f64>> {
        &self.policy
    }

    /// Preferences at `key`, if any.
    pub fn prefs(&self, key: &StateKey) -> Option<&[f64]> {
        self.policy.get(key).map(|v| v.as_slice())
    }

    /// Preferences at `key`, adding a random entry for an unseen state.
    pub fn ensure(
        &mut self,
        key: &StateKey,
        n_actions: usize,
        scale: f64,
        rng: &mut impl Rng,
    ) -> &[f64] {
        self.policy
            .entry(key.clone())
            .or_insert_with(|| random_entry(n_actions, scale, rng))
    }

    /// Number of states in the table.
    pub fn len(&self) -> usize {
        self.policy.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.policy.is_empty()
    }

    /// Copy of the table under a new id, with zero fitness.
    pub fn clone_with_new_id(&self, ids: &IdAllocator) -> Self {
        Self {
            id: ids.next_id(),
            fitness: 0.0,
            policy: self.policy.clone(),
        }
    }

    /// Perturbs the table in place.
    ///
    /// Each preference vector is picked with probability `rate`; a picked
    /// vector gets noise from `noise` added to one action chosen uniformly.
    /// Returns the number of perturbed states. `rate` is clamped to `[0, 1]`
    /// and a NaN rate perturbs nothing.
    pub fn mutate(&mut self, rate: f64, noise: &Normal<f64>, rng: &mut impl Rng) -> usize {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        let mut n = 0;
        for prefs in self.policy.values_mut() {
            if prefs.is_empty() || !rng.gen_bool(rate) {
                continue;
            }
            let a = rng.gen_range(0..prefs.len());
            prefs[a] += noise.sample(rng);
            n += 1;
        }
        n
    }

    /// Two complementary children of `a` and `b`.
    ///
    /// For each state in the union of both tables a coin flip decides which
    /// child inherits `a`'s vector; the other child inherits `b`'s. A parent
    /// without an entry for the state contributes a fresh random vector.
    pub fn crossover(
        a: &Genome,
        b: &Genome,
        ids: &IdAllocator,
        n_actions: usize,
        scale: f64,
        rng: &mut impl Rng,
    ) -> (Genome, Genome) {
        let mut c1 = Self::new(ids);
        let mut c2 = Self::new(ids);

        for key in a.policy.keys().merge(b.policy.keys()).dedup() {
            let pa = match a.policy.get(key) {
                Some(v) => v.clone(),
                None => random_entry(n_actions, scale, rng),
            };
            let pb = match b.policy.get(key) {
                Some(v) => v.clone(),
                None => random_entry(n_actions, scale, rng),
            };
            let (x, y) = if rng.gen_bool(0.5) { (pa, pb) } else { (pb, pa) };
            c1.policy.insert(key.clone(), x);
            c2.policy.insert(key.clone(), y);
        }

        (c1, c2)
    }
}
