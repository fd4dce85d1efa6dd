//! Population of genomes and the generational breeding step.
use crate::{genome::Genome, GenePoolConfig, IdAllocator};
use gridrl_core::{GridRlError, StateKey};
use itertools::Itertools;
use log::{error, info, warn};
use ordered_float::OrderedFloat;
use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::Normal;
use std::{cmp::Reverse, collections::BTreeSet, collections::HashSet};

/// Phase of a [`GenePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    /// No outcome reported for the current generation yet.
    Idle,

    /// Outcomes of the given generation are being collected.
    Evaluating(usize),

    /// The next generation is being built.
    Breeding,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Fixed-size population of genomes.
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Idle
///     Idle --> Evaluating: report_outcome
///     Evaluating --> Breeding: breed_next_generation
///     Breeding --> Idle
/// ```
pub struct GenePool {
    config: GenePoolConfig,
    ids: IdAllocator,
    genomes: Vec<Genome>,
    reported: HashSet<u64>,
    top_group: Vec<(u64, f64)>,
    generation: usize,
    state: PoolState,
    rng: SmallRng,
}

impl GenePool {
    /// A pool of `population_size` empty genomes at generation 0.
    pub fn new(config: GenePoolConfig, ids: IdAllocator) -> Self {
        if !(0.0..=1.0).contains(&config.mutation_rate) {
            warn!(
                "Mutation rate {} is outside of [0, 1] and will be clamped (NaN disables mutation)",
                config.mutation_rate
            );
        }
        let genomes = (0..config.population_size)
            .map(|_| Genome::new(&ids))
            .collect();
        let rng = SmallRng::seed_from_u64(config.seed);
        Self {
            config,
            ids,
            genomes,
            reported: HashSet::new(),
            top_group: vec![],
            generation: 0,
            state: PoolState::Idle,
            rng,
        }
    }

    /// Genomes of the current generation.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Genome with the given id.
    pub fn genome(&self, id: u64) -> Option<&Genome> {
        self.genomes.iter().find(|g| g.id() == id)
    }

    /// Mutable access to the genome with the given id.
    pub fn genome_mut(&mut self, id: u64) -> Option<&mut Genome> {
        self.genomes.iter_mut().find(|g| g.id() == id)
    }

    /// Number of completed breeding steps.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current phase.
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// `(id, fitness)` of the best genomes of the last bred generation, best first.
    pub fn top_group(&self) -> &[(u64, f64)] {
        &self.top_group
    }

    /// The configuration.
    pub fn config(&self) -> &GenePoolConfig {
        &self.config
    }

    /// First genome of the current generation without a reported outcome.
    pub fn next_unevaluated(&self) -> Option<u64> {
        self.genomes
            .iter()
            .map(|g| g.id())
            .find(|id| !self.reported.contains(id))
    }

    /// Returns `true` once every genome of the generation has reported.
    pub fn is_evaluated(&self) -> bool {
        self.reported.len() == self.genomes.len()
    }

    /// Sets the fitness of genome `id`.
    ///
    /// Returns `Ok(true)` when this completes the evaluation of the current
    /// generation. A repeated report for the same genome is ignored.
    pub fn report_outcome(&mut self, id: u64, fitness: f64) -> Result<bool, GridRlError> {
        let generation = self.generation;
        let genome = self
            .genomes
            .iter_mut()
            .find(|g| g.id() == id)
            .ok_or(GridRlError::UnknownGenome(id))?;

        if self.reported.insert(id) {
            genome.set_fitness(fitness);
        } else {
            warn!(
                "Genome {} already reported in generation {}, ignore fitness {}",
                id, generation, fitness
            );
        }
        self.state = PoolState::Evaluating(generation);
        Ok(self.is_evaluated())
    }

    /// Replaces the population with the next generation.
    ///
    /// The best `top_group_size` genomes survive with their fitness reset.
    /// Every pair of them produces two crossover children, three quarters of
    /// the slots left over are filled with mutated clones of the survivors in
    /// turn, and the rest with random genomes over the survivors' states.
    ///
    /// Returns the mean fitness of the survivors, or 0 without touching the
    /// pool if the top group is larger than the population.
    pub fn breed_next_generation(&mut self) -> f64 {
        let pop = self.config.population_size;
        let k = self.config.top_group_size;
        if k > pop {
            error!(
                "Refuse to breed: {}",
                GridRlError::TopGroupTooLarge {
                    top_group: k,
                    population: pop
                }
            );
            return 0.0;
        }

        let n_missing = self.genomes.len() - self.reported.len();
        if n_missing > 0 {
            warn!(
                "{} genomes of generation {} never reported, their fitness is 0",
                n_missing, self.generation
            );
        }
        self.state = PoolState::Breeding;

        // Stable sort, so ties keep population order.
        let mut old = std::mem::take(&mut self.genomes);
        old.sort_by_key(|g| Reverse(OrderedFloat(g.fitness())));
        let top: Vec<Genome> = old.into_iter().take(k).collect();
        self.top_group = top.iter().map(|g| (g.id(), g.fitness())).collect();
        let mean = if k > 0 {
            top.iter().map(|g| g.fitness()).sum::<f64>() / k as f64
        } else {
            0.0
        };

        let n_actions = self.config.n_actions;
        let scale = self.config.init_scale;
        let mut children = Vec::with_capacity(pop - k);

        for (a, b) in (0..k).tuple_combinations() {
            if k + children.len() >= pop {
                break;
            }
            let (c1, c2) =
                Genome::crossover(&top[a], &top[b], &self.ids, n_actions, scale, &mut self.rng);
            children.push(c1);
            if k + children.len() < pop {
                children.push(c2);
            }
        }
        let n_crossover = children.len();

        let n_mutants = if k > 0 {
            (pop - k - n_crossover) * 3 / 4
        } else {
            0
        };
        match Normal::new(0.0, self.config.mutation_sigma) {
            Ok(noise) => {
                for parent in top.iter().cycle().take(n_mutants) {
                    let mut child = parent.clone_with_new_id(&self.ids);
                    child.mutate(self.config.mutation_rate, &noise, &mut self.rng);
                    children.push(child);
                }
            }
            Err(e) => warn!("Skip mutation, invalid sigma: {}", e),
        }

        let keys: BTreeSet<&StateKey> = top.iter().flat_map(|g| g.policy().keys()).collect();
        while k + children.len() < pop {
            let child = Genome::random(&self.ids, keys.iter().copied(), n_actions, scale, &mut self.rng);
            children.push(child);
        }

        let mut next: Vec<Genome> = top;
        for g in next.iter_mut() {
            g.set_fitness(0.0);
        }
        next.extend(children);
        self.genomes = next;
        self.reported.clear();
        self.generation += 1;
        self.state = PoolState::Idle;

        info!(
            "Bred generation {}: top-group mean fitness {:.4}, {} crossover, {} mutants",
            self.generation, mean, n_crossover, n_mutants
        );
        mean
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    fn config(pop: usize, k: usize) -> GenePoolConfig {
        GenePoolConfig::default()
            .population_size(pop)
            .top_group_size(k)
            .n_actions(2)
            .seed(3)
    }

    /// Single-state tables, fitness is the preference of the first action.
    fn evaluate(pool: &mut GenePool) -> Vec<(u64, f64)> {
        let s = StateKey::grid(0, 0);
        let mut rng = SmallRng::seed_from_u64(11);
        let ids: Vec<u64> = pool.genomes().iter().map(|g| g.id()).collect();
        let mut outcomes = vec![];
        for id in ids {
            let fitness = pool
                .genome_mut(id)
                .unwrap()
                .ensure(&s, 2, 1.0, &mut rng)[0];
            outcomes.push((id, fitness));
            pool.report_outcome(id, fitness).unwrap();
        }
        outcomes
    }

    #[test]
    fn test_breed_returns_top_group_mean() {
        let mut pool = GenePool::new(config(50, 5), IdAllocator::new());
        assert_eq!(pool.state(), PoolState::Idle);

        let mut outcomes = evaluate(&mut pool);
        assert!(pool.is_evaluated());
        assert_eq!(pool.state(), PoolState::Evaluating(0));

        outcomes.sort_by(|x, y| y.1.total_cmp(&x.1));
        let expected = outcomes[..5].iter().map(|o| o.1).sum::<f64>() / 5.0;

        let mean = pool.breed_next_generation();
        assert_eq!(mean, expected);
        assert_eq!(pool.genomes().len(), 50);
        assert_eq!(pool.generation(), 1);
        assert_eq!(pool.state(), PoolState::Idle);

        // Survivors are kept under their ids with fitness reset.
        for (id, _) in outcomes[..5].iter() {
            assert_eq!(pool.genome(*id).unwrap().fitness(), 0.0);
        }
        let top_ids: Vec<u64> = pool.top_group().iter().map(|t| t.0).collect();
        let expected_ids: Vec<u64> = outcomes[..5].iter().map(|o| o.0).collect();
        assert_eq!(top_ids, expected_ids);

        // Every other genome is new.
        let old: HashSet<u64> = outcomes.iter().map(|o| o.0).collect();
        let fresh = pool
            .genomes()
            .iter()
            .filter(|g| !old.contains(&g.id()))
            .count();
        assert_eq!(fresh, 45);
        let unique: HashSet<u64> = pool.genomes().iter().map(|g| g.id()).collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn test_population_size_is_preserved() {
        // 10 pairs among 5 parents would give 20 children, more than fit.
        for (pop, k) in [(50, 5), (12, 5), (6, 5), (5, 5), (7, 1), (4, 0)] {
            let mut pool = GenePool::new(config(pop, k), IdAllocator::new());
            for _ in 0..3 {
                evaluate(&mut pool);
                pool.breed_next_generation();
                assert_eq!(pool.genomes().len(), pop);
            }
        }
    }

    #[test]
    fn test_refuse_oversized_top_group() {
        let mut pool = GenePool::new(config(4, 5), IdAllocator::new());
        evaluate(&mut pool);
        let before: Vec<u64> = pool.genomes().iter().map(|g| g.id()).collect();

        assert_eq!(pool.breed_next_generation(), 0.0);
        assert_eq!(pool.generation(), 0);
        let after: Vec<u64> = pool.genomes().iter().map(|g| g.id()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_report_outcome() {
        let mut pool = GenePool::new(config(2, 1), IdAllocator::new());
        let ids: Vec<u64> = pool.genomes().iter().map(|g| g.id()).collect();

        assert_eq!(
            pool.report_outcome(99, 1.0),
            Err(GridRlError::UnknownGenome(99))
        );
        assert_eq!(pool.report_outcome(ids[0], 1.0), Ok(false));
        assert_eq!(pool.next_unevaluated(), Some(ids[1]));
        // Duplicate report keeps the first fitness.
        assert_eq!(pool.report_outcome(ids[0], 5.0), Ok(false));
        assert_eq!(pool.genome(ids[0]).unwrap().fitness(), 1.0);
        assert_eq!(pool.report_outcome(ids[1], 2.0), Ok(true));
        assert_eq!(pool.next_unevaluated(), None);
    }

    #[test]
    fn test_unreported_genomes_have_zero_fitness() {
        let mut pool = GenePool::new(config(3, 1), IdAllocator::new());
        let ids: Vec<u64> = pool.genomes().iter().map(|g| g.id()).collect();
        pool.report_outcome(ids[1], -1.0).unwrap();

        // Two silent genomes at 0 beat the reported -1; the first one wins the tie.
        assert_eq!(pool.breed_next_generation(), 0.0);
        assert_eq!(pool.top_group(), &[(ids[0], 0.0)]);
    }
}
