//! Agent running the evolutionary search inside the episodic training loop.
use crate::{EvolutionConfig, GenePool, IdAllocator};
use gridrl_core::{
    explorer::{sample_categorical, softmax},
    record::{Record, RecordValue},
    Agent, Configurable, Policy, StateKey, Transition,
};
use log::{debug, warn};
use rand::{rngs::SmallRng, SeedableRng};

/// Evaluates the genomes of a [`GenePool`] one after another.
///
/// The genome under evaluation acts through a softmax over its preferences.
/// After `episodes_per_genome` episodes its fitness, the mean reward per step
/// over those episodes, is reported to the pool; the generation is bred as
/// soon as its last genome has reported. In evaluation mode the best genome
/// of the last bred generation acts and nothing is reported.
pub struct EvolutionAgent {
    pool: GenePool,
    current: Option<u64>,
    window_reward: f64,
    window_steps: usize,
    window_episodes: usize,
    episodes_per_genome: usize,
    temperature: f64,
    rng: SmallRng,
    train: bool,
}

impl EvolutionAgent {
    /// The gene pool.
    pub fn pool(&self) -> &GenePool {
        &self.pool
    }

    /// Id of the genome under evaluation.
    pub fn current_genome(&self) -> Option<u64> {
        self.current
    }

    fn acting_genome(&mut self) -> Option<u64> {
        if !self.train {
            if let Some((id, _)) = self.pool.top_group().first() {
                return Some(*id);
            }
        }
        if self.current.is_none() {
            self.current = self.pool.next_unevaluated();
            if let Some(id) = self.current {
                debug!(
                    "Evaluate genome {} of generation {}",
                    id,
                    self.pool.generation()
                );
            }
        }
        self.current
    }

    fn reset_window(&mut self) {
        self.window_reward = 0.0;
        self.window_steps = 0;
        self.window_episodes = 0;
    }
}

impl Policy for EvolutionAgent {
    fn sample(&mut self, state: &StateKey, legal: &[usize]) -> Option<usize> {
        let n_actions = self.pool.config().n_actions;
        let scale = self.pool.config().init_scale;
        if let Some(a) = legal.iter().find(|a| **a >= n_actions) {
            warn!("Action {} is out of range for {} actions", a, n_actions);
            return None;
        }

        let id = self.acting_genome()?;
        let genome = self.pool.genome_mut(id)?;
        let prefs = genome.ensure(state, n_actions, scale, &mut self.rng);
        let probs = softmax(prefs, legal, self.temperature);
        sample_categorical(&probs, &mut self.rng)
    }
}

impl Configurable for EvolutionAgent {
    type Config = EvolutionConfig;

    fn build(config: Self::Config) -> Self {
        let seed = config.pool.seed;
        let temperature = if config.temperature > 0.0 {
            config.temperature
        } else {
            warn!("Invalid temperature {}, using 1.0", config.temperature);
            1.0
        };
        Self {
            pool: GenePool::new(config.pool, IdAllocator::new()),
            current: None,
            window_reward: 0.0,
            window_steps: 0,
            window_episodes: 0,
            episodes_per_genome: config.episodes_per_genome.max(1),
            temperature,
            rng: SmallRng::seed_from_u64(seed.wrapping_add(1)),
            train: true,
        }
    }
}

impl Agent for EvolutionAgent {
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
        if self.train && self.current.is_some() {
            self.window_reward += tr.reward;
            self.window_steps += 1;
        }
        Record::empty()
    }

    fn end_episode(&mut self) -> Record {
        let id = match (self.train, self.current) {
            (true, Some(id)) => id,
            _ => return Record::empty(),
        };
        self.window_episodes += 1;
        if self.window_episodes < self.episodes_per_genome {
            return Record::empty();
        }

        let fitness = self.window_reward / self.window_steps.max(1) as f64;
        self.reset_window();
        self.current = None;

        let mut record = Record::from_scalar("fitness", fitness);
        match self.pool.report_outcome(id, fitness) {
            Ok(true) => {
                let mean = self.pool.breed_next_generation();
                record.insert("top_group_fitness", RecordValue::Scalar(mean));
                record.insert(
                    "generation",
                    RecordValue::Scalar(self.pool.generation() as f64),
                );
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to report fitness of genome {}: {}", id, e),
        }
        record
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::GenePoolConfig;
    use test_log::test;

    fn tr(reward: f64) -> Transition {
        Transition {
            state: StateKey::grid(0, 0),
            legal: vec![0, 1],
            act: 0,
            reward,
            next_state: StateKey::grid(0, 0),
            next_legal: vec![0, 1],
            is_terminal: true,
        }
    }

    fn build_agent(pop: usize, episodes: usize) -> EvolutionAgent {
        EvolutionAgent::build(
            EvolutionConfig::default()
                .pool(
                    GenePoolConfig::default()
                        .population_size(pop)
                        .top_group_size(1)
                        .n_actions(2),
                )
                .episodes_per_genome(episodes),
        )
    }

    #[test]
    fn test_fitness_is_mean_reward_per_step() {
        let mut agent = build_agent(3, 2);
        let s = StateKey::grid(0, 0);
        assert!(agent.sample(&s, &[0, 1]).is_some());
        let id = agent.current_genome().unwrap();

        agent.observe(tr(1.0));
        agent.observe(tr(0.0));
        assert!(agent.end_episode().is_empty());
        agent.observe(tr(2.0));
        let record = agent.end_episode();

        assert_eq!(record.get_scalar("fitness"), Ok(1.0));
        assert_eq!(agent.pool().genome(id).unwrap().fitness(), 1.0);
        assert_eq!(agent.current_genome(), None);

        // The next genome takes over.
        agent.sample(&s, &[0, 1]);
        assert_ne!(agent.current_genome(), Some(id));
    }

    #[test]
    fn test_breeds_after_last_genome() {
        let mut agent = build_agent(3, 1);
        let s = StateKey::grid(0, 0);
        let mut last = Record::empty();
        for i in 0..3 {
            agent.sample(&s, &[0, 1]);
            agent.observe(tr(i as f64));
            last = agent.end_episode();
        }
        assert_eq!(last.get_scalar("generation"), Ok(1.0));
        assert_eq!(last.get_scalar("top_group_fitness"), Ok(2.0));
        assert_eq!(agent.pool().generation(), 1);
        assert_eq!(agent.pool().genomes().len(), 3);
    }

    #[test]
    fn test_eval_mode_uses_best_genome() {
        let mut agent = build_agent(2, 1);
        let s = StateKey::grid(0, 0);
        for r in [0.0, 5.0] {
            agent.sample(&s, &[0, 1]);
            agent.observe(tr(r));
            agent.end_episode();
        }
        let best = agent.pool().top_group()[0].0;

        agent.eval();
        agent.sample(&s, &[0, 1]);
        agent.observe(tr(1.0));
        assert!(agent.end_episode().is_empty());
        assert!(agent.pool().genome(best).is_some());
        assert_eq!(agent.pool().generation(), 1);
    }

    #[test]
    fn test_out_of_range_action() {
        let mut agent = build_agent(2, 1);
        assert_eq!(agent.sample(&StateKey::grid(0, 0), &[0, 5]), None);
    }

    #[test]
    fn test_invalid_temperature_falls_back() {
        let s = StateKey::grid(0, 0);
        for t in [0.0, -1.0, f64::NAN] {
            let mut agent = EvolutionAgent::build(
                EvolutionConfig::default()
                    .pool(GenePoolConfig::default().population_size(2).n_actions(2))
                    .temperature(t),
            );
            assert_eq!(agent.temperature, 1.0);
            assert!(agent.sample(&s, &[0, 1]).is_some());
        }
    }
}
