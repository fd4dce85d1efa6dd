use anyhow::Result;
use gridrl_core::{
    dummy::{Corridor, CorridorConfig},
    record::{BufferedRecorder, RecordValue},
    Configurable, DefaultEvaluator, StateKey, Trainer, TrainerConfig,
};
use gridrl_evolution::{EvolutionAgent, EvolutionConfig, GenePool, GenePoolConfig, IdAllocator};
use rand::{rngs::SmallRng, SeedableRng};
use std::collections::HashSet;
use test_log::test;

#[test]
fn test_top_group_mean_of_single_state_tables() {
    let config = GenePoolConfig::default()
        .population_size(50)
        .top_group_size(5)
        .n_actions(2)
        .seed(17);
    let mut pool = GenePool::new(config, IdAllocator::new());
    let mut rng = SmallRng::seed_from_u64(5);
    let s = StateKey::grid(0, 0);

    let ids: Vec<u64> = pool.genomes().iter().map(|g| g.id()).collect();
    let mut fitness = vec![];
    for id in ids.iter() {
        let f = pool.genome_mut(*id).unwrap().ensure(&s, 2, 1.0, &mut rng)[0];
        fitness.push(f);
        pool.report_outcome(*id, f).unwrap();
    }
    fitness.sort_by(|a, b| b.total_cmp(a));
    let expected = fitness[..5].iter().sum::<f64>() / 5.0;

    assert_eq!(pool.breed_next_generation(), expected);
    assert_eq!(pool.genomes().len(), 50);

    // Survivors keep their ids, every child id is new.
    let old: HashSet<u64> = ids.into_iter().collect();
    let kept: Vec<u64> = pool
        .genomes()
        .iter()
        .map(|g| g.id())
        .filter(|id| old.contains(id))
        .collect();
    assert_eq!(kept.len(), 5);
    for (id, _) in pool.top_group() {
        assert!(kept.contains(id));
    }
}

#[test]
fn test_evolution_agent_in_trainer() -> Result<()> {
    let env_config = CorridorConfig::default();
    let config = EvolutionConfig::default()
        .pool(
            GenePoolConfig::default()
                .population_size(10)
                .top_group_size(3)
                .n_actions(2),
        )
        .episodes_per_genome(1);
    let mut agent = EvolutionAgent::build(config);
    let mut trainer = Trainer::<Corridor>::build(
        TrainerConfig::default()
            .max_episodes(100)
            .max_steps_per_episode(50)
            .flush_record_interval(10),
        env_config.clone(),
    );
    let mut evaluator = DefaultEvaluator::<Corridor>::new(&env_config, 0, 1, 50)?;
    let mut recorder = BufferedRecorder::new();
    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert_eq!(agent.pool().generation(), 10);
    assert_eq!(agent.pool().genomes().len(), 10);

    // One generation per flush window.
    let flushed = recorder.flushed();
    assert_eq!(flushed.len(), 10);
    for (_, record) in flushed {
        assert!(matches!(
            record.get("generation"),
            Some(RecordValue::Scalar(_))
        ));
    }
    Ok(())
}
