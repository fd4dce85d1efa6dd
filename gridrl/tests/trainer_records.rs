use anyhow::Result;
use gridrl_agent::sarsa::{Sarsa, SarsaConfig};
use gridrl_core::{
    dummy::{Corridor, CorridorConfig},
    record::{BufferedRecorder, RecordValue},
    Configurable, DefaultEvaluator, Trainer, TrainerConfig,
};
use test_log::test;

#[test]
fn test_flushed_records() -> Result<()> {
    let env_config = CorridorConfig::default();
    let mut agent = Sarsa::build(SarsaConfig::default().n_actions(2).alpha(0.5).gamma(0.9));
    let mut trainer = Trainer::<Corridor>::build(
        TrainerConfig::default()
            .max_episodes(50)
            .max_steps_per_episode(1000)
            .eval_interval(10)
            .flush_record_interval(10),
        env_config.clone(),
    );
    let mut evaluator = DefaultEvaluator::<Corridor>::new(&env_config, 0, 3, 100)?;
    let mut recorder = BufferedRecorder::new();
    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    let flushed = recorder.flushed();
    let steps: Vec<i64> = flushed.iter().map(|(s, _)| *s).collect();
    assert_eq!(steps, vec![10, 20, 30, 40, 50]);
    for (step, record) in flushed {
        // Every training episode reaches the goal within the step limit.
        assert_eq!(record.get_scalar("episode_return_mean")?, 1.0);
        assert_eq!(record.get_scalar("episode")?, *step as f64);
        let eval_return = record.get_scalar("eval_return")?;
        assert!((0.0..=1.0).contains(&eval_return));
        assert!(matches!(record.get("datetime"), Some(RecordValue::DateTime(_))));
    }
    Ok(())
}
