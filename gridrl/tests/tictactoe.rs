use anyhow::Result;
use gridrl_agent::qlearning::{QLearning, QLearningConfig};
use gridrl_core::{
    explorer::EpsilonGreedy, record::NullRecorder, Configurable, DefaultEvaluator, Explorer,
    Trainer, TrainerConfig,
};
use gridrl_mcts::{Game, Mark, Mcts, MctsConfig, TicTacToe, TicTacToeConfig};
use test_log::test;

#[test]
fn test_self_play_values_are_bounded() -> Result<()> {
    let env_config = TicTacToeConfig::default();
    let config = QLearningConfig::default()
        .n_actions(9)
        .alpha(0.5)
        .gamma(1.0)
        .explorer(Explorer::EpsilonGreedy(EpsilonGreedy::new(0.5)))
        .two_player(true);
    let mut agent = QLearning::build(config);
    let mut trainer = Trainer::<TicTacToe>::build(
        TrainerConfig::default().max_episodes(300),
        env_config.clone(),
    );
    let mut evaluator = DefaultEvaluator::<TicTacToe>::new(&env_config, 0, 1, 9)?;
    trainer.train(&mut agent, &mut NullRecorder::new(), &mut evaluator)?;

    assert!(!agent.table().is_empty());
    for (_, entry) in agent.table().iter() {
        assert!(entry.prefs.iter().all(|q| (-1.0..=1.0).contains(q)));
    }
    Ok(())
}

#[test]
fn test_mcts_self_play_finishes() -> Result<()> {
    let mut x = Mcts::<TicTacToe>::build(MctsConfig::default().max_rollouts(400).seed(1));
    let mut o = Mcts::<TicTacToe>::build(MctsConfig::default().max_rollouts(400).seed(2));
    let mut game = TicTacToe::new(Mark::X);

    while let Some(act) = match game.current_player() {
        Mark::X => x.policy(&game),
        Mark::O => o.policy(&game),
    } {
        assert!(Game::legal_actions(&game).contains(&act));
        game.apply(act)?;
    }
    assert!(Game::is_terminal(&game));
    Ok(())
}
