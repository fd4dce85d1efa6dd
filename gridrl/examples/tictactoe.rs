use anyhow::Result;
use clap::Parser;
use gridrl_agent::qlearning::{QLearning, QLearningConfig};
use gridrl_core::{
    explorer::EpsilonGreedy, record::LogRecorder, Configurable, DefaultEvaluator, Explorer,
    Trainer, TrainerConfig,
};
use gridrl_mcts::{Game, Mark, Mcts, MctsConfig, TicTacToe, TicTacToeConfig};
use log::info;

/// Play tic-tac-toe with MCTS against a self-play Q-learning agent
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of games
    #[arg(short, long, default_value_t = 20)]
    games: usize,

    /// Search iterations per MCTS move
    #[arg(short, long, default_value_t = 500)]
    rollouts: usize,

    /// Self-play episodes for the Q-learning agent
    #[arg(short, long, default_value_t = 20000)]
    episodes: usize,
}

fn train_qlearning(episodes: usize) -> Result<QLearning> {
    let env_config = TicTacToeConfig::default();
    let config = QLearningConfig::default()
        .n_actions(9)
        .alpha(0.3)
        .gamma(1.0)
        .explorer(Explorer::EpsilonGreedy(EpsilonGreedy::new(0.2)))
        .two_player(true);
    let mut agent = QLearning::build(config);
    let mut trainer = Trainer::<TicTacToe>::build(
        TrainerConfig::default()
            .max_episodes(episodes)
            .flush_record_interval(episodes / 10 + 1),
        env_config.clone(),
    );
    let mut evaluator = DefaultEvaluator::<TicTacToe>::new(&env_config, 0, 1, 9)?;
    trainer.train(&mut agent, &mut LogRecorder::new(), &mut evaluator)?;
    Ok(agent)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut q_agent = train_qlearning(args.episodes)?;
    let mut mcts = Mcts::<TicTacToe>::build(MctsConfig::default().max_rollouts(args.rollouts));
    let (mut mcts_wins, mut q_wins, mut draws) = (0, 0, 0);

    for i in 0..args.games {
        // Alternate who opens.
        let mcts_mark = if i % 2 == 0 { Mark::X } else { Mark::O };
        let mut game = TicTacToe::new(Mark::X);
        while !Game::is_terminal(&game) {
            let act = if game.current_player() == mcts_mark {
                mcts.policy(&game)
            } else {
                q_agent.greedy_action(&game.state_key(), &Game::legal_actions(&game))
            };
            match act {
                Some(act) => game.apply(act)?,
                None => break,
            }
        }
        info!("Game {}:\n{}", i, game);
        match game.winner() {
            Some(m) if m == mcts_mark => mcts_wins += 1,
            Some(_) => q_wins += 1,
            None => draws += 1,
        }
    }

    info!(
        "MCTS wins: {}, Q-learning wins: {}, draws: {}",
        mcts_wins, q_wins, draws
    );
    Ok(())
}
