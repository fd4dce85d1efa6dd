use anyhow::Result;
use clap::{Parser, ValueEnum};
use csv::WriterBuilder;
use gridrl_agent::{
    actor_critic::{ActorCritic, ActorCriticConfig},
    mc::{Mc, McConfig},
    ppo::{Ppo, PpoConfig},
    qlearning::{QLearning, QLearningConfig},
    reinforce::{Reinforce, ReinforceConfig},
    sarsa::{Sarsa, SarsaConfig},
};
use gridrl_async_trainer::{worker_stats_fmt, A3cConfig, WorkerManager};
use gridrl_core::{
    dummy::{Corridor, CorridorConfig},
    explorer::EpsilonGreedy,
    record::{BufferedRecorder, Record},
    Agent, Configurable, DefaultEvaluator, Explorer, Trainer, TrainerConfig,
};
use gridrl_evolution::{EvolutionAgent, EvolutionConfig, GenePoolConfig};
use log::info;
use serde::Serialize;
use std::{convert::TryFrom, fs::File, path::PathBuf};

const N_ACTIONS: usize = 2;
const MAX_STEPS: usize = 200;
const EVAL_INTERVAL: usize = 50;
const N_EPISODES_PER_EVAL: usize = 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Algo {
    Mc,
    Sarsa,
    Qlearning,
    Reinforce,
    ActorCritic,
    Ppo,
    Evolution,
    A3c,
}

/// Train an agent in the corridor environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Learning rule
    #[arg(short, long, value_enum, default_value_t = Algo::Qlearning)]
    algo: Algo,

    /// Number of training episodes (ticks for A3C)
    #[arg(short, long, default_value_t = 500)]
    episodes: usize,

    /// Number of cells including the goal
    #[arg(short, long, default_value_t = 6)]
    length: i64,

    /// Write the learning curve to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CurveRecord {
    episode: i64,
    episode_return: f64,
    eval_return: Option<f64>,
}

impl TryFrom<(i64, &Record)> for CurveRecord {
    type Error = anyhow::Error;

    fn try_from((episode, record): (i64, &Record)) -> Result<Self> {
        // A single value per flush is not summarized.
        let episode_return = record
            .get_scalar("episode_return_mean")
            .or_else(|_| record.get_scalar("episode_return"))?;
        Ok(Self {
            episode,
            episode_return,
            eval_return: record.get_scalar("eval_return").ok(),
        })
    }
}

fn train<A: Agent>(agent: &mut A, args: &Args, recorder: &mut BufferedRecorder) -> Result<()> {
    let env_config = CorridorConfig {
        length: args.length,
        goal_reward: 1.0,
    };
    let trainer_config = TrainerConfig::default()
        .max_episodes(args.episodes)
        .max_steps_per_episode(MAX_STEPS)
        .eval_interval(EVAL_INTERVAL)
        .flush_record_interval(EVAL_INTERVAL);
    let mut trainer = Trainer::<Corridor>::build(trainer_config, env_config.clone());
    let mut evaluator =
        DefaultEvaluator::<Corridor>::new(&env_config, 0, N_EPISODES_PER_EVAL, MAX_STEPS)?;
    trainer.train(agent, recorder, &mut evaluator)
}

fn train_a3c(args: &Args, recorder: &mut BufferedRecorder) -> Result<()> {
    let env_config = CorridorConfig {
        length: args.length,
        goal_reward: 1.0,
    };
    let config = A3cConfig::default()
        .n_actions(N_ACTIONS)
        .max_ticks(args.episodes)
        .flush_record_interval(EVAL_INTERVAL);
    let mut manager = WorkerManager::<Corridor>::build(&config, &env_config);
    manager.run()?;
    manager.train(recorder)?;
    let stats = manager.stop_and_join();
    info!("{}", worker_stats_fmt(&stats));
    Ok(())
}

fn write_curve(recorder: &BufferedRecorder, path: &PathBuf) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_writer(File::create(path)?);
    for (step, record) in recorder.flushed() {
        if let Ok(row) = CurveRecord::try_from((*step, record)) {
            wtr.serialize(row)?;
        }
    }
    wtr.flush()?;
    info!("Wrote learning curve to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut recorder = BufferedRecorder::new();
    let explorer = Explorer::EpsilonGreedy(EpsilonGreedy::new(0.3));

    match args.algo {
        Algo::Mc => {
            let mut agent = Mc::build(McConfig::default().n_actions(N_ACTIONS).gamma(0.9));
            train(&mut agent, &args, &mut recorder)?;
        }
        Algo::Sarsa => {
            let config = SarsaConfig::default()
                .n_actions(N_ACTIONS)
                .alpha(0.5)
                .gamma(0.9)
                .explorer(explorer);
            train(&mut Sarsa::build(config), &args, &mut recorder)?;
        }
        Algo::Qlearning => {
            let config = QLearningConfig::default()
                .n_actions(N_ACTIONS)
                .alpha(0.5)
                .gamma(0.9)
                .explorer(explorer);
            train(&mut QLearning::build(config), &args, &mut recorder)?;
        }
        Algo::Reinforce => {
            let config = ReinforceConfig::default()
                .n_actions(N_ACTIONS)
                .alpha(0.1)
                .gamma(0.9)
                .baseline(true);
            train(&mut Reinforce::build(config), &args, &mut recorder)?;
        }
        Algo::ActorCritic => {
            let config = ActorCriticConfig::default().n_actions(N_ACTIONS).gamma(0.9);
            train(&mut ActorCritic::build(config), &args, &mut recorder)?;
        }
        Algo::Ppo => {
            let config = PpoConfig::default().n_actions(N_ACTIONS).gamma(0.9);
            train(&mut Ppo::build(config), &args, &mut recorder)?;
        }
        Algo::Evolution => {
            let config = EvolutionConfig::default()
                .pool(
                    GenePoolConfig::default()
                        .population_size(20)
                        .top_group_size(4)
                        .n_actions(N_ACTIONS),
                )
                .episodes_per_genome(2);
            train(&mut EvolutionAgent::build(config), &args, &mut recorder)?;
        }
        Algo::A3c => train_a3c(&args, &mut recorder)?,
    }

    for (step, record) in recorder.flushed() {
        if let Ok(v) = record.get_scalar("eval_return") {
            info!("episode {:>6}: eval_return = {:.4}", step, v);
        }
    }
    if let Some(path) = &args.csv {
        write_curve(&recorder, path)?;
    }

    Ok(())
}
