//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    record::{
        AggregateRecorder,
        RecordValue::{DateTime, Scalar},
    },
    Agent, Env, Evaluator,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::info;
pub use sampler::Sampler;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episodic training loop.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`], a recorder implementing
///    [`AggregateRecorder`] and an [`Evaluator`].
/// 1. Build [`Env`] and wrap it in a [`Sampler`]; set the agent to training mode.
/// 2. For `episode` in `1..=max_episodes`:
///     1. Repeat [`Sampler::sample_and_observe`] until the episode ends, i.e.,
///        the environment reaches a terminal state, the episode is truncated at
///        `max_steps_per_episode` or no action can be selected. Non-empty
///        records returned on the way are stored in the recorder.
///     2. Call [`Agent::end_episode`] and store its record together with
///        `episode_return` and `episode_length`.
///     3. If `episode % eval_interval == 0`, evaluate the agent in evaluation
///        mode and store the result as `"eval_return"` along with the local
///        time of the evaluation as `"datetime"`.
///     4. If `episode % flush_record_interval == 0`, flush the recorder.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action|B[Env]
///     B -->|StateKey, legal actions|A
///     B -->|Step|C[Sampler]
///     C -->|Transition|A
/// ```
pub struct Trainer<E: Env> {
    /// Configuration of the environment for training.
    env_config_train: E::Config,

    /// The number of training episodes.
    max_episodes: usize,

    /// Maximum length of an episode.
    max_steps_per_episode: usize,

    /// Interval of evaluation in episodes.
    eval_interval: usize,

    /// Interval of flushing records in episodes.
    flush_record_interval: usize,
}

impl<E: Env> Trainer<E> {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig, env_config_train: E::Config) -> Self {
        Self {
            env_config_train,
            max_episodes: config.max_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            eval_interval: config.eval_interval,
            flush_record_interval: config.flush_record_interval.max(1),
        }
    }

    /// Runs one episode to its end and returns its return.
    pub fn train_episode<A: Agent>(
        &mut self,
        agent: &mut A,
        sampler: &mut Sampler<E>,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<f64> {
        loop {
            let (mut record, done) = sampler.sample_and_observe(agent)?;
            if done {
                record.merge_inplace(agent.end_episode());
                let ret = record.get_scalar("episode_return")?;
                recorder.store(record);
                return Ok(ret);
            }
            if !record.is_empty() {
                recorder.store(record);
            }
        }
    }

    /// Train the agent.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent,
        D: Evaluator<E>,
    {
        let env = E::build(&self.env_config_train, 0)?;
        let mut sampler = Sampler::new(env, self.max_steps_per_episode);
        agent.train();

        for episode in 1..=self.max_episodes {
            self.train_episode(agent, &mut sampler, recorder)?;

            if self.eval_interval > 0 && episode % self.eval_interval == 0 {
                info!("Starts evaluation of the agent at episode {}", episode);
                agent.eval();
                let record = evaluator.evaluate(agent)?;
                agent.train();
                if let Ok(eval_return) = record.get_scalar("eval_return") {
                    info!("eval_return = {:.4}", eval_return);
                }
                let mut record = record;
                record.insert("episode", Scalar(episode as f64));
                record.insert("datetime", DateTime(Local::now()));
                recorder.store(record);
            }

            if episode % self.flush_record_interval == 0 {
                recorder.flush(episode as _);
            }
        }

        Ok(())
    }
}
