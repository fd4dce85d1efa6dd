//! Configuration of Actor-Critic agent.
use anyhow::Result;
use gridrl_core::EntryInit;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ActorCritic`](super::ActorCritic) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig {
    /// Size of the action space.
    pub n_actions: usize,

    /// Step size of the actor.
    pub alpha_theta: f64,

    /// Step size of the critic.
    pub alpha_v: f64,

    /// Discount factor.
    pub gamma: f64,

    /// Softmax temperature.
    pub temperature: f64,

    /// Initialization of unseen states.
    pub init: EntryInit,

    /// Random seed.
    pub seed: u64,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            n_actions: 4,
            alpha_theta: 0.1,
            alpha_v: 0.1,
            gamma: 0.99,
            temperature: 1.0,
            init: EntryInit::Zeros,
            seed: 42,
        }
    }
}

impl ActorCriticConfig {
    /// Sets the size of the action space.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the step size of the actor.
    pub fn alpha_theta(mut self, v: f64) -> Self {
        self.alpha_theta = v;
        self
    }

    /// Sets the step size of the critic.
    pub fn alpha_v(mut self, v: f64) -> Self {
        self.alpha_v = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the softmax temperature.
    pub fn temperature(mut self, v: f64) -> Self {
        self.temperature = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of Actor-Critic agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`ActorCriticConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of Actor-Critic agent into {}", path_.display());
        Ok(())
    }
}
