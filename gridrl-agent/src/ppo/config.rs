//! Configuration of PPO agent.
use anyhow::Result;
use gridrl_core::EntryInit;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ppo`](super::Ppo) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig {
    /// Size of the action space.
    pub n_actions: usize,

    /// Step size of the preferences.
    pub alpha: f64,

    /// Step size of the critic.
    pub alpha_v: f64,

    /// Discount factor.
    pub gamma: f64,

    /// Clipping range of the probability ratio.
    pub clip_eps: f64,

    /// The number of steps buffered before an update.
    pub horizon: usize,

    /// Softmax temperature.
    pub temperature: f64,

    /// States whose policy puts more than this probability on one action are
    /// not updated.
    pub deterministic_bound: f64,

    /// Initialization of unseen states.
    pub init: EntryInit,

    /// Random seed.
    pub seed: u64,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            n_actions: 4,
            alpha: 0.1,
            alpha_v: 0.1,
            gamma: 0.99,
            clip_eps: 0.2,
            horizon: 32,
            temperature: 1.0,
            deterministic_bound: 0.999999,
            init: EntryInit::Zeros,
            seed: 42,
        }
    }
}

impl PpoConfig {
    /// Sets the size of the action space.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the step size of the preferences.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
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

    /// Sets the clipping range.
    pub fn clip_eps(mut self, v: f64) -> Self {
        self.clip_eps = v;
        self
    }

    /// Sets the horizon.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Sets the softmax temperature.
    pub fn temperature(mut self, v: f64) -> Self {
        self.temperature = v;
        self
    }

    /// Sets the bound above which a policy counts as deterministic.
    pub fn deterministic_bound(mut self, v: f64) -> Self {
        self.deterministic_bound = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of PPO agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`PpoConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of PPO agent into {}", path_.display());
        Ok(())
    }
}
