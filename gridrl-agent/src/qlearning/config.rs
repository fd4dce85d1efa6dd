//! Configuration of Q-learning agent.
use anyhow::Result;
use gridrl_core::{EntryInit, Explorer};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`QLearning`](super::QLearning) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct QLearningConfig {
    /// Size of the action space.
    pub n_actions: usize,

    /// Step size.
    pub alpha: f64,

    /// Discount factor.
    pub gamma: f64,

    /// Action selection.
    pub explorer: Explorer,

    /// Initialization of unseen states.
    pub init: EntryInit,

    /// If `true`, bootstrapped targets are negated: the successor state
    /// belongs to the opponent in a shared (board, mover) table.
    pub two_player: bool,

    /// Random seed.
    pub seed: u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            n_actions: 4,
            alpha: 0.1,
            gamma: 0.9,
            explorer: Explorer::default(),
            init: EntryInit::Zeros,
            two_player: false,
            seed: 42,
        }
    }
}

impl QLearningConfig {
    /// Sets the size of the action space.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the step size.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: Explorer) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the initialization of unseen states.
    pub fn init(mut self, v: EntryInit) -> Self {
        self.init = v;
        self
    }

    /// Enables the two-player (negated target) variant.
    pub fn two_player(mut self, v: bool) -> Self {
        self.two_player = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`QLearningConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of Q-learning agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`QLearningConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of Q-learning agent into {}", path_.display());
        Ok(())
    }
}
