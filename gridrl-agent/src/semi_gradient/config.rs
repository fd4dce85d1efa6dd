//! Configuration of semi-gradient SARSA.
use anyhow::Result;
use gridrl_core::Explorer;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`SemiGradientSarsa`](super::SemiGradientSarsa).
///
/// The step size belongs to the function approximator.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SemiGradientConfig {
    /// Discount factor.
    pub gamma: f64,

    /// Action selection.
    pub explorer: Explorer,

    /// Random seed.
    pub seed: u64,
}

impl Default for SemiGradientConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            explorer: Explorer::default(),
            seed: 42,
        }
    }
}

impl SemiGradientConfig {
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

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`SemiGradientConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of semi-gradient SARSA from {}", path_.display());
        Ok(b)
    }

    /// Saves [`SemiGradientConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of semi-gradient SARSA into {}", path_.display());
        Ok(())
    }
}
