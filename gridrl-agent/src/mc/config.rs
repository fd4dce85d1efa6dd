//! Configuration of Monte-Carlo prediction.
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Mc`](super::Mc).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct McConfig {
    /// Size of the action space.
    pub n_actions: usize,

    /// Discount factor.
    pub gamma: f64,

    /// Seed of the behaviour policy.
    pub seed: u64,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            n_actions: 4,
            gamma: 0.9,
            seed: 42,
        }
    }
}

impl McConfig {
    /// Sets the size of the action space.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`McConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of MC agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`McConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of MC agent into {}", path_.display());
        Ok(())
    }
}
