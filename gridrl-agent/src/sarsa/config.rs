//! Configuration of SARSA agent.
use anyhow::Result;
use gridrl_core::{EntryInit, Explorer};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Sarsa`](super::Sarsa) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SarsaConfig {
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

    /// Random seed.
    pub seed: u64,
}

impl Default for SarsaConfig {
    fn default() -> Self {
        Self {
            n_actions: 4,
            alpha: 0.1,
            gamma: 0.9,
            explorer: Explorer::default(),
            init: EntryInit::Zeros,
            seed: 42,
        }
    }
}

impl SarsaConfig {
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

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`SarsaConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of SARSA agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`SarsaConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of SARSA agent into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gridrl_core::explorer::EpsilonGreedy;
    use tempdir::TempDir;

    #[test]
    fn test_serde_sarsa_config() -> Result<()> {
        let config = SarsaConfig::default()
            .n_actions(2)
            .alpha(0.5)
            .gamma(1.0)
            .explorer(EpsilonGreedy::with_final_step(100))
            .init(EntryInit::Uniform { scale: 0.01 });

        let dir = TempDir::new("sarsa_config")?;
        let path = dir.path().join("sarsa_config.yaml");
        config.save(&path)?;
        let config_ = SarsaConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
