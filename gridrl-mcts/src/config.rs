//! Configuration of MCTS.
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Mcts`](crate::Mcts).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MctsConfig {
    /// Exploration constant `C` of UCT.
    pub exploration: f64,

    /// Maximum number of search iterations per decision.
    pub max_rollouts: usize,

    /// Wall-clock budget per decision in milliseconds, unlimited if `None`.
    pub time_budget_ms: Option<u64>,

    /// Random seed.
    pub seed: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: 1.414,
            max_rollouts: 1000,
            time_budget_ms: None,
            seed: 42,
        }
    }
}

impl MctsConfig {
    /// Sets the exploration constant.
    pub fn exploration(mut self, v: f64) -> Self {
        self.exploration = v;
        self
    }

    /// Sets the maximum number of iterations per decision.
    pub fn max_rollouts(mut self, v: usize) -> Self {
        self.max_rollouts = v;
        self
    }

    /// Sets the time budget per decision.
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.time_budget_ms = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`MctsConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of MCTS from {}", path_.display());
        Ok(b)
    }

    /// Saves [`MctsConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of MCTS into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_mcts_config() -> Result<()> {
        let config = MctsConfig::default()
            .max_rollouts(200)
            .time_budget_ms(Some(50));

        let dir = TempDir::new("mcts")?;
        let path = dir.path().join("mcts.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = MctsConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
