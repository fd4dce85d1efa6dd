//! Configuration of the gene pool and the evolution agent.
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`GenePool`](crate::GenePool).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GenePoolConfig {
    /// Number of genomes in every generation.
    pub population_size: usize,

    /// Number of best genomes carried over and used as parents.
    pub top_group_size: usize,

    /// Probability that a state's preference vector is perturbed by mutation.
    pub mutation_rate: f64,

    /// Standard deviation of the mutation noise.
    pub mutation_sigma: f64,

    /// Size of the action space.
    pub n_actions: usize,

    /// Random entries are drawn uniformly from `[-init_scale, init_scale)`.
    pub init_scale: f64,

    /// Random seed.
    pub seed: u64,
}

impl Default for GenePoolConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            top_group_size: 5,
            mutation_rate: 0.1,
            mutation_sigma: 0.5,
            n_actions: 4,
            init_scale: 1.0,
            seed: 42,
        }
    }
}

impl GenePoolConfig {
    /// Sets the population size.
    pub fn population_size(mut self, v: usize) -> Self {
        self.population_size = v;
        self
    }

    /// Sets the size of the top group.
    pub fn top_group_size(mut self, v: usize) -> Self {
        self.top_group_size = v;
        self
    }

    /// Sets the mutation rate and noise.
    pub fn mutation(mut self, rate: f64, sigma: f64) -> Self {
        self.mutation_rate = rate;
        self.mutation_sigma = sigma;
        self
    }

    /// Sets the size of the action space.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the scale of random entries.
    pub fn init_scale(mut self, v: f64) -> Self {
        self.init_scale = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`GenePoolConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of gene pool from {}", path_.display());
        Ok(b)
    }

    /// Saves [`GenePoolConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of gene pool into {}", path_.display());
        Ok(())
    }
}

/// Configuration of [`EvolutionAgent`](crate::EvolutionAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EvolutionConfig {
    /// Configuration of the underlying gene pool.
    pub pool: GenePoolConfig,

    /// Number of episodes each genome is evaluated for.
    pub episodes_per_genome: usize,

    /// Softmax temperature used when sampling from a genome.
    pub temperature: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            pool: GenePoolConfig::default(),
            episodes_per_genome: 1,
            temperature: 1.0,
        }
    }
}

impl EvolutionConfig {
    /// Sets the configuration of the gene pool.
    pub fn pool(mut self, v: GenePoolConfig) -> Self {
        self.pool = v;
        self
    }

    /// Sets the length of the evaluation window in episodes.
    pub fn episodes_per_genome(mut self, v: usize) -> Self {
        self.episodes_per_genome = v;
        self
    }

    /// Sets the softmax temperature.
    pub fn temperature(mut self, v: f64) -> Self {
        self.temperature = v;
        self
    }

    /// Loads [`EvolutionConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of evolution agent from {}", path_.display());
        Ok(b)
    }

    /// Saves [`EvolutionConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of evolution agent into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_evolution_config() -> Result<()> {
        let config = EvolutionConfig::default()
            .pool(
                GenePoolConfig::default()
                    .population_size(20)
                    .top_group_size(4)
                    .mutation(0.2, 0.1)
                    .n_actions(2),
            )
            .episodes_per_genome(3);

        let dir = TempDir::new("evolution")?;
        let path = dir.path().join("evolution.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = EvolutionConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
