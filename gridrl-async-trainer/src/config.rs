//! Configuration of A3C.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`WorkerManager`](crate::WorkerManager) and its workers.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct A3cConfig {
    /// The number of worker threads.
    pub n_workers: usize,

    /// Size of the action space.
    pub n_actions: usize,

    /// Maximum length of a rollout.
    pub n_steps: usize,

    /// Discount factor.
    pub gamma: f64,

    /// Step size of the preferences.
    pub alpha_theta: f64,

    /// Step size of the state values.
    pub alpha_v: f64,

    /// Softmax temperature.
    pub temperature: f64,

    /// Reads of an entry that is being written are retried at most this many times.
    pub max_read_retries: usize,

    /// Sleep between read retries in microseconds.
    pub retry_backoff_micros: u64,

    /// The number of ticks run by [`WorkerManager::train`](crate::WorkerManager::train).
    pub max_ticks: usize,

    /// Interval of flushing records in ticks.
    pub flush_record_interval: usize,

    /// Base seed; worker `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for A3cConfig {
    fn default() -> Self {
        Self {
            n_workers: 8,
            n_actions: 4,
            n_steps: 5,
            gamma: 0.99,
            alpha_theta: 0.1,
            alpha_v: 0.1,
            temperature: 1.0,
            max_read_retries: 100,
            retry_backoff_micros: 10,
            max_ticks: 1000,
            flush_record_interval: 100,
            seed: 42,
        }
    }
}

impl A3cConfig {
    /// Sets the number of workers.
    pub fn n_workers(mut self, v: usize) -> Self {
        self.n_workers = v;
        self
    }

    /// Sets the size of the action space.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the maximum length of a rollout.
    pub fn n_steps(mut self, v: usize) -> Self {
        self.n_steps = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the step size of the preferences.
    pub fn alpha_theta(mut self, v: f64) -> Self {
        self.alpha_theta = v;
        self
    }

    /// Sets the step size of the state values.
    pub fn alpha_v(mut self, v: f64) -> Self {
        self.alpha_v = v;
        self
    }

    /// Sets the softmax temperature.
    pub fn temperature(mut self, v: f64) -> Self {
        self.temperature = v;
        self
    }

    /// Sets the read retry policy.
    pub fn read_retries(mut self, max_read_retries: usize, retry_backoff_micros: u64) -> Self {
        self.max_read_retries = max_read_retries;
        self.retry_backoff_micros = retry_backoff_micros;
        self
    }

    /// Sets the number of training ticks.
    pub fn max_ticks(mut self, v: usize) -> Self {
        self.max_ticks = v;
        self
    }

    /// Sets the interval of flushing records.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Sets the base seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`A3cConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`A3cConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_a3c_config() -> Result<()> {
        let config = A3cConfig::default()
            .n_workers(3)
            .n_steps(7)
            .read_retries(5, 100);
        let dir = TempDir::new("a3c_config")?;
        let path = dir.path().join("a3c_config.yaml");
        config.save(&path)?;
        assert_eq!(A3cConfig::load(&path)?, config);
        Ok(())
    }
}
