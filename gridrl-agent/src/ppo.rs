//! PPO agent with a clipped surrogate on tabular preferences.
mod base;
mod config;
pub use base::{Ppo, PpoStep};
pub use config::PpoConfig;
