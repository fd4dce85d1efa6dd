//! SARSA agent.
mod base;
mod config;
pub use base::Sarsa;
pub use config::SarsaConfig;
