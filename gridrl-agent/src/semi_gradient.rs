//! Semi-gradient SARSA over a function approximator.
mod approximator;
mod base;
mod config;
pub use approximator::{FunctionApproximator, LinearApproximator};
pub use base::SemiGradientSarsa;
pub use config::SemiGradientConfig;
