//! One-step Actor-Critic agent.
mod base;
mod config;
pub use base::ActorCritic;
pub use config::ActorCriticConfig;
