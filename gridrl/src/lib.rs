//! Tabular, policy-gradient and evolutionary reinforcement learning for
//! small discrete worlds.
//!
//! gridrl consists of the following crates:
//!
//! * [gridrl-core](gridrl_core) provides the environment and agent traits,
//!   state keys, lazily initialized state tables, action selection, records
//!   and the episodic [`Trainer`](gridrl_core::Trainer).
//! * [gridrl-agent](gridrl_agent) implements the learning rules: last-visit
//!   Monte-Carlo evaluation, SARSA, Q-learning (including a two-player
//!   variant), REINFORCE, one-step actor-critic, a clipped-surrogate policy
//!   update and semi-gradient SARSA over feature vectors.
//! * [gridrl-async-trainer](gridrl_async_trainer) runs A3C workers on their
//!   own threads against a shared, lock-free parameter store.
//! * [gridrl-evolution](gridrl_evolution) searches over whole policy tables
//!   with a generational gene pool.
//! * [gridrl-mcts](gridrl_mcts) plays two-player board games by
//!   Monte-Carlo tree search.
//!
//! This crate re-exports all of them; see `examples/` for runnable programs.
pub use gridrl_agent;
pub use gridrl_async_trainer;
pub use gridrl_core;
pub use gridrl_evolution;
pub use gridrl_mcts;
