//! Asynchronous advantage actor-critic (A3C) on tabular preferences.
//!
//! Several [`A3cWorker`]s run on their own threads, each with its own
//! environment. They read the global preferences and state values from a
//! [`SharedParameterStore`] and write their accumulated deltas back to it at
//! the start of their next unit of work, never mid-rollout.
//!
//! # Messages
//! * From [`WorkerManager`] to workers: [`WorkerMessage`]
//! * From workers to [`WorkerManager`]: [`WorkerStat`] after every unit
mod config;
mod messages;
mod policy;
mod store;
mod worker;
mod worker_manager;
pub use config::A3cConfig;
pub use messages::WorkerMessage;
pub use policy::A3cPolicy;
pub use store::{ParamEntry, ParameterDeltas, SharedParameterStore};
pub use worker::{n_step_returns, worker_stats_fmt, A3cWorker, WorkerStat};
pub use worker_manager::WorkerManager;
