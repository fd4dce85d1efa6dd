//! Workers rolling out episodes against the shared parameters.
mod base;
mod stat;
pub use base::{n_step_returns, A3cWorker};
pub use stat::{worker_stats_fmt, WorkerStat};
