//! Monte-Carlo prediction.
mod base;
mod config;
pub use base::Mc;
pub use config::McConfig;
