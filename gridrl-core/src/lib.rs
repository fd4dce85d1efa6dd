#![warn(missing_docs)]
//! Core components of tabular reinforcement learning on grid worlds.
//!
//! States are identified by a [`StateKey`], per-state records live in a
//! [`StateTable`], actions are picked by an [`Explorer`] and transitions of
//! the current episode are kept in an [`EpisodeBuffer`]. Learning rules
//! implement [`Agent`] and are driven by [`Trainer`] on an [`Env`].
pub mod dummy;
pub mod error;
pub mod explorer;
pub mod record;
pub mod state;

mod base;
pub use base::{Agent, Configurable, Env, Policy, Step};

mod episode;
pub use episode::{EpisodeBuffer, ExperienceBufferBase, Transition};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod table;
pub use table::{EntryInit, StateEntry, StateTable};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig};

pub use error::GridRlError;
pub use explorer::Explorer;
pub use state::{FeatureVector, Featurizer, OneHotFeaturizer, RbfFeaturizer, StateKey};
