//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum GridRlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// An action index outside of the action space.
    #[error("Action {act} is out of range for {n_actions} actions")]
    ActionOutOfRange {
        /// The offending action index.
        act: usize,
        /// Size of the action space.
        n_actions: usize,
    },

    /// Length of a feature vector does not match the input dimension of a model.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension expected by the consumer.
        expected: usize,
        /// Dimension actually given.
        actual: usize,
    },

    /// The top group of a gene pool is larger than the population.
    #[error("Top group of size {top_group} exceeds population of size {population}")]
    TopGroupTooLarge {
        /// Configured size of the top group.
        top_group: usize,
        /// Configured size of the population.
        population: usize,
    },

    /// A genome id that is not in the current population.
    #[error("Unknown genome: {0}")]
    UnknownGenome(u64),

    /// No legal action has positive probability.
    #[error("No selectable action")]
    NoSelectableAction,
}
