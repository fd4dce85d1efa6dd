//! Types and traits for recording training metrics.
//!
//! Agents and the trainer produce [`Record`]s (key-value pairs of
//! [`RecordValue`]s). A [`Recorder`] writes them out as they come; an
//! [`AggregateRecorder`] stores them and writes min/max/mean/median summaries,
//! computed by [`RecordStorage`], on flush.
//!
//! ```rust
//! use gridrl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(1.0));
//! record.insert("episode_return", RecordValue::Scalar(-3.0));
//! record.insert("probs", RecordValue::Array1(vec![0.25, 0.75]));
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
