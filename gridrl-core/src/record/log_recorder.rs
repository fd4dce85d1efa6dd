use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Writes records through the `log` facade.
///
/// Stored records are aggregated with [`RecordStorage`] and emitted as a single
/// line at `info` level on flush.
#[derive(Default)]
pub struct LogRecorder {
    storage: RecordStorage,
}

impl LogRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn format(record: &Record) -> String {
        let mut items: Vec<String> = record
            .iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{} = {:.4}", k, v),
                RecordValue::DateTime(v) => format!("{} = {}", k, v),
                RecordValue::Array1(v) => format!("{} = {:?}", k, v),
                RecordValue::String(v) => format!("{} = {}", k, v),
            })
            .collect();
        items.sort();
        items.join(", ")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        info!("{}", Self::format(&record));
    }
}

impl AggregateRecorder for LogRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if !record.is_empty() {
            info!("[{}] {}", step, Self::format(&record));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_sorted() {
        let record = Record::from_slice(&[
            ("td_error", RecordValue::Scalar(0.25)),
            ("algo", RecordValue::String("sarsa".to_string())),
            ("probs", RecordValue::Array1(vec![0.5, 0.5])),
        ]);
        assert_eq!(
            LogRecorder::format(&record),
            "algo = sarsa, probs = [0.5, 0.5], td_error = 0.2500"
        );
    }

    #[test]
    fn test_flush_clears_storage() {
        let mut recorder = LogRecorder::new();
        recorder.store(Record::from_scalar("episode_return", 1.0));
        recorder.flush(1);
        assert!(recorder.storage.is_empty());
    }
}
