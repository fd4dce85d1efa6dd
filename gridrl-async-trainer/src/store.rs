//! Global parameters shared by the workers.
use dashmap::DashMap;
use gridrl_core::StateKey;
use log::warn;
use std::{collections::HashMap, thread, time::Duration};

/// Preferences and value of one state as read from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamEntry {
    /// Action preferences.
    pub prefs: Vec<f64>,

    /// State value.
    pub value: f64,
}

/// Per-key deltas accumulated by a worker between two flushes.
#[derive(Clone, Debug, Default)]
pub struct ParameterDeltas {
    theta: HashMap<StateKey, Vec<f64>>,
    value: HashMap<StateKey, f64>,
}

impl ParameterDeltas {
    /// Delta of the preferences of `key`, created as zeros.
    pub fn theta_mut(&mut self, key: &StateKey, n_actions: usize) -> &mut Vec<f64> {
        self.theta
            .entry(key.clone())
            .or_insert_with(|| vec![0.0; n_actions])
    }

    /// Adds `d` to the value delta of `key`.
    pub fn add_value(&mut self, key: &StateKey, d: f64) {
        *self.value.entry(key.clone()).or_insert(0.0) += d;
    }

    /// Returns `true` if nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.theta.is_empty() && self.value.is_empty()
    }

    /// The number of states with a pending delta.
    pub fn len(&self) -> usize {
        self.theta.len().max(self.value.len())
    }
}

/// Concurrent maps of global preferences, values and visit counters.
///
/// Every map gives atomic per-key visibility but there is no transaction
/// across keys or maps: a reader may see the visit counter of a state bumped
/// by [`SharedParameterStore::register`] before its entries are inserted.
/// [`SharedParameterStore::read`] treats that case as a write in flight and
/// retries.
pub struct SharedParameterStore {
    theta: DashMap<StateKey, Vec<f64>>,
    value: DashMap<StateKey, f64>,
    visits: DashMap<StateKey, u64>,
    n_actions: usize,
    max_read_retries: usize,
    retry_backoff: Duration,
}

impl SharedParameterStore {
    /// Creates an empty store.
    pub fn new(n_actions: usize, max_read_retries: usize, retry_backoff_micros: u64) -> Self {
        Self {
            theta: DashMap::new(),
            value: DashMap::new(),
            visits: DashMap::new(),
            n_actions,
            max_read_retries,
            retry_backoff: Duration::from_micros(retry_backoff_micros),
        }
    }

    /// Size of the action space.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Marks a visit of `key`, inserting zero entries for an unseen state.
    ///
    /// The visit counter is bumped first.
    pub fn register(&self, key: &StateKey) {
        *self.visits.entry(key.clone()).or_insert(0) += 1;
        self.theta
            .entry(key.clone())
            .or_insert_with(|| vec![0.0; self.n_actions]);
        self.value.entry(key.clone()).or_insert(0.0);
    }

    fn try_read(&self, key: &StateKey) -> Option<ParamEntry> {
        let prefs = self.theta.get(key).map(|p| p.value().clone())?;
        let value = self.value.get(key).map(|v| *v.value())?;
        Some(ParamEntry { prefs, value })
    }

    /// Reads the entries of `key`.
    ///
    /// `None` means the state is unvisited. If an entry is missing while the
    /// visit counter is nonzero, the read is retried up to `max_read_retries`
    /// times with a warning per retry; after that the state is reported as
    /// unvisited.
    pub fn read(&self, key: &StateKey) -> Option<ParamEntry> {
        let mut retries = 0;
        loop {
            if let Some(entry) = self.try_read(key) {
                return Some(entry);
            }
            if self.visits(key) == 0 {
                return None;
            }
            if retries >= self.max_read_retries {
                warn!(
                    "Entry of {} still missing after {} retries, treated as unvisited",
                    key, retries
                );
                return None;
            }
            retries += 1;
            warn!("Entry of {} is being written, retry {}", key, retries);
            thread::sleep(self.retry_backoff);
        }
    }

    /// Reads the entries of `key`, registering the state if it is unvisited.
    pub fn read_or_register(&self, key: &StateKey) -> ParamEntry {
        match self.read(key) {
            Some(entry) => entry,
            None => {
                self.register(key);
                self.try_read(key).unwrap_or_else(|| ParamEntry {
                    prefs: vec![0.0; self.n_actions],
                    value: 0.0,
                })
            }
        }
    }

    /// Adds the deltas to the global maps key by key.
    pub fn apply(&self, deltas: &ParameterDeltas) {
        for (key, d) in deltas.theta.iter() {
            let mut prefs = self
                .theta
                .entry(key.clone())
                .or_insert_with(|| vec![0.0; self.n_actions]);
            for (p, d) in prefs.iter_mut().zip(d.iter()) {
                *p += d;
            }
        }
        for (key, d) in deltas.value.iter() {
            *self.value.entry(key.clone()).or_insert(0.0) += d;
        }
    }

    /// Preferences of `key` without retrying, for display.
    pub fn prefs(&self, key: &StateKey) -> Option<Vec<f64>> {
        self.theta.get(key).map(|p| p.value().clone())
    }

    /// Value of `key` without retrying, for display.
    pub fn value(&self, key: &StateKey) -> Option<f64> {
        self.value.get(key).map(|v| *v.value())
    }

    /// Visit counter of `key`.
    pub fn visits(&self, key: &StateKey) -> u64 {
        self.visits.get(key).map_or(0, |v| *v.value())
    }

    /// The number of states with preferences.
    pub fn len(&self) -> usize {
        self.theta.len()
    }

    /// Returns `true` if no state has been registered.
    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use test_log::test;

    #[test]
    fn test_register_and_read() {
        let store = SharedParameterStore::new(3, 0, 0);
        let s = StateKey::grid(0, 0);
        assert_eq!(store.read(&s), None);

        store.register(&s);
        store.register(&s);
        assert_eq!(store.visits(&s), 2);
        assert_eq!(
            store.read(&s),
            Some(ParamEntry {
                prefs: vec![0.0; 3],
                value: 0.0
            })
        );
    }

    #[test]
    fn test_missing_entry_with_visits_is_retried() {
        let store = SharedParameterStore::new(2, 3, 1);
        let s = StateKey::grid(1, 1);
        // A write in flight: the counter is visible, the entries are not.
        store.visits.insert(s.clone(), 1);
        assert_eq!(store.read(&s), None);

        let entry = store.read_or_register(&s);
        assert_eq!(entry.prefs, vec![0.0, 0.0]);
        assert_eq!(store.visits(&s), 2);
    }

    #[test]
    fn test_retry_sees_completed_write() {
        let store = Arc::new(SharedParameterStore::new(2, 10_000, 10));
        let s = StateKey::grid(2, 0);
        store.visits.insert(s.clone(), 1);

        let writer = {
            let store = store.clone();
            let s = s.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                store.theta.insert(s.clone(), vec![1.0, 2.0]);
                store.value.insert(s, 0.5);
            })
        };
        let entry = store.read(&s);
        writer.join().unwrap();
        assert_eq!(
            entry,
            Some(ParamEntry {
                prefs: vec![1.0, 2.0],
                value: 0.5
            })
        );
    }

    #[test]
    fn test_concurrent_apply() {
        let store = Arc::new(SharedParameterStore::new(2, 0, 0));
        let s = StateKey::grid(0, 0);
        let mut deltas = ParameterDeltas::default();
        deltas.theta_mut(&s, 2)[1] = 1.0;
        deltas.add_value(&s, 0.5);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let deltas = deltas.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.apply(&deltas);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.prefs(&s), Some(vec![0.0, 400.0]));
        assert_eq!(store.value(&s), Some(200.0));
    }
}
