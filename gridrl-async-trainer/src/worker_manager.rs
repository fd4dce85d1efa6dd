//! A manager of [`A3cWorker`]s.
use crate::{worker_stats_fmt, A3cConfig, A3cWorker, SharedParameterStore, WorkerMessage, WorkerStat};
use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use gridrl_core::{
    record::{AggregateRecorder, Record, RecordValue},
    Env,
};
use log::{error, info};
use std::{marker::PhantomData, sync::Arc, thread::JoinHandle};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs [`A3cWorker`]s on threads and drives them in lock step.
///
/// Each worker thread blocks on its own channel until it receives a
/// [`WorkerMessage`]. [`WorkerManager::tick`] sends [`WorkerMessage::Tick`] to
/// every worker and waits for all of them to report a [`WorkerStat`];
/// [`WorkerManager::stop_and_join`] sends [`WorkerMessage::Stop`], upon which
/// each worker writes its pending deltas and exits.
///
/// ```mermaid
/// graph LR
///     M[WorkerManager]-->|WorkerMessage|W1[A3cWorker]
///     M-->|WorkerMessage|W2[A3cWorker]
///     W1-->|WorkerStat|M
///     W2-->|WorkerStat|M
///     W1<-->S[SharedParameterStore]
///     W2<-->S
/// ```
pub struct WorkerManager<E: Env> {
    config: A3cConfig,

    /// Configuration of [`Env`].
    env_config: E::Config,

    /// Global parameters.
    store: Arc<SharedParameterStore>,

    /// One sender per worker thread.
    senders: Vec<Sender<WorkerMessage>>,

    /// Stats reported by workers after each unit of work.
    stat_receiver: Option<Receiver<WorkerStat>>,

    /// Thread handles.
    threads: Vec<JoinHandle<WorkerStat>>,

    phantom: PhantomData<E>,
}

impl<E> WorkerManager<E>
where
    E: Env + Send + 'static,
{
    /// Builds a [`WorkerManager`] with an empty store.
    pub fn build(config: &A3cConfig, env_config: &E::Config) -> Self {
        let store = SharedParameterStore::new(
            config.n_actions,
            config.max_read_retries,
            config.retry_backoff_micros,
        );
        Self {
            config: config.clone(),
            env_config: env_config.clone(),
            store: Arc::new(store),
            senders: vec![],
            stat_receiver: None,
            threads: vec![],
            phantom: PhantomData,
        }
    }

    /// The shared parameters.
    pub fn store(&self) -> Arc<SharedParameterStore> {
        self.store.clone()
    }

    /// The number of running workers.
    pub fn n_workers(&self) -> usize {
        self.senders.len()
    }

    /// Builds the workers and spawns their threads.
    ///
    /// Environments are built on the calling thread, so a failure is reported
    /// here before any thread starts.
    pub fn run(&mut self) -> Result<()> {
        let workers = (0..self.config.n_workers)
            .map(|id| A3cWorker::<E>::build(id, &self.config, &self.env_config, self.store.clone()))
            .collect::<Result<Vec<_>>>()?;

        let (stat_sender, stat_receiver) = unbounded();
        self.stat_receiver = Some(stat_receiver);

        for worker in workers.into_iter() {
            let (s, r) = unbounded();
            let stat_sender = stat_sender.clone();
            self.senders.push(s);
            let handle = std::thread::spawn(move || Self::worker_loop(worker, r, stat_sender));
            self.threads.push(handle);
        }
        info!("Started {} workers", self.threads.len());
        Ok(())
    }

    fn worker_loop(
        mut worker: A3cWorker<E>,
        receiver: Receiver<WorkerMessage>,
        stat_sender: Sender<WorkerStat>,
    ) -> WorkerStat {
        loop {
            match receiver.recv() {
                Ok(WorkerMessage::Tick) => {
                    if let Err(e) = worker.run_unit() {
                        error!("Worker {} failed a unit of work: {}", worker.id(), e);
                    }
                    if stat_sender.send(worker.stat()).is_err() {
                        break;
                    }
                }
                Ok(WorkerMessage::Stop) | Err(_) => break,
            }
        }
        worker.flush();
        info!("Stopped worker {}", worker.id());
        worker.stat()
    }

    /// Lets every worker perform one unit of work and waits for all of them.
    ///
    /// Returns the stats sorted by worker id.
    pub fn tick(&self) -> Vec<WorkerStat> {
        let mut n_sent = 0;
        for s in self.senders.iter() {
            if s.send(WorkerMessage::Tick).is_ok() {
                n_sent += 1;
            }
        }

        let mut stats = Vec::with_capacity(n_sent);
        if let Some(r) = self.stat_receiver.as_ref() {
            for _ in 0..n_sent {
                match r.recv() {
                    Ok(stat) => stats.push(stat),
                    Err(_) => break,
                }
            }
        }
        stats.sort_by_key(|s| s.id);
        stats
    }

    /// Runs `max_ticks` ticks, storing aggregated worker stats in `recorder`.
    pub fn train(&mut self, recorder: &mut dyn AggregateRecorder) -> Result<Vec<WorkerStat>> {
        if self.threads.is_empty() {
            self.run()?;
        }
        let interval = self.config.flush_record_interval.max(1);
        let mut stats = vec![];

        for tick in 1..=self.config.max_ticks {
            stats = self.tick();
            recorder.store(Self::record(&stats));
            if tick % interval == 0 {
                info!("Tick {}, {} states in the store", tick, self.store.len());
                recorder.flush(tick as _);
            }
        }

        Ok(stats)
    }

    fn record(stats: &[WorkerStat]) -> Record {
        let env_steps: usize = stats.iter().map(|s| s.env_steps).sum();
        let episodes: usize = stats.iter().map(|s| s.episodes).sum();
        let returns: Vec<f64> = stats.iter().filter_map(|s| s.last_return).collect();
        let mut record = Record::from_slice(&[
            ("env_steps", RecordValue::Scalar(env_steps as f64)),
            ("episodes", RecordValue::Scalar(episodes as f64)),
        ]);
        if !returns.is_empty() {
            let mean = returns.iter().sum::<f64>() / returns.len() as f64;
            record.insert("episode_return", RecordValue::Scalar(mean));
        }
        record
    }

    /// Stops the workers and waits until all of them exit.
    pub fn stop_and_join(self) -> Vec<WorkerStat> {
        for s in self.senders.iter() {
            // A worker whose channel is closed has already exited.
            let _ = s.send(WorkerMessage::Stop);
        }

        let mut stats = vec![];
        for h in self.threads {
            match h.join() {
                Ok(stat) => stats.push(stat),
                Err(_) => error!("A worker thread panicked"),
            }
        }
        info!("\n{}", worker_stats_fmt(&stats));
        stats
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gridrl_core::{
        dummy::{Corridor, CorridorConfig},
        record::BufferedRecorder,
    };
    use test_log::test;

    fn config() -> A3cConfig {
        A3cConfig::default()
            .n_workers(4)
            .n_actions(2)
            .n_steps(5)
            .gamma(0.9)
            .alpha_theta(0.1)
            .alpha_v(0.1)
            .max_ticks(50)
            .flush_record_interval(10)
    }

    #[test]
    fn test_tick_reports_every_worker() -> Result<()> {
        let mut manager = WorkerManager::<Corridor>::build(&config(), &CorridorConfig::default());
        manager.run()?;
        assert_eq!(manager.n_workers(), 4);

        let stats = manager.tick();
        assert_eq!(stats.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(stats.iter().all(|s| s.units == 1 && s.env_steps >= 1));

        let stats = manager.stop_and_join();
        assert_eq!(stats.len(), 4);
        Ok(())
    }

    #[test]
    fn test_train_on_corridor() -> Result<()> {
        let mut manager = WorkerManager::<Corridor>::build(&config(), &CorridorConfig::default());
        let mut recorder = BufferedRecorder::new();
        manager.train(&mut recorder)?;
        let store = manager.store();
        let stats = manager.stop_and_join();

        assert!(stats.iter().all(|s| s.units == 50));
        assert!(stats.iter().map(|s| s.episodes).sum::<usize>() > 0);
        assert_eq!(recorder.flushed().len(), 5);

        // Every return in the corridor is non-negative and the goal is
        // reached from the cell next to it sooner or later.
        let v = store.value(&Corridor::key(2)).unwrap_or(0.0);
        assert!(v > 0.0);
        assert!(store.visits(&Corridor::key(0)) > 0);
        Ok(())
    }
}
