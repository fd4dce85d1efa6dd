use std::time::Duration;

/// Stats of an [`A3cWorker`](crate::A3cWorker).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkerStat {
    /// Worker id.
    pub id: usize,

    /// The number of completed units of work.
    pub units: usize,

    /// The number of steps for interaction between worker and env.
    pub env_steps: usize,

    /// The number of finished episodes.
    pub episodes: usize,

    /// Return of the last finished episode.
    pub last_return: Option<f64>,

    /// Time spent in units of work.
    pub duration: Duration,
}

/// Returns a formatted string of the set of [`WorkerStat`] for reporting.
pub fn worker_stats_fmt(stats: &[WorkerStat]) -> String {
    let mut s = "worker id, units, env steps, episodes, duration [sec], steps per sec\n".to_string();
    for stat in stats.iter() {
        let d = stat.duration.as_secs_f32();
        let p = if d > 0.0 {
            stat.env_steps as f32 / d
        } else {
            0.0
        };
        s += format!(
            "{}, {}, {}, {}, {}, {}\n",
            stat.id, stat.units, stat.env_steps, stat.episodes, d, p
        )
        .as_str();
    }
    s
}
