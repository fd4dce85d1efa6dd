/// Messages that workers receive from [`WorkerManager`](crate::WorkerManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Perform one unit of work: flush pending deltas, roll out and
    /// accumulate new deltas.
    Tick,

    /// Flush pending deltas and exit the worker loop.
    Stop,
}
