use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClumpError;

/// The pipeline operation an engine run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Keep,
    Mutate,
    Sort,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Keep, Operation::Mutate, Operation::Sort];

    fn slot(self) -> usize {
        match self {
            Operation::Keep => 0,
            Operation::Mutate => 1,
            Operation::Sort => 2,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Keep => "keep",
            Operation::Mutate => "mutate",
            Operation::Sort => "sort",
        })
    }
}

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        op: Operation,
        input_records: usize,
    },
    ThrottleWaited {
        duration: Duration,
    },
    ChunkStarted {
        start_record: usize,
        record_count: usize,
    },
    ChunkFinished {
        output_records: usize,
    },
    RunFailed {
        op: Operation,
        error: ClumpError,
        elapsed: Duration,
    },
    RunFinished {
        op: Operation,
        output_records: usize,
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

impl fmt::Display for ExecutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionEvent::RunStarted { op, input_records } => {
                write!(f, "[{op}] started input_records={input_records}")
            }
            ExecutionEvent::ThrottleWaited { duration } => write!(f, "throttled for {duration:?}"),
            ExecutionEvent::ChunkStarted {
                start_record,
                record_count,
            } => write!(f, "chunk started at={start_record} records={record_count}"),
            ExecutionEvent::ChunkFinished { output_records } => {
                write!(f, "chunk finished output_records={output_records}")
            }
            ExecutionEvent::RunFailed { op, error, elapsed } => {
                write!(f, "[{op}] failed after {elapsed:?}: {error}")
            }
            ExecutionEvent::RunFinished {
                op,
                output_records,
                elapsed,
                metrics,
            } => write!(
                f,
                "[{op}] finished output_records={output_records} elapsed={elapsed:?} ({metrics})"
            ),
        }
    }
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Writes one line per event to stderr.
#[derive(Debug, Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        eprintln!("[clumper] {event}");
    }
}

/// Fans every event out to a list of observers.
#[derive(Default)]
pub struct CompositeExecutionObserver {
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl CompositeExecutionObserver {
    pub fn new(observers: Vec<Arc<dyn ExecutionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeExecutionObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeExecutionObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ExecutionObserver for CompositeExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Engine counters, readable at any time through [`ExecutionMetrics::snapshot`].
///
/// Record, chunk and timing counters describe the current (or most recent) run and are reset
/// when a run starts. Run counts per [`Operation`] and failures accumulate for the lifetime of
/// the engine.
pub struct ExecutionMetrics {
    runs: [AtomicU64; 3],
    failed_runs: AtomicU64,
    // 0 = no run yet, otherwise `Operation::slot() + 1`.
    current_op: AtomicU8,

    records_in: AtomicU64,
    records_out: AtomicU64,
    chunks: AtomicU64,
    throttle_wait_ns: AtomicU64,
    elapsed_ns: AtomicU64,

    active_chunks: AtomicUsize,
    max_active_chunks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            runs: std::array::from_fn(|_| AtomicU64::new(0)),
            failed_runs: AtomicU64::new(0),
            current_op: AtomicU8::new(0),
            records_in: AtomicU64::new(0),
            records_out: AtomicU64::new(0),
            chunks: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            active_chunks: AtomicUsize::new(0),
            max_active_chunks: AtomicUsize::new(0),
        }
    }

    pub(crate) fn begin_run(&self, op: Operation) {
        let _ = self.runs[op.slot()].fetch_add(1, Ordering::SeqCst);
        self.current_op.store(op.slot() as u8 + 1, Ordering::SeqCst);

        for counter in [&self.records_in, &self.records_out, &self.chunks, &self.throttle_wait_ns, &self.elapsed_ns] {
            counter.store(0, Ordering::SeqCst);
        }
        self.active_chunks.store(0, Ordering::SeqCst);
        self.max_active_chunks.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration, succeeded: bool) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
        if !succeeded {
            let _ = self.failed_runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// One input record was handled; `emitted` is false when it was filtered out.
    pub(crate) fn on_record(&self, emitted: bool) {
        let _ = self.records_in.fetch_add(1, Ordering::SeqCst);
        if emitted {
            let _ = self.records_out.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn on_chunk_start(&self) {
        let _ = self.chunks.fetch_add(1, Ordering::SeqCst);
        let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_end(&self) {
        let _ = self.active_chunks.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn on_throttle_wait(&self, d: Duration) {
        let _ = self.throttle_wait_ns.fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let runs = |op: Operation| self.runs[op.slot()].load(Ordering::SeqCst);
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let current = usize::from(self.current_op.load(Ordering::SeqCst));
        ExecutionMetricsSnapshot {
            op: current.checked_sub(1).and_then(|slot| Operation::ALL.get(slot).copied()),
            keep_runs: runs(Operation::Keep),
            mutate_runs: runs(Operation::Mutate),
            sort_runs: runs(Operation::Sort),
            failed_runs: self.failed_runs.load(Ordering::SeqCst),
            records_in: self.records_in.load(Ordering::SeqCst),
            records_out: self.records_out.load(Ordering::SeqCst),
            chunks: self.chunks.load(Ordering::SeqCst),
            max_active_chunks: self.max_active_chunks.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    /// Operation of the current or most recent run.
    pub op: Option<Operation>,
    pub keep_runs: u64,
    pub mutate_runs: u64,
    pub sort_runs: u64,
    pub failed_runs: u64,
    /// Records handed to the per-record step in this run.
    pub records_in: u64,
    /// Records the per-record step produced (kept, derived or keyed) in this run.
    pub records_out: u64,
    pub chunks: u64,
    pub max_active_chunks: usize,
    pub throttle_wait: Duration,
    pub elapsed: Option<Duration>,
}

impl ExecutionMetricsSnapshot {
    /// Records a `keep` filtered out, or that never produced output because the run failed.
    pub fn records_dropped(&self) -> u64 {
        self.records_in.saturating_sub(self.records_out)
    }

    pub fn total_runs(&self) -> u64 {
        self.keep_runs + self.mutate_runs + self.sort_runs
    }
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Some(op) => write!(f, "op={op}")?,
            None => f.write_str("op=none")?,
        }
        write!(
            f,
            ", runs keep/mutate/sort={}/{}/{} failed={}, records in={} out={} dropped={}, chunks={} max_active={}, throttle_wait={:?}, elapsed={:?}",
            self.keep_runs,
            self.mutate_runs,
            self.sort_runs,
            self.failed_runs,
            self.records_in,
            self.records_out,
            self.records_dropped(),
            self.chunks,
            self.max_active_chunks,
            self.throttle_wait,
            self.elapsed
        )
    }
}
