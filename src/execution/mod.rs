//! Parallel execution of per-record pipeline operations.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Chunked parallel `keep`, `mutate` and `sort` whose output is identical to the
//!   sequential methods on [`Clumper`] (same order, same tie-breaks, same first error)
//! - Resource limits / throttling (bounded in-flight chunks)
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{ClumpError, ClumpResult};
use crate::processing::sort;
use crate::types::{Clumper, Record, Value};

pub use observer::{
    CompositeExecutionObserver, ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver,
    Operation, StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of records per chunk. Also the size below which sorting stays sequential.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 4_096,
            max_in_flight_chunks: n.max(1),
        }
    }
}

impl ExecutionOptions {
    fn validate(&self) -> ClumpResult<()> {
        let invalid = |message: &str| {
            Err(ClumpError::InvalidOptions {
                message: message.to_string(),
            })
        };
        if self.chunk_size == 0 {
            return invalid("chunk_size must be > 0");
        }
        if self.max_in_flight_chunks == 0 {
            return invalid("max_in_flight_chunks must be > 0");
        }
        if self.num_threads == Some(0) {
            return invalid("num_threads must be > 0 when set");
        }
        Ok(())
    }
}

/// A configurable engine running [`Clumper`] operations on a dedicated thread pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`ClumpError::InvalidOptions`] if `chunk_size == 0`,
    /// `max_in_flight_chunks == 0` or `num_threads == Some(0)`.
    pub fn new(opts: ExecutionOptions) -> ClumpResult<Self> {
        opts.validate()?;

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| ClumpError::ThreadPool { message: e.to_string() })?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parallel [`Clumper::keep`].
    pub fn keep_parallel<F>(&self, clumper: &Clumper, predicate: F) -> ClumpResult<Clumper>
    where
        F: Fn(&Record) -> ClumpResult<bool> + Send + Sync,
    {
        self.run(Operation::Keep, clumper, || {
            let kept = self.process_chunks(clumper.records(), |record| {
                Ok(predicate(record)?.then(|| record.clone()))
            })?;
            Ok(Clumper::new(kept))
        })
    }

    /// Parallel single-field [`Clumper::mutate`]. Chain calls for several assignments; each
    /// call sees the fields set by the previous one.
    pub fn mutate_parallel<F>(&self, clumper: &Clumper, field: &str, deriver: F) -> ClumpResult<Clumper>
    where
        F: Fn(&Record) -> ClumpResult<Value> + Send + Sync,
    {
        self.run(Operation::Mutate, clumper, || {
            let derived = self.process_chunks(clumper.records(), |record| {
                let value = deriver(record)?;
                let mut out = record.clone();
                out.insert(field, value);
                Ok(Some(out))
            })?;
            Ok(Clumper::new(derived))
        })
    }

    /// Parallel [`Clumper::sort`]: keys are computed chunk-wise, then merged with the same
    /// stable merge sort the sequential path uses.
    pub fn sort_parallel<F>(&self, clumper: &Clumper, key: F, reverse: bool) -> ClumpResult<Clumper>
    where
        F: Fn(&Record) -> ClumpResult<Value> + Send + Sync,
    {
        self.run(Operation::Sort, clumper, || {
            let keys = self.process_chunks(clumper.records(), |record| key(record).map(Some))?;
            let order = par_merge_sort((0..keys.len()).collect(), &keys, reverse, self.opts.chunk_size)?;
            let records = clumper.records();
            Ok(order.into_iter().map(|i| records[i].clone()).collect())
        })
    }

    fn run<F>(&self, op: Operation, input: &Clumper, body: F) -> ClumpResult<Clumper>
    where
        F: FnOnce() -> ClumpResult<Clumper> + Send,
    {
        self.pool.install(|| {
            let start = Instant::now();
            self.metrics.begin_run(op);
            self.emit(ExecutionEvent::RunStarted {
                op,
                input_records: input.len(),
            });

            let result = body();

            let elapsed = start.elapsed();
            self.metrics.end_run(elapsed, result.is_ok());
            match &result {
                Ok(out) => self.emit(ExecutionEvent::RunFinished {
                    op,
                    output_records: out.len(),
                    elapsed,
                    metrics: self.metrics.snapshot(),
                }),
                Err(error) => self.emit(ExecutionEvent::RunFailed {
                    op,
                    error: error.clone(),
                    elapsed,
                }),
            }
            result
        })
    }

    /// Apply `per_record` to every record in throttled parallel chunks, keeping the `Some`
    /// outputs in record order. If any record fails, the error of the earliest failing
    /// record is returned.
    fn process_chunks<T, F>(&self, records: &[Record], per_record: F) -> ClumpResult<Vec<T>>
    where
        T: Send,
        F: Fn(&Record) -> ClumpResult<Option<T>> + Send + Sync,
    {
        let sem = Semaphore::new(self.opts.max_in_flight_chunks);

        let per_chunk: Vec<ClumpResult<Vec<T>>> = chunk_ranges(records.len(), self.opts.chunk_size)
            .into_par_iter()
            .map(|range| {
                let permit = sem.acquire();
                if permit.waited() > Duration::ZERO {
                    self.metrics.on_throttle_wait(permit.waited());
                    self.emit(ExecutionEvent::ThrottleWaited {
                        duration: permit.waited(),
                    });
                }

                self.metrics.on_chunk_start();
                self.emit(ExecutionEvent::ChunkStarted {
                    start_record: range.start,
                    record_count: range.len(),
                });

                let mut out = Vec::with_capacity(range.len());
                let result: ClumpResult<()> = records[range].iter().try_for_each(|record| {
                    let item = per_record(record)?;
                    self.metrics.on_record(item.is_some());
                    out.extend(item);
                    Ok(())
                });

                self.emit(ExecutionEvent::ChunkFinished {
                    output_records: out.len(),
                });
                self.metrics.on_chunk_end();
                result.map(|()| out)
            })
            .collect();

        let chunks = per_chunk.into_iter().collect::<ClumpResult<Vec<_>>>()?;
        Ok(chunks.into_iter().flatten().collect())
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Splits like the sequential merge sort so both paths perform the same comparisons.
fn par_merge_sort(
    mut order: Vec<usize>,
    keys: &[Value],
    reverse: bool,
    sequential_below: usize,
) -> ClumpResult<Vec<usize>> {
    if order.len() <= sequential_below {
        return sort::merge_sort(order, keys, reverse);
    }
    let right = order.split_off(order.len() / 2);
    let (left, right) = rayon::join(
        || par_merge_sort(order, keys, reverse, sequential_below),
        || par_merge_sort(right, keys, reverse, sequential_below),
    );
    sort::merge(&left?, &right?, keys, reverse)
}

fn chunk_ranges(record_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    (0..record_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(record_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{chunk_ranges, ExecutionEngine, ExecutionOptions};
    use crate::error::ClumpError;
    use crate::execution::{ExecutionEvent, ExecutionObserver, Operation};
    use crate::types::{Clumper, Record, Value};

    fn clumper_of_n(n: i64) -> Clumper {
        (0..n).map(|i| Record::from_iter([("id", i)])).collect()
    }

    fn engine(chunk_size: usize, max_in_flight_chunks: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            chunk_size,
            max_in_flight_chunks,
        })
        .unwrap()
    }

    #[test]
    fn chunk_ranges_cover_all_records() {
        assert!(chunk_ranges(0, 3).is_empty());
        assert_eq!(chunk_ranges(7, 3), vec![0..3, 3..6, 6..7]);
        assert_eq!(chunk_ranges(6, 3), vec![0..3, 3..6]);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let opts = ExecutionOptions {
            chunk_size: 0,
            ..Default::default()
        };
        let err = ExecutionEngine::new(opts).err().unwrap();
        assert!(matches!(err, ClumpError::InvalidOptions { .. }));

        let opts = ExecutionOptions {
            num_threads: Some(0),
            ..Default::default()
        };
        assert!(ExecutionEngine::new(opts).is_err());
    }

    #[test]
    fn keep_parallel_matches_sequential() {
        let c = clumper_of_n(1_000);
        let engine = engine(7, 4);
        let par = engine.keep_parallel(&c, |r| Ok(r.int("id")? % 3 == 0)).unwrap();
        let seq = c.keep(|r| Ok(r.int("id")? % 3 == 0)).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn mutate_parallel_runs_with_concurrency() {
        let c = clumper_of_n(400);
        let engine = engine(1, 4);

        let active = AtomicUsize::new(0);
        let max_active = AtomicUsize::new(0);

        let out = engine
            .mutate_parallel(&c, "next", |r| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(Value::from(r.int("id")? + 1))
            })
            .unwrap();

        assert_eq!(out.len(), c.len());
        assert_eq!(out.records()[10].int("next"), Ok(11));
        assert!(max_active.load(Ordering::SeqCst) > 1);
        // Source untouched
        assert!(c.iter().all(|r| !r.contains("next")));
    }

    #[test]
    fn first_error_in_record_order_wins() {
        let c = clumper_of_n(100);
        let engine = engine(5, 4);
        let err = engine
            .keep_parallel(&c, |r| {
                let id = r.int("id")?;
                if id >= 40 {
                    return Err(ClumpError::MissingField {
                        field: format!("f{id}"),
                    });
                }
                Ok(true)
            })
            .unwrap_err();
        assert_eq!(
            err,
            ClumpError::MissingField {
                field: "f40".to_string()
            }
        );
    }

    #[test]
    fn sort_parallel_is_stable_and_matches_sequential() {
        let c: Clumper = (0..500_i64)
            .map(|i| Record::from_iter([("k", Value::from(i % 7)), ("pos", Value::from(i))]))
            .collect();
        let engine = engine(16, 4);
        for reverse in [false, true] {
            let par = engine.sort_parallel(&c, |r| r.field("k").cloned(), reverse).unwrap();
            let seq = c.sort_by_field("k", reverse).unwrap();
            assert_eq!(par, seq);
        }
    }

    #[derive(Default)]
    struct ChunkCounter {
        active: AtomicUsize,
        max_active: AtomicUsize,
        failures: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for ChunkCounter {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    self.active.fetch_sub(1, Ordering::SeqCst);
                }
                ExecutionEvent::RunFailed { error, .. } => {
                    self.failures.lock().unwrap().push(error.to_string());
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_chunk_concurrency() {
        let c = clumper_of_n(100);
        let observer = Arc::new(ChunkCounter::default());
        let engine = engine(1, 1).with_observer(observer.clone());

        let out = engine
            .mutate_parallel(&c, "one", |_| {
                // Make each chunk take long enough to overlap if not throttled.
                std::thread::sleep(Duration::from_millis(1));
                Ok(Value::from(1))
            })
            .unwrap();

        assert_eq!(out.len(), c.len());
        assert_eq!(observer.max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_runs_are_reported_to_observer() {
        let c = clumper_of_n(10);
        let observer = Arc::new(ChunkCounter::default());
        let engine = engine(2, 2).with_observer(observer.clone());

        let _ = engine.keep_parallel(&c, |r| r.flag("id")).unwrap_err();
        let failures = observer.failures.lock().unwrap().clone();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("field 'id' expected boolean"));
    }

    #[test]
    fn metrics_are_available_after_run() {
        let c = clumper_of_n(60);
        let engine = engine(1, 1);
        let metrics = engine.metrics();

        let out = engine
            .mutate_parallel(&c, "x", |_| {
                std::thread::sleep(Duration::from_millis(2));
                Ok(Value::Null)
            })
            .unwrap();

        assert_eq!(out.len(), c.len());

        let snap = metrics.snapshot();
        assert_eq!(snap.op, Some(Operation::Mutate));
        assert_eq!(snap.mutate_runs, 1);
        assert_eq!(snap.records_in, c.len() as u64);
        assert_eq!(snap.records_out, c.len() as u64);
        assert_eq!(snap.chunks, c.len() as u64);
        assert_eq!(snap.max_active_chunks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn metrics_count_kept_and_dropped_records_per_operation() {
        let c = clumper_of_n(60);
        let engine = engine(8, 2);
        let metrics = engine.metrics();

        let kept = engine.keep_parallel(&c, |r| Ok(r.int("id")? % 3 == 0)).unwrap();
        let snap = metrics.snapshot();
        assert_eq!(kept.len(), 20);
        assert_eq!((snap.records_in, snap.records_out, snap.records_dropped()), (60, 20, 40));
        assert_eq!(snap.chunks, 8);

        engine.sort_parallel(&kept, |r| r.field("id").cloned(), true).unwrap();
        let _ = engine.keep_parallel(&c, |r| r.flag("id")).unwrap_err();
        let snap = metrics.snapshot();
        assert_eq!((snap.keep_runs, snap.mutate_runs, snap.sort_runs), (2, 0, 1));
        assert_eq!(snap.failed_runs, 1);
        assert_eq!(snap.op, Some(Operation::Keep));
    }
}
