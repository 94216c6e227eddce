//! Execution strategies: how the analyzer is mapped over a [`FileSet`].
//!
//! - [`SequentialOutcomes`] analyzes each path on the calling thread when the
//!   consumer pulls it. Single pass, lazy, bounded memory.
//! - [`WorkerPool`] runs a fixed number of worker threads, each with its own
//!   [`WorkerContext`] built once at startup. Jobs go through a shared queue
//!   and [`OrderedOutcomes`] hands results back in submission order.
//!
//! Both produce plain iterators of [`AnalysisOutcome`], so the sink does not
//! care which one is in use.

use crossbeam_channel::{Receiver, Sender};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::ExecutionStrategy;
use crate::error::ConfigError;
use crate::types::AnalysisOutcome;

use super::analyzer::analyze_image;
use super::context::{ContextFactory, WorkerContext};
use super::discovery::FileSet;

/// Lazily analyzes paths one at a time on the calling thread.
pub struct SequentialOutcomes<'a, I> {
    paths: I,
    ctx: &'a mut WorkerContext,
}

impl<'a, I> SequentialOutcomes<'a, I>
where
    I: Iterator<Item = PathBuf>,
{
    pub fn new(paths: I, ctx: &'a mut WorkerContext) -> Self {
        Self { paths, ctx }
    }
}

impl<I> Iterator for SequentialOutcomes<'_, I>
where
    I: Iterator<Item = PathBuf>,
{
    type Item = AnalysisOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(analyze_image(&path, self.ctx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// One unit of work: analyze `path` and reply with its submission index.
struct Job {
    index: usize,
    path: PathBuf,
    reply: Sender<(usize, AnalysisOutcome)>,
}

/// Fixed-size pool of analysis workers.
///
/// Each worker owns a [`WorkerContext`] for its whole lifetime and handles one
/// image at a time. Dropping the pool discards jobs nobody has started, closes
/// the queue and joins every worker once its current image is done.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    /// Pool-side handle on the queue, used to discard the backlog on drop.
    backlog: Receiver<Job>,
    handles: Vec<JoinHandle<()>>,
    detects_faces: bool,
}

impl WorkerPool {
    /// Spawn `workers` threads, each building its context with `factory`.
    ///
    /// Returns only after every worker has reported in. If any context fails
    /// to build, the pool is torn down and that error is returned.
    pub fn start<F>(workers: usize, factory: F) -> Result<Self, ConfigError>
    where
        F: Fn(usize) -> Result<WorkerContext, ConfigError> + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(ConfigError::WorkerStartup(
                "worker pool needs at least one worker".into(),
            ));
        }

        let factory = Arc::new(factory);
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(workers);

        let mut pool = Self {
            jobs: Some(job_tx),
            backlog: job_rx.clone(),
            handles: Vec::with_capacity(workers),
            detects_faces: false,
        };

        for worker_idx in 0..workers {
            let rx = job_rx.clone();
            let factory = Arc::clone(&factory);
            let ready: Sender<Result<bool, ConfigError>> = ready_tx.clone();

            let handle = thread::Builder::new()
                .name(format!("pixstat-worker-{worker_idx}"))
                .spawn(move || {
                    let mut ctx = match (*factory)(worker_idx) {
                        Ok(ctx) => {
                            let _ = ready.send(Ok(ctx.detects_faces()));
                            ctx
                        }
                        Err(e) => {
                            let _ = ready.send(Err(e));
                            return;
                        }
                    };
                    drop(ready);

                    for job in rx.iter() {
                        let outcome = analyze_image(&job.path, &mut ctx);
                        // A dropped consumer only means nobody wants the result.
                        let _ = job.reply.send((job.index, outcome));
                    }
                    tracing::debug!("Worker {} shutting down", worker_idx);
                })
                .map_err(|e| ConfigError::WorkerStartup(e.to_string()))?;
            pool.handles.push(handle);
        }

        drop(job_rx);
        drop(ready_tx);

        for _ in 0..workers {
            match ready_rx.recv() {
                Ok(Ok(detects_faces)) => pool.detects_faces |= detects_faces,
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(ConfigError::WorkerStartup(
                        "a worker exited before finishing initialization".into(),
                    ))
                }
            }
        }

        tracing::info!("Started {} analysis worker(s)", workers);
        Ok(pool)
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Whether the workers' contexts carry a face detector.
    pub fn detects_faces(&self) -> bool {
        self.detects_faces
    }

    /// Submit every path up front and return the results in input order.
    ///
    /// There is no backpressure: the whole input is enqueued before the
    /// first result is consumed.
    pub fn analyze<I>(&self, paths: I) -> OrderedOutcomes
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();
        let mut submitted = 0;

        if let Some(jobs) = &self.jobs {
            for (index, path) in paths.into_iter().enumerate() {
                let job = Job {
                    index,
                    path,
                    reply: reply_tx.clone(),
                };
                if jobs.send(job).is_err() {
                    tracing::error!("Worker pool closed; {} job(s) submitted", submitted);
                    break;
                }
                submitted += 1;
            }
        }

        OrderedOutcomes {
            results: reply_rx,
            expected: submitted,
            next: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.jobs.take();
        let discarded = self.backlog.try_iter().count();
        if discarded > 0 {
            tracing::debug!("Discarded {} queued job(s) on shutdown", discarded);
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Analysis worker panicked during shutdown");
            }
        }
    }
}

/// Results of [`WorkerPool::analyze`], yielded in submission order.
///
/// Workers finish out of order; early arrivals wait in a reorder buffer
/// until every result before them has been yielded.
pub struct OrderedOutcomes {
    results: Receiver<(usize, AnalysisOutcome)>,
    expected: usize,
    next: usize,
    pending: BTreeMap<usize, AnalysisOutcome>,
}

impl Iterator for OrderedOutcomes {
    type Item = AnalysisOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.expected {
            if let Some(outcome) = self.pending.remove(&self.next) {
                self.next += 1;
                return Some(outcome);
            }

            match self.results.recv() {
                Ok((index, outcome)) => {
                    self.pending.insert(index, outcome);
                }
                Err(_) => {
                    // Every job is gone; whatever never arrived is lost.
                    match self.pending.keys().next().copied() {
                        Some(index) => {
                            tracing::error!(
                                "No result for job(s) {}..{}; continuing",
                                self.next,
                                index
                            );
                            self.next = index;
                        }
                        None => {
                            tracing::error!(
                                "Worker pool stopped with {} result(s) outstanding",
                                self.expected - self.next
                            );
                            self.next = self.expected;
                        }
                    }
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.expected - self.next))
    }
}

/// The strategy chosen for a run, holding whatever state it needs.
pub enum Executor {
    Sequential(WorkerContext),
    Parallel(WorkerPool),
}

impl Executor {
    /// Build an executor whose contexts come from `factory`.
    ///
    /// Contexts (and their models) are built here, once per worker, so a bad
    /// model fails the run before any image is touched.
    pub fn new(
        strategy: ExecutionStrategy,
        workers: usize,
        factory: ContextFactory,
    ) -> Result<Self, ConfigError> {
        match strategy {
            ExecutionStrategy::Sequential => Ok(Self::Sequential((*factory)(0)?)),
            ExecutionStrategy::Parallel => {
                let pool = WorkerPool::start(workers, move |idx| (*factory)(idx))?;
                Ok(Self::Parallel(pool))
            }
        }
    }

    /// Whether records from this executor carry a face count.
    pub fn detects_faces(&self) -> bool {
        match self {
            Self::Sequential(ctx) => ctx.detects_faces(),
            Self::Parallel(pool) => pool.detects_faces(),
        }
    }

    /// Map the analyzer over `files`.
    pub fn outcomes(&mut self, files: FileSet) -> Box<dyn Iterator<Item = AnalysisOutcome> + '_> {
        match self {
            Self::Sequential(ctx) => Box::new(SequentialOutcomes::new(files.into_iter(), ctx)),
            Self::Parallel(pool) => Box::new(pool.analyze(files)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::detection::{FaceBox, FaceDetector};
    use crate::error::{AnalysisError, DetectionError};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps longer for small images so completion order differs from
    /// submission order.
    struct SlowOnSmall;

    impl FaceDetector for SlowOnSmall {
        fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectionError> {
            let delay = 60u64.saturating_sub(image.width() as u64);
            thread::sleep(Duration::from_millis(delay));
            Ok(vec![])
        }
    }

    fn write_images(dir: &Path, widths: &[u32]) -> Vec<PathBuf> {
        widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let path = dir.join(format!("img_{i:02}.png"));
                RgbImage::from_pixel(w, 10, Rgb([i as u8, 0, 0]))
                    .save_with_format(&path, ImageFormat::Png)
                    .unwrap();
                path
            })
            .collect()
    }

    fn filenames(outcomes: impl Iterator<Item = AnalysisOutcome>) -> Vec<String> {
        outcomes
            .filter_map(AnalysisOutcome::into_record)
            .map(|r| r.filename)
            .collect()
    }

    #[test]
    fn test_sequential_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_images(dir.path(), &[5, 6]);
        let mut ctx = WorkerContext::new();

        let mut outcomes = SequentialOutcomes::new(paths.into_iter(), &mut ctx);
        assert_eq!(outcomes.size_hint(), (2, Some(2)));
        assert!(outcomes.next().unwrap().is_success());
        assert_eq!(outcomes.size_hint(), (1, Some(1)));
        assert!(outcomes.next().unwrap().is_success());
        assert!(outcomes.next().is_none());
    }

    #[test]
    fn test_pool_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let widths: Vec<u32> = (1..=12).map(|i| i * 5).collect();
        let paths = write_images(dir.path(), &widths);
        let expected: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        let pool = WorkerPool::start(4, |_| {
            Ok(WorkerContext::with_detector(Box::new(SlowOnSmall)))
        })
        .unwrap();
        assert_eq!(pool.workers(), 4);

        assert_eq!(filenames(pool.analyze(paths)), expected);
    }

    #[test]
    fn test_pool_contains_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_images(dir.path(), &[4, 8]);
        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"nope").unwrap();
        paths.insert(1, corrupt);
        paths.push(dir.path().join("vanished.png"));

        let pool = WorkerPool::start(2, |_| Ok(WorkerContext::new())).unwrap();
        let outcomes: Vec<AnalysisOutcome> = pool.analyze(paths).collect();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_success());
        assert!(matches!(
            outcomes[1],
            AnalysisOutcome::Skipped(AnalysisError::UnreadableFile { .. })
        ));
        assert!(outcomes[2].is_success());
        assert!(matches!(
            outcomes[3],
            AnalysisOutcome::Skipped(AnalysisError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_pool_initializes_each_worker_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_images(dir.path(), &[3; 10]);
        let inits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&inits);
        let pool = WorkerPool::start(3, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(WorkerContext::new())
        })
        .unwrap();

        assert_eq!(pool.analyze(paths.clone()).count(), 10);
        assert_eq!(pool.analyze(paths).count(), 10);
        assert_eq!(inits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_pool_startup_failure_is_fatal() {
        let result = WorkerPool::start(3, |idx| {
            if idx == 1 {
                Err(ConfigError::ModelNotFound(PathBuf::from("missing.onnx")))
            } else {
                Ok(WorkerContext::new())
            }
        });
        assert!(matches!(result, Err(ConfigError::ModelNotFound(_))));
    }

    #[test]
    fn test_pool_rejects_zero_workers() {
        let result = WorkerPool::start(0, |_| Ok(WorkerContext::new()));
        assert!(matches!(result, Err(ConfigError::WorkerStartup(_))));
    }

    #[test]
    fn test_pool_empty_input() {
        let pool = WorkerPool::start(2, |_| Ok(WorkerContext::new())).unwrap();
        assert_eq!(pool.analyze(Vec::new()).count(), 0);
    }

    #[test]
    fn test_executor_strategies_agree() {
        let dir = tempfile::tempdir().unwrap();
        write_images(dir.path(), &[7, 3, 9, 1, 4]);
        let files = crate::pipeline::FileDiscovery::new(&["png"])
            .discover(dir.path())
            .unwrap();

        let mut config = Config::default();
        config.analyzer.strategy = ExecutionStrategy::Sequential;
        let mut sequential =
            Executor::new(config.analyzer.strategy, 1, WorkerContext::factory(&config)).unwrap();
        let seq = filenames(sequential.outcomes(files.clone()));

        config.analyzer.strategy = ExecutionStrategy::Parallel;
        config.analyzer.workers = 3;
        let mut parallel =
            Executor::new(config.analyzer.strategy, 3, WorkerContext::factory(&config)).unwrap();
        let par = filenames(parallel.outcomes(files));

        assert_eq!(seq.len(), 5);
        assert_eq!(seq, par);
    }

    /// Sleeps a fixed time per image.
    struct Slow(Duration);

    impl FaceDetector for Slow {
        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<FaceBox>, DetectionError> {
            thread::sleep(self.0);
            Ok(vec![])
        }
    }

    #[test]
    fn test_pool_drop_discards_queued_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_images(dir.path(), &[4]).remove(0);
        let analyzed = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&analyzed);
        let pool = WorkerPool::start(2, move |_| {
            Ok(WorkerContext::with_detector(Box::new(Counting {
                delay: Duration::from_millis(100),
                count: Arc::clone(&counter),
            })))
        })
        .unwrap();

        let mut outcomes = pool.analyze(vec![path; 40]);
        assert!(outcomes.next().unwrap().is_success());

        let start = std::time::Instant::now();
        drop(outcomes);
        drop(pool);

        // Two in-flight images at most, not the remaining backlog of 39
        assert!(start.elapsed() < Duration::from_secs(1), "{:?}", start.elapsed());
        assert!(analyzed.load(Ordering::SeqCst) <= 4);
    }

    /// Sleeps per image and counts how many it saw.
    struct Counting {
        delay: Duration,
        count: Arc<AtomicUsize>,
    }

    impl FaceDetector for Counting {
        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<FaceBox>, DetectionError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(vec![])
        }
    }

    #[test]
    fn test_executor_from_factory_reports_faces() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_images(dir.path(), &[6, 6, 6]);
        let files: FileSet = paths.into_iter().collect();

        for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::Parallel] {
            let factory: ContextFactory =
                Arc::new(|_: usize| -> Result<WorkerContext, ConfigError> {
                    Ok(WorkerContext::with_detector(Box::new(Slow(Duration::ZERO))))
                });
            let mut executor = Executor::new(strategy, 2, factory).unwrap();
            assert!(executor.detects_faces(), "{strategy:?}");

            let faces: Vec<_> = executor
                .outcomes(files.clone())
                .filter_map(AnalysisOutcome::into_record)
                .map(|r| r.num_of_faces)
                .collect();
            assert_eq!(faces, vec![Some(0); 3], "{strategy:?}");
        }

        let config = Config::default();
        let plain = Executor::new(
            ExecutionStrategy::Parallel,
            2,
            WorkerContext::factory(&config),
        )
        .unwrap();
        assert!(!plain.detects_faces());
    }
}
