//! Fans file checks out to a pool of worker threads, or runs them serially.
//!
//! Workers share nothing but two channels: a job queue of filenames ending
//! in one stop sentinel per worker, and an event channel carrying finished
//! reports back. Configuration, plugins and the front end are read-only
//! snapshots handed to every worker before it starts.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use lintel_plugin::{Checkers, PluginSet};
use lintel_tokens::FrontEnd;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checker::{FileChecker, FileReport};
use crate::discovery::{self, STDIN};
use crate::style_guide::{ResultSink, StyleGuideManager};
use crate::{Interrupt, JobsArgument, LintelError, RunOptions};

/// How often the manager wakes up to look at the interrupt flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a cancelled run waits for busy workers.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Starts worker threads.
pub trait Spawner: Send + Sync {
    fn spawn(
        &self,
        name: String,
        work: Box<dyn FnOnce() + Send + 'static>,
    ) -> io::Result<JoinHandle<()>>;
}

/// Spawns plain OS threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(
        &self,
        name: String,
        work: Box<dyn FnOnce() + Send + 'static>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name(name).spawn(work)
    }
}

/// Returns true for OS errors that mean the machine is out of room for
/// another worker. These trigger a fallback to serial checking instead of
/// failing the run.
pub fn is_resource_exhaustion(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }
    #[cfg(unix)]
    {
        matches!(
            error.raw_os_error(),
            Some(libc::ENOMEM | libc::ENOSPC | libc::EAGAIN)
        )
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Totals over every checked file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub files: usize,
    pub tokens: usize,
    pub logical_lines: usize,
    pub physical_lines: usize,
}

enum Job {
    Check { index: usize, filename: String },
    Stop,
}

enum Event {
    Finished { index: usize, report: FileReport },
    Exited(usize),
}

/// Everything a worker needs, shared read-only.
#[derive(Clone)]
struct Snapshot {
    options: Arc<RunOptions>,
    checkers: Arc<Checkers>,
    front_end: Arc<dyn FrontEnd>,
}

impl Snapshot {
    fn check(&self, filename: &str) -> FileReport {
        FileChecker::new(filename, &self.checkers, &*self.front_end, &self.options).run_checks()
    }
}

/// A started pool, torn down on fallback or cancellation.
struct Pool {
    job_tx: Sender<Job>,
    job_rx: Receiver<Job>,
    event_rx: Receiver<Event>,
    handles: Vec<JoinHandle<()>>,
}

impl Pool {
    /// Withdraws queued jobs so workers stop after their current file.
    fn stop_issuing(&self) {
        let withdrawn = self.job_rx.try_iter().count();
        debug!("Withdrew {} queued jobs", withdrawn);
    }

    /// Stops the pool and waits for every worker.
    fn shutdown(self) {
        self.stop_issuing();
        drop(self.job_tx);
        for handle in self.handles {
            if handle.join().is_err() {
                warn!("A worker panicked while shutting down");
            }
        }
    }
}

/// Runs the file checks of one invocation.
pub struct Manager {
    snapshot: Snapshot,
    spawner: Arc<dyn Spawner>,
    interrupt: Interrupt,
    jobs: usize,
    filenames: Vec<String>,
    reports: Vec<FileReport>,
    statistics: RunStatistics,
}

impl Manager {
    /// Creates a manager for `plugins`, enabled according to `options`.
    pub fn new(options: Arc<RunOptions>, plugins: &PluginSet, front_end: Arc<dyn FrontEnd>) -> Self {
        let checkers = Arc::new(plugins.classify(&options.enable_extensions));
        let jobs = job_count(&options);
        Self {
            snapshot: Snapshot {
                options,
                checkers,
                front_end,
            },
            spawner: Arc::new(ThreadSpawner),
            interrupt: Interrupt::new(),
            jobs,
            filenames: Vec::new(),
            reports: Vec::new(),
            statistics: RunStatistics::default(),
        }
    }

    /// Replaces the way worker threads are started.
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Uses `interrupt` to cancel the run.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// The number of workers the run will use. 0 and 1 mean serial.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Expands `paths` into the files to check.
    pub fn make_checkers(&mut self, paths: &[String]) -> Result<(), LintelError> {
        let mut options = (*self.snapshot.options).clone();
        options.filenames = paths.to_vec();
        self.filenames = discovery::expand_paths(&options)?;
        self.jobs = self.jobs.min(self.filenames.len());
        Ok(())
    }

    /// Discovers the files named by the run options.
    pub fn start(&mut self) -> Result<(), LintelError> {
        info!("Making checkers");
        let paths = self.snapshot.options.filenames.clone();
        self.make_checkers(&paths)
    }

    /// Checks every discovered file.
    pub fn run(&mut self) -> Result<(), LintelError> {
        if self.jobs > 1 && self.filenames.len() > 1 {
            self.run_parallel()
        } else {
            self.run_serial()
        }
    }

    /// Checks every file on the calling thread.
    pub fn run_serial(&mut self) -> Result<(), LintelError> {
        let mut reports = Vec::with_capacity(self.filenames.len());
        for filename in &self.filenames {
            if self.interrupt.is_set() {
                warn!("Interrupted by the user");
                return Err(LintelError::EarlyQuit);
            }
            reports.push(self.snapshot.check(filename));
        }
        self.finish(reports);
        Ok(())
    }

    /// Checks files on a pool of `jobs` workers.
    ///
    /// If the OS refuses to start a worker for lack of resources, the pool
    /// is torn down and every file is checked serially instead.
    pub fn run_parallel(&mut self) -> Result<(), LintelError> {
        info!("Running checks with {} workers", self.jobs);
        let (job_tx, job_rx) = crossbeam_channel::bounded(self.filenames.len() + self.jobs);
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        for (index, filename) in self.filenames.iter().enumerate() {
            // The queue holds every job and sentinel, so sending never blocks.
            let _ = job_tx.try_send(Job::Check {
                index,
                filename: filename.clone(),
            });
        }
        for _ in 0..self.jobs {
            let _ = job_tx.try_send(Job::Stop);
        }

        let mut pool = Pool {
            job_tx,
            job_rx,
            event_rx,
            handles: Vec::with_capacity(self.jobs),
        };
        for id in 0..self.jobs {
            let work = self.worker(id, pool.job_rx.clone(), event_tx.clone());
            match self.spawner.spawn(format!("lintel-worker-{id}"), work) {
                Ok(handle) => pool.handles.push(handle),
                Err(e) if is_resource_exhaustion(&e) => {
                    warn!(
                        "Cannot start worker {}: {}. Running checks serially.",
                        id, e
                    );
                    pool.shutdown();
                    return self.run_serial();
                }
                Err(e) => {
                    pool.shutdown();
                    return Err(LintelError::Io(e));
                }
            }
        }
        drop(event_tx);

        let mut reports: Vec<Option<FileReport>> = self.filenames.iter().map(|_| None).collect();
        let mut exited = 0;
        while exited < pool.handles.len() {
            if self.interrupt.is_set() {
                return Err(self.cancel(pool, &mut reports));
            }
            match pool.event_rx.recv_timeout(POLL_INTERVAL) {
                Ok(Event::Finished { index, report }) => reports[index] = Some(report),
                Ok(Event::Exited(id)) => {
                    debug!("Worker {} exited", id);
                    exited += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        if self.interrupt.is_set() {
            return Err(self.cancel(pool, &mut reports));
        }
        for event in pool.event_rx.try_iter() {
            if let Event::Finished { index, report } = event {
                reports[index] = Some(report);
            }
        }
        pool.shutdown();

        let mut finished = Vec::with_capacity(reports.len());
        for (index, report) in reports.into_iter().enumerate() {
            let report = match report {
                Some(report) => report,
                None => {
                    let filename = &self.filenames[index];
                    warn!("No result for {} from the worker pool; checking it again", filename);
                    self.snapshot.check(filename)
                }
            };
            finished.push(report);
        }
        self.finish(finished);
        Ok(())
    }

    fn worker(
        &self,
        id: usize,
        jobs: Receiver<Job>,
        events: Sender<Event>,
    ) -> Box<dyn FnOnce() + Send + 'static> {
        let snapshot = self.snapshot.clone();
        let interrupt = self.interrupt.clone();
        Box::new(move || {
            debug!("Worker {} started", id);
            for job in jobs.iter() {
                let Job::Check { index, filename } = job else {
                    break;
                };
                if interrupt.is_set() {
                    break;
                }
                let report = snapshot.check(&filename);
                if events.send(Event::Finished { index, report }).is_err() {
                    break;
                }
            }
            let _ = events.send(Event::Exited(id));
        })
    }

    /// Stops a running pool after an interrupt: no new jobs are handed out,
    /// pending events are drained, and workers get a bounded grace period.
    fn cancel(&self, mut pool: Pool, reports: &mut [Option<FileReport>]) -> LintelError {
        warn!("Interrupted by the user; stopping workers");
        pool.stop_issuing();

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while pool.handles.iter().any(|handle| !handle.is_finished()) {
            for event in pool.event_rx.try_iter() {
                if let Event::Finished { index, report } = event {
                    reports[index] = Some(report);
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
        }

        let (finished, busy): (Vec<_>, Vec<_>) = std::mem::take(&mut pool.handles)
            .into_iter()
            .partition(|handle| handle.is_finished());
        if !busy.is_empty() {
            warn!("{} workers still busy; leaving them behind", busy.len());
        }
        pool.handles = finished;
        pool.shutdown();
        LintelError::EarlyQuit
    }

    fn finish(&mut self, reports: Vec<FileReport>) {
        let mut statistics = RunStatistics {
            files: reports.len(),
            ..RunStatistics::default()
        };
        for report in &reports {
            statistics.tokens += report.statistics.tokens;
            statistics.logical_lines += report.statistics.logical_lines;
            statistics.physical_lines += report.statistics.physical_lines;
        }
        self.statistics = statistics;
        self.reports = reports;
    }

    /// Per-file reports, in discovery order.
    pub fn reports(&self) -> &[FileReport] {
        &self.reports
    }

    /// Plugin failures that aborted a file.
    pub fn failures(&self) -> impl Iterator<Item = &LintelError> {
        self.reports
            .iter()
            .filter_map(|report| report.failure.as_ref())
    }

    pub fn statistics(&self) -> RunStatistics {
        self.statistics
    }

    /// Passes every finding to `guides`, file by file, sorted by line and
    /// column. Returns `(found, reported)`.
    pub fn report<S: ResultSink>(&mut self, guides: &mut StyleGuideManager<S>) -> (usize, usize) {
        let mut found = 0;
        let mut reported = 0;
        for report in &mut self.reports {
            report
                .results
                .sort_by_key(|result| (result.line, result.column));
            guides.prime_suppressions(&report.filename, report.block_suppressions.clone());
            for result in &report.results {
                reported += guides.handle_error(
                    &result.code,
                    &report.filename,
                    result.line,
                    result.column,
                    &result.text,
                    result.physical_line.clone(),
                );
            }
            found += report.results.len();
            guides.file_finished(&report.filename);
        }
        (found, reported)
    }
}

/// Resolves the worker count for `options`. 0 means serial.
fn job_count(options: &RunOptions) -> usize {
    if options.filenames.iter().any(|filename| filename == STDIN) {
        warn!("Parallel checking is not compatible with reading from stdin; running serially");
        return 0;
    }
    if options.diff {
        warn!("Parallel checking is not compatible with --diff; running serially");
        return 0;
    }
    if cfg!(target_family = "wasm") {
        return 0;
    }

    match options.jobs {
        JobsArgument::Auto => thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(0),
        JobsArgument::Fixed(n) => n,
    }
}
