use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::image_pipeline::batch::config::BatchConfig;
use crate::image_pipeline::batch::discovery::{ArchiveEntry, discover_archives};
use crate::image_pipeline::batch::report::BatchReport;
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::ConversionConfig;
use crate::image_pipeline::conversions::{ConversionTask, RawToSrgbPipeline, TaskOutcome};
use crate::image_pipeline::png::{ImageWriter, PngImageWriter};
use crate::image_pipeline::raw::{CaptureReader, NpzCaptureReader};

/// Lifecycle of a batch run.
///
/// `Idle → Enumerating → Dispatching → Draining → Completed | Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Enumerating,
    Dispatching,
    Draining,
    Completed,
    Aborted,
}

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One archive under one strategy: a single archive load feeding one
/// conversion per exposure key.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    pub archive: PathBuf,
    pub strategy: String,
    pub tasks: Vec<ConversionTask>,
}

pub struct BatchScheduler<R: CaptureReader, W: ImageWriter> {
    pipeline: RawToSrgbPipeline<R, W>,
    config: BatchConfig,
    interrupt: InterruptHandle,
    state: BatchState,
}

impl BatchScheduler<NpzCaptureReader, PngImageWriter> {
    pub fn new(conversion: ConversionConfig, config: BatchConfig) -> Self {
        Self::with_pipeline(RawToSrgbPipeline::new(conversion), config)
    }
}

impl<R, W> BatchScheduler<R, W>
where
    R: CaptureReader + Sync,
    W: ImageWriter + Sync,
{
    pub fn with_pipeline(pipeline: RawToSrgbPipeline<R, W>, config: BatchConfig) -> Self {
        Self {
            pipeline,
            config,
            interrupt: InterruptHandle::new(),
            state: BatchState::Idle,
        }
    }

    /// Replaces the scheduler's interrupt flag, e.g. with one wired to a
    /// signal handler.
    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    fn transition(&mut self, next: BatchState) {
        debug!(from = ?self.state, to = ?next, "Batch state");
        self.state = next;
    }

    /// Archive-major job list: every archive × every configured strategy.
    pub fn build_jobs(&self, archives: &[ArchiveEntry]) -> Vec<ArchiveJob> {
        let gamma = self.pipeline.config().gamma;
        archives
            .iter()
            .flat_map(|entry| {
                self.config.strategies.iter().map(move |strategy| ArchiveJob {
                    archive: entry.path.clone(),
                    strategy: strategy.clone(),
                    tasks: ConversionTask::for_archive(
                        &entry.path,
                        &entry.output_dir,
                        &self.config.exposure_keys,
                        strategy,
                        gamma,
                    ),
                })
            })
            .collect()
    }

    fn run_job(&self, job: &ArchiveJob) -> Vec<TaskOutcome> {
        if self.interrupt.is_interrupted() {
            return job.tasks.iter().cloned().map(TaskOutcome::Abandoned).collect();
        }

        info!("processing {} ({})", job.archive.display(), job.strategy);
        let capture = match self.pipeline.load_capture(&job.archive) {
            Ok(capture) => capture,
            Err(e) => return job.tasks.iter().map(|task| TaskOutcome::failed(task, &e)).collect(),
        };

        job.tasks
            .iter()
            .map(|task| {
                if self.interrupt.is_interrupted() {
                    TaskOutcome::Abandoned(task.clone())
                } else {
                    self.pipeline.execute(task, &capture)
                }
            })
            .collect()
    }

    /// Runs the whole batch.
    ///
    /// Task failures are collected into the report; only enumeration and pool
    /// start-up errors are returned as `Err`. An interrupt ends the run early
    /// with a report in the `Aborted` state.
    pub fn run(&mut self) -> Result<BatchReport> {
        let started = Instant::now();

        self.transition(BatchState::Enumerating);
        let archives = discover_archives(
            &self.config.input_root,
            &self.config.output_root,
            &self.config.archive_extension,
        )?;
        for entry in &archives {
            if let Err(e) = fs::create_dir_all(&entry.output_dir) {
                warn!("Couldn't create {}: {}", entry.output_dir.display(), e);
            }
        }

        self.transition(BatchState::Dispatching);
        let jobs = self.build_jobs(&archives);
        let workers = self.config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("srgb-worker-{i}"))
            .build()
            .map_err(|e| ConversionError::WorkerPoolError(e.to_string()))?;

        info!(
            archives = archives.len(),
            jobs = jobs.len(),
            conversions = jobs.iter().map(|j| j.tasks.len()).sum::<usize>(),
            workers,
            "Dispatching batch"
        );

        self.transition(BatchState::Draining);
        let outcomes: Vec<Vec<TaskOutcome>> =
            pool.install(|| jobs.par_iter().map(|job| self.run_job(job)).collect());

        let mut report = BatchReport::new(archives.len(), jobs.len());
        for outcome in outcomes.into_iter().flatten() {
            report.record(outcome);
        }

        let final_state = report.conclude(started.elapsed());
        self.transition(final_state);

        Ok(report)
    }
}
