use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::image_pipeline::batch::scheduler::BatchState;
use crate::image_pipeline::common::error::ErrorKind;
use crate::image_pipeline::conversions::{TaskFailure, TaskOutcome};
use crate::image_pipeline::timing::PipelineTimings;

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub state: BatchState,
    pub archives: usize,
    /// Archive × strategy jobs handed to the pool
    pub jobs_dispatched: usize,
    /// Files written
    pub successes: Vec<PathBuf>,
    pub failures: Vec<TaskFailure>,
    /// Conversions never started because of an interrupt
    pub abandoned: usize,
    /// Stage timings summed over successful conversions
    pub timings: PipelineTimings,
    pub elapsed: Duration,
}

impl BatchReport {
    pub(crate) fn new(archives: usize, jobs_dispatched: usize) -> Self {
        Self {
            state: BatchState::Draining,
            archives,
            jobs_dispatched,
            successes: Vec::new(),
            failures: Vec::new(),
            abandoned: 0,
            timings: PipelineTimings::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Succeeded(success) => {
                self.timings.merge(&success.timings);
                self.successes.push(success.output_path);
            }
            TaskOutcome::Failed(failure) => self.failures.push(failure),
            TaskOutcome::Abandoned(_) => self.abandoned += 1,
        }
    }

    /// Fixes the final state once every outcome is recorded. An interrupt that
    /// lands after the last conversion started leaves the run `Completed`.
    pub(crate) fn conclude(&mut self, elapsed: Duration) -> BatchState {
        self.state = if self.abandoned > 0 {
            BatchState::Aborted
        } else {
            BatchState::Completed
        };
        self.elapsed = elapsed;
        self.state
    }

    /// Conversions that ran to an outcome, successful or not.
    pub fn finished(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// True when the run was interrupted; outputs of conversions in flight at
    /// that moment may be truncated or missing.
    pub fn is_partial(&self) -> bool {
        self.state == BatchState::Aborted
    }

    pub fn failures_by_kind(&self) -> HashMap<ErrorKind, usize> {
        let mut counts = HashMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn log_summary(&self) {
        info!(
            state = ?self.state,
            archives = self.archives,
            jobs = self.jobs_dispatched,
            succeeded = self.successes.len(),
            failed = self.failures.len(),
            abandoned = self.abandoned,
            "Batch finished in {:.2}s",
            self.elapsed.as_secs_f64()
        );
        for failure in &self.failures {
            warn!(
                archive = %failure.archive.display(),
                exposure_key = %failure.exposure_key,
                strategy = %failure.strategy,
                kind = %failure.kind,
                "{}",
                failure.message
            );
        }
        if self.is_partial() {
            warn!("Run was interrupted; files written by in-flight conversions must not be trusted");
        }
        self.timings.log_summary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::common::error::ConversionError;
    use crate::image_pipeline::conversions::ConversionTask;
    use crate::image_pipeline::raw::ExposureKey;
    use std::path::Path;

    #[test]
    fn test_record_counts_each_outcome_kind() {
        let out = Path::new("out");
        let task = ConversionTask::new("a.npz", out, ExposureKey::Hdr, "grayworld", 2.2);
        let mut report = BatchReport::new(1, 1);

        report.record(TaskOutcome::Succeeded(crate::image_pipeline::conversions::TaskSuccess {
            output_path: task.output_path.clone(),
            timings: PipelineTimings::new(),
        }));
        report.record(TaskOutcome::Failed(task.failure(&ConversionError::MissingRecord("sht".into()))));
        report.record(TaskOutcome::Failed(task.failure(&ConversionError::InvalidGamma(0.0))));
        report.record(TaskOutcome::Abandoned(task.clone()));

        assert_eq!(report.finished(), 3);
        assert_eq!(report.abandoned, 1);
        let kinds = report.failures_by_kind();
        assert_eq!(kinds[&ErrorKind::Data], 1);
        assert_eq!(kinds[&ErrorKind::Configuration], 1);
        assert!(!report.is_partial());
    }

    #[test]
    fn test_conclude_aborts_only_when_work_was_abandoned() {
        let task = ConversionTask::new("a.npz", Path::new("out"), ExposureKey::Mid, "none", 2.2);

        let mut complete = BatchReport::new(1, 1);
        complete.record(TaskOutcome::Failed(task.failure(&ConversionError::MissingRecord("mid".into()))));
        assert_eq!(complete.conclude(Duration::from_millis(3)), BatchState::Completed);
        assert!(!complete.is_partial());
        assert_eq!(complete.elapsed, Duration::from_millis(3));

        let mut cut_short = BatchReport::new(1, 1);
        cut_short.record(TaskOutcome::Abandoned(task));
        assert_eq!(cut_short.conclude(Duration::ZERO), BatchState::Aborted);
        assert!(cut_short.is_partial());
    }
}
