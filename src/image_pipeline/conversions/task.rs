use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::image_pipeline::common::error::{ConversionError, ErrorKind};
use crate::image_pipeline::raw::ExposureKey;
use crate::image_pipeline::timing::PipelineTimings;

/// One exposure of one archive, rendered under one strategy and gamma.
///
/// Consumed exactly once; nothing is kept for retries.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionTask {
    pub archive_path: PathBuf,
    pub exposure_key: ExposureKey,
    pub gamma: f32,
    /// Strategy name as configured; parsed when the task runs
    pub strategy: String,
    pub output_path: PathBuf,
}

impl ConversionTask {
    pub fn new(
        archive_path: impl Into<PathBuf>,
        output_dir: &Path,
        exposure_key: ExposureKey,
        strategy: impl Into<String>,
        gamma: f32,
    ) -> Self {
        let archive_path = archive_path.into();
        let strategy = strategy.into();
        let output_path = Self::output_path_for(output_dir, &archive_path, exposure_key, &strategy);
        Self {
            archive_path,
            exposure_key,
            gamma,
            strategy,
            output_path,
        }
    }

    /// One task per exposure key of an archive.
    pub fn for_archive(
        archive_path: &Path,
        output_dir: &Path,
        keys: &[ExposureKey],
        strategy: &str,
        gamma: f32,
    ) -> Vec<Self> {
        keys.iter()
            .map(|&key| Self::new(archive_path, output_dir, key, strategy, gamma))
            .collect()
    }

    /// `<output_dir>/<key>/<archive stem>_wb_<strategy>.png`
    pub fn output_path_for(
        output_dir: &Path,
        archive_path: &Path,
        exposure_key: ExposureKey,
        strategy: &str,
    ) -> PathBuf {
        output_dir
            .join(exposure_key.as_str())
            .join(format!("{}_wb_{}.png", archive_base_name(archive_path), strategy))
    }

    pub fn failure(&self, err: &ConversionError) -> TaskFailure {
        TaskFailure {
            archive: self.archive_path.clone(),
            exposure_key: self.exposure_key,
            strategy: self.strategy.clone(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Archive file name without its extension.
pub fn archive_base_name(archive_path: &Path) -> String {
    archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct TaskSuccess {
    pub output_path: PathBuf,
    pub timings: PipelineTimings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub archive: PathBuf,
    pub exposure_key: ExposureKey,
    pub strategy: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Succeeded(TaskSuccess),
    Failed(TaskFailure),
    /// Never started because the batch was interrupted.
    Abandoned(ConversionTask),
}

impl TaskOutcome {
    pub fn succeeded(task: &ConversionTask, timings: PipelineTimings) -> Self {
        info!("wrote {}", task.output_path.display());
        TaskOutcome::Succeeded(TaskSuccess {
            output_path: task.output_path.clone(),
            timings,
        })
    }

    pub fn failed(task: &ConversionTask, err: &ConversionError) -> Self {
        error!(
            archive = %task.archive_path.display(),
            exposure_key = %task.exposure_key,
            strategy = %task.strategy,
            kind = %err.kind(),
            "couldn't process: {}",
            err
        );
        TaskOutcome::Failed(task.failure(err))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }
}
