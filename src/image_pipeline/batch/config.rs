use std::path::{Path, PathBuf};

use crate::image_pipeline::raw::ExposureKey;
use crate::image_pipeline::white_balance::WhiteBalanceStrategy;

pub const DEFAULT_ARCHIVE_EXTENSION: &str = "npz";

/// What a batch run covers and how wide it runs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Strategy names; each archive is converted once per entry
    pub strategies: Vec<String>,
    pub exposure_keys: Vec<ExposureKey>,
    /// Worker threads; `None` uses the host's available parallelism
    pub workers: Option<usize>,
    /// Extension (without dot) of the archive files to pick up
    pub archive_extension: String,
}

impl BatchConfig {
    pub fn builder(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> BatchConfigBuilder {
        BatchConfigBuilder {
            input_root: input_root.into(),
            output_root: output_root.into(),
            strategies: None,
            exposure_keys: None,
            workers: None,
            archive_extension: None,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

/// Builder for BatchConfig
pub struct BatchConfigBuilder {
    input_root: PathBuf,
    output_root: PathBuf,
    strategies: Option<Vec<String>>,
    exposure_keys: Option<Vec<ExposureKey>>,
    workers: Option<usize>,
    archive_extension: Option<String>,
}

impl BatchConfigBuilder {
    pub fn strategies<I, S>(mut self, strategies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategies = Some(strategies.into_iter().map(Into::into).collect());
        self
    }

    pub fn exposure_keys(mut self, keys: impl IntoIterator<Item = ExposureKey>) -> Self {
        self.exposure_keys = Some(keys.into_iter().collect());
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = Some(extension.into());
        self
    }

    pub fn build(self) -> BatchConfig {
        BatchConfig {
            input_root: self.input_root,
            output_root: self.output_root,
            strategies: self.strategies.unwrap_or_else(|| {
                WhiteBalanceStrategy::ALL.iter().map(|s| s.as_str().to_string()).collect()
            }),
            exposure_keys: self.exposure_keys.unwrap_or_else(|| ExposureKey::ALL.to_vec()),
            workers: self.workers,
            archive_extension: self
                .archive_extension
                .unwrap_or_else(|| DEFAULT_ARCHIVE_EXTENSION.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_both_strategies_and_all_keys() {
        let config = BatchConfig::builder("in", "out").build();
        assert_eq!(config.strategies, vec!["grayworld", "none"]);
        assert_eq!(config.exposure_keys, ExposureKey::ALL.to_vec());
        assert_eq!(config.archive_extension, "npz");
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_explicit_workers() {
        let config = BatchConfig::builder("in", "out")
            .strategies(["grayworld"])
            .workers(3)
            .build();
        assert_eq!(config.strategies, vec!["grayworld"]);
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn test_zero_workers_falls_back_to_host() {
        let config = BatchConfig::builder("in", "out").workers(0).build();
        assert!(config.worker_count() >= 1);
    }
}
