//! Per-stage wall-clock timings.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
    step_map: HashMap<String, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        *self.step_map.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.steps.push(StepTiming { name, duration });
    }

    /// Folds another set of timings into this one, keeping first-seen step order.
    pub fn merge(&mut self, other: &PipelineTimings) {
        for step in &other.steps {
            match self.step_map.get_mut(&step.name) {
                Some(total) => {
                    *total += step.duration;
                    if let Some(existing) = self.steps.iter_mut().find(|s| s.name == step.name) {
                        existing.duration += step.duration;
                    }
                }
                None => self.add_step(step.name.clone(), step.duration),
            }
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (step.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            info!(
                "{:<16} {:>12.3}ms ({:>5.1}%)",
                step.name,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("{:<16} {:>12.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn stop(self) -> (&'static str, Duration) {
        (self.name, self.start.elapsed())
    }

    /// Stops the timer and records it.
    pub fn record(self, timings: &mut PipelineTimings) {
        let (name, duration) = self.stop();
        timings.add_step(name, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_accumulates_by_name() {
        let mut a = PipelineTimings::new();
        a.add_step("demosaic", Duration::from_millis(5));
        a.add_step("tone_map", Duration::from_millis(1));

        let mut b = PipelineTimings::new();
        b.add_step("demosaic", Duration::from_millis(3));
        b.add_step("encode_png", Duration::from_millis(2));

        a.merge(&b);
        assert_eq!(a.get_step("demosaic"), Some(Duration::from_millis(8)));
        assert_eq!(a.get_step("encode_png"), Some(Duration::from_millis(2)));
        assert_eq!(a.steps().len(), 3);
        assert_eq!(a.total_duration(), Duration::from_millis(11));
    }
}
