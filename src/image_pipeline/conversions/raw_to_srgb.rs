use std::fs;
use std::any::Any;
use std::io::{BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use ndarray::ArrayD;
use tracing::{debug, instrument};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    config::ConversionConfig,
    conversions::task::{ConversionTask, TaskOutcome, archive_base_name},
    debayer::CpuDebayer,
    png::{ImageWriter, PngImageWriter},
    raw::{BayerPlanes, CaptureReader, NpzCaptureReader, RawCapture, extract_planes},
    timing::{PipelineTimings, Timer},
    tone::{SrgbImage, ToneMapper},
    white_balance::WhiteBalanceStrategy,
};

/// Raw exposure → white balance → demosaic → gamma → PNG.
///
/// Holds no per-conversion state, so one pipeline is shared by all workers.
pub struct RawToSrgbPipeline<R: CaptureReader, W: ImageWriter> {
    reader: R,
    writer: W,
    debayer: CpuDebayer,
    config: ConversionConfig,
}

impl RawToSrgbPipeline<NpzCaptureReader, PngImageWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: NpzCaptureReader,
            writer: PngImageWriter,
            debayer: CpuDebayer::new(),
            config,
        }
    }
}

impl<R: CaptureReader, W: ImageWriter> RawToSrgbPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            debayer: CpuDebayer::new(),
            config,
        }
    }

    fn validate_dimensions(&self, planes: &BayerPlanes) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        planes.validate()?;
        let (height, width) = planes.dims();
        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Runs every numeric stage on one exposure record.
    #[instrument(skip_all, fields(shape = ?record.shape(), strategy = %strategy))]
    pub fn render(
        &self,
        record: &ArrayD<f32>,
        strategy: WhiteBalanceStrategy,
        tone: &ToneMapper,
        timings: &mut PipelineTimings,
    ) -> Result<SrgbImage> {
        let mut planes = {
            let _span = tracing::info_span!("extract_planes").entered();
            let timer = Timer::start("extract_planes");
            let planes = extract_planes(record)?;
            self.validate_dimensions(&planes)?;
            timer.record(timings);
            planes
        };

        {
            let _span = tracing::info_span!("white_balance").entered();
            let timer = Timer::start("white_balance");
            let gains = strategy.estimate(&planes)?;
            gains.apply(&mut planes);
            timer.record(timings);
        }

        let dense = {
            let (height, width) = planes.dims();
            let _span = tracing::info_span!("demosaic", height, width).entered();
            let timer = Timer::start("demosaic");
            let dense = self.debayer.process(&planes)?;
            timer.record(timings);
            dense
        };

        let image = {
            let _span = tracing::info_span!("tone_map").entered();
            let timer = Timer::start("tone_map");
            let image = tone.apply(&dense);
            timer.record(timings);
            image
        };

        Ok(image)
    }

    /// Renders one record with the configured gamma and encodes it to `output`.
    pub fn convert(
        &self,
        record: &ArrayD<f32>,
        strategy: WhiteBalanceStrategy,
        output: &mut dyn Write,
    ) -> Result<PipelineTimings> {
        let mut timings = PipelineTimings::new();
        let tone = ToneMapper::new(self.config.gamma, self.config.channel_order)?;
        let image = self.render(record, strategy, &tone, &mut timings)?;
        self.encode(&image, output, &mut timings)?;
        Ok(timings)
    }

    fn encode(&self, image: &SrgbImage, output: &mut dyn Write, timings: &mut PipelineTimings) -> Result<()> {
        let _span = tracing::info_span!("encode_png").entered();
        let timer = Timer::start("encode_png");
        self.writer.write_image(image, output, &self.config)?;
        timer.record(timings);
        Ok(())
    }

    /// Reads and decodes a whole archive.
    #[instrument(skip(self, archive_path), fields(archive = %archive_path.display()))]
    pub fn load_capture(&self, archive_path: &Path) -> Result<RawCapture> {
        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            fs::read(archive_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", archive_path.display(), e))
            })?
        };

        let _span = tracing::info_span!("decode_archive").entered();
        isolate(|| self.reader.read_capture(&archive_base_name(archive_path), &input_data))
    }

    /// Runs one task against an already loaded capture and writes its PNG.
    pub fn run_task(&self, task: &ConversionTask, capture: &RawCapture) -> Result<PipelineTimings> {
        let strategy: WhiteBalanceStrategy = task.strategy.parse()?;
        let tone = ToneMapper::new(task.gamma, self.config.channel_order)?;
        let record = capture.record(task.exposure_key)?;

        let mut timings = PipelineTimings::new();
        let image = self.render(record, strategy, &tone, &mut timings)?;

        let output_path = &task.output_path;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", parent.display(), e))
            })?;
        }
        let file = fs::File::create(output_path).map_err(|e| {
            ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;
        let mut output = BufWriter::new(file);
        self.encode(&image, &mut output, &mut timings)?;
        output.flush().map_err(|e| {
            ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;

        debug!(
            width = image.width,
            height = image.height,
            output = %output_path.display(),
            "Conversion complete"
        );
        Ok(timings)
    }

    /// Failure boundary for one task: errors and panics become a recorded
    /// outcome and never reach the caller.
    pub fn execute(&self, task: &ConversionTask, capture: &RawCapture) -> TaskOutcome {
        let _span = tracing::info_span!(
            "conversion",
            archive = %capture.base_name,
            exposure_key = %task.exposure_key,
            strategy = %task.strategy
        )
        .entered();

        match isolate(|| self.run_task(task, capture)) {
            Ok(timings) => TaskOutcome::succeeded(task, timings),
            Err(e) => TaskOutcome::failed(task, &e),
        }
    }

    /// Loads `task.archive_path` and executes the single task against it.
    pub fn execute_standalone(&self, task: &ConversionTask) -> TaskOutcome {
        match self.load_capture(&task.archive_path) {
            Ok(capture) => self.execute(task, &capture),
            Err(e) => TaskOutcome::failed(task, &e),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }
}

/// Runs `f`, turning a panic into a [`ConversionError::TaskPanicked`].
fn isolate<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(ConversionError::TaskPanicked(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
