use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use mhdr_srgb::image_pipeline::{
    BatchConfig, BatchScheduler, ChannelOrder, ConversionConfig, ConversionError, ExposureKey,
    InterruptHandle, PngCompression,
};
use mhdr_srgb::logger;

use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "mhdr-srgb",
    about = "Convert multi-exposure raw Bayer archives (.npz) into gamma-encoded sRGB PNGs."
)]
struct Cli {
    /// Directory searched recursively for archives
    #[arg(value_name = "INPUT_ROOT")]
    input_root: PathBuf,

    /// Output directory; the input tree is mirrored below it
    #[arg(value_name = "OUTPUT_ROOT")]
    output_root: PathBuf,

    /// Gamma factor; outputs are in^(1/gamma)
    #[arg(long, default_value_t = 2.2)]
    gamma: f32,

    /// White balancing strategy; repeat to render each archive once per strategy
    #[arg(long = "strategy", value_name = "NAME", default_values_t = ["grayworld".to_string(), "none".to_string()])]
    strategies: Vec<String>,

    /// Restrict to these exposure records (sht, mid, lng, hdr)
    #[arg(long = "key", value_enum)]
    keys: Vec<KeyArg>,

    /// Worker threads (default: available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// PNG compression effort
    #[arg(long, value_enum, default_value = "default")]
    compression: CompressionArg,

    /// Store pixels as BGR, byte-compatible with legacy outputs
    #[arg(long)]
    bgr: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KeyArg {
    Sht,
    Mid,
    Lng,
    Hdr,
}

impl From<KeyArg> for ExposureKey {
    fn from(v: KeyArg) -> Self {
        match v {
            KeyArg::Sht => ExposureKey::Short,
            KeyArg::Mid => ExposureKey::Mid,
            KeyArg::Lng => ExposureKey::Long,
            KeyArg::Hdr => ExposureKey::Hdr,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CompressionArg {
    Fast,
    Default,
    Best,
}

impl From<CompressionArg> for PngCompression {
    fn from(v: CompressionArg) -> Self {
        match v {
            CompressionArg::Fast => PngCompression::Fast,
            CompressionArg::Default => PngCompression::Default,
            CompressionArg::Best => PngCompression::Best,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init();

    let conversion = ConversionConfig::builder()
        .gamma(cli.gamma)
        .compression(cli.compression.into())
        .channel_order(if cli.bgr { ChannelOrder::Bgr } else { ChannelOrder::Rgb })
        .build();

    let mut batch = BatchConfig::builder(&cli.input_root, &cli.output_root).strategies(cli.strategies);
    if !cli.keys.is_empty() {
        batch = batch.exposure_keys(cli.keys.into_iter().map(ExposureKey::from));
    }
    if let Some(workers) = cli.workers {
        batch = batch.workers(workers);
    }
    let batch = batch.build();

    info!(
        input = %batch.input_root().display(),
        output = %batch.output_root().display(),
        gamma = conversion.gamma,
        strategies = ?batch.strategies,
        "Starting batch"
    );

    let interrupt = InterruptHandle::new();
    let handler = interrupt.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received; finishing in-flight conversions");
        handler.interrupt();
    })
    .context("installing Ctrl+C handler")?;

    let mut scheduler = BatchScheduler::new(conversion, batch).with_interrupt(interrupt);
    let report = scheduler.run().context("batch run failed")?;
    report.log_summary();

    if report.is_partial() {
        return Err(ConversionError::Interrupted { abandoned: report.abandoned }.into());
    }
    if report.successes.is_empty() && !report.failures.is_empty() {
        bail!("every conversion failed ({} failures)", report.failures.len());
    }
    if !report.failures.is_empty() {
        warn!("{} conversions failed", report.failures.len());
    }

    Ok(())
}
