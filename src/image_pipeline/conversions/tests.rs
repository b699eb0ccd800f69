use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use ndarray::{Array3, ArrayD, Axis};

use crate::image_pipeline::common::error::{ConversionError, ErrorKind, Result};
use crate::image_pipeline::config::ConversionConfig;
use crate::image_pipeline::conversions::{ConversionTask, RawToSrgbPipeline, TaskOutcome};
use crate::image_pipeline::png::ImageWriter;
use crate::image_pipeline::raw::{CaptureReader, ExposureKey, RawCapture};
use crate::image_pipeline::tone::SrgbImage;
use crate::image_pipeline::white_balance::WhiteBalanceStrategy;

struct MockReader {
    should_fail: bool,
    capture: RawCapture,
}

impl CaptureReader for MockReader {
    fn read_capture(&self, _base_name: &str, _data: &[u8]) -> Result<RawCapture> {
        if self.should_fail {
            return Err(ConversionError::DecodeError("Mock decode error".to_string()));
        }
        Ok(self.capture.clone())
    }
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Vec<SrgbImage>>>,
}

impl ImageWriter for MockWriter {
    fn write_image(&self, image: &SrgbImage, _output: &mut dyn Write, _config: &ConversionConfig) -> Result<()> {
        if self.should_fail {
            return Err(ConversionError::EncodeError("Mock encode error".to_string()));
        }
        self.written.lock().unwrap().push(image.clone());
        Ok(())
    }
}

/// Channel-first (4, H, W) record with constant planes b, g1, g2, r.
fn constant_record(height: usize, width: usize, [b, g1, g2, r]: [f32; 4]) -> ArrayD<f32> {
    let mut data = Array3::<f32>::zeros((4, height, width));
    for (c, value) in [b, g1, g2, r].into_iter().enumerate() {
        data.index_axis_mut(Axis(0), c).fill(value);
    }
    data.into_dyn()
}

fn scenario_record() -> ArrayD<f32> {
    constant_record(4, 4, [0.15, 0.30, 0.30, 0.20])
}

fn mock_pipeline(
    reader_fails: bool,
    writer_fails: bool,
    capture: RawCapture,
) -> (RawToSrgbPipeline<MockReader, MockWriter>, Arc<Mutex<Vec<SrgbImage>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let reader = MockReader { should_fail: reader_fails, capture };
    let writer = MockWriter { should_fail: writer_fails, written: written.clone() };
    let pipeline = RawToSrgbPipeline::with_custom(reader, writer, ConversionConfig::default());
    (pipeline, written)
}

#[test]
fn test_gray_world_scenario_renders_neutral_gray() {
    let (pipeline, written) = mock_pipeline(false, false, RawCapture::new("unused"));

    let mut output = Cursor::new(Vec::new());
    pipeline
        .convert(&scenario_record(), WhiteBalanceStrategy::GrayWorld, &mut output)
        .unwrap();

    let written = written.lock().unwrap();
    assert_eq!(written.len(), 1);
    let image = &written[0];
    assert_eq!((image.width, image.height), (8, 8));

    let expected = (255.0 * 0.30f64.powf(1.0 / 2.2)).round() as i32;
    for px in image.data.chunks_exact(3) {
        for &v in px {
            assert!((v as i32 - expected).abs() <= 1, "sample {v}, expected {expected}");
        }
        assert!((px[0] as i32 - px[1] as i32).abs() <= 1);
        assert!((px[2] as i32 - px[1] as i32).abs() <= 1);
    }
}

#[test]
fn test_output_is_twice_the_plane_resolution() {
    let (pipeline, written) = mock_pipeline(false, false, RawCapture::new("unused"));

    let record = constant_record(6, 10, [0.2, 0.4, 0.4, 0.3]);
    let mut output = Cursor::new(Vec::new());
    pipeline.convert(&record, WhiteBalanceStrategy::None, &mut output).unwrap();

    let written = written.lock().unwrap();
    let image = &written[0];
    assert_eq!((image.width, image.height), (20, 12));
    assert_eq!(image.data.len(), 20 * 12 * 3);
}

#[test]
fn test_brighter_plane_gives_brighter_output() {
    let (pipeline, written) = mock_pipeline(false, false, RawCapture::new("unused"));

    for level in [0.1, 0.3, 0.6] {
        let record = constant_record(4, 4, [level; 4]);
        let mut output = Cursor::new(Vec::new());
        pipeline.convert(&record, WhiteBalanceStrategy::None, &mut output).unwrap();
    }

    let written = written.lock().unwrap();
    let centre: Vec<u8> = written.iter().map(|image| image.pixel(4, 4).unwrap()[1]).collect();
    assert!(centre.windows(2).all(|w| w[0] < w[1]), "{centre:?}");
}

#[test]
fn test_writer_failure() {
    let (pipeline, _) = mock_pipeline(false, true, RawCapture::new("unused"));

    let mut output = Cursor::new(Vec::new());
    let result = pipeline.convert(&scenario_record(), WhiteBalanceStrategy::GrayWorld, &mut output);

    assert!(matches!(result.unwrap_err(), ConversionError::EncodeError(_)));
}

#[test]
fn test_reader_failure_is_recorded_not_raised() {
    let archive = tempfile::NamedTempFile::new().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let (pipeline, written) = mock_pipeline(true, false, RawCapture::new("unused"));

    let task = ConversionTask::new(archive.path(), output_dir.path(), ExposureKey::Hdr, "grayworld", 2.2);
    match pipeline.execute_standalone(&task) {
        TaskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, ErrorKind::Io);
            assert_eq!(failure.exposure_key, ExposureKey::Hdr);
            assert_eq!(failure.strategy, "grayworld");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_unknown_strategy_fails_only_its_own_task() {
    let output_dir = tempfile::tempdir().unwrap();
    let capture = RawCapture::new("scene").with_record(ExposureKey::Hdr, scenario_record());
    let (pipeline, written) = mock_pipeline(false, false, capture.clone());

    let bad = ConversionTask::new("scene.npz", output_dir.path(), ExposureKey::Hdr, "pastel", 2.2);
    let good = ConversionTask::new("scene.npz", output_dir.path(), ExposureKey::Hdr, "grayworld", 2.2);

    match pipeline.execute(&bad, &capture) {
        TaskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, ErrorKind::Configuration);
            assert!(failure.message.contains("pastel"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(pipeline.execute(&good, &capture).is_success());
    assert!(good.output_path.ends_with("hdr/scene_wb_grayworld.png"));
    assert!(good.output_path.exists());
    assert_eq!(written.lock().unwrap().len(), 1);
}

#[test]
fn test_non_positive_gamma_is_a_configuration_failure() {
    let output_dir = tempfile::tempdir().unwrap();
    let capture = RawCapture::new("scene").with_record(ExposureKey::Mid, scenario_record());
    let (pipeline, _) = mock_pipeline(false, false, capture.clone());

    let task = ConversionTask::new("scene.npz", output_dir.path(), ExposureKey::Mid, "none", 0.0);
    match pipeline.execute(&task, &capture) {
        TaskOutcome::Failed(failure) => assert_eq!(failure.kind, ErrorKind::Configuration),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!task.output_path.exists());
}

#[test]
fn test_missing_record_is_a_data_failure() {
    let output_dir = tempfile::tempdir().unwrap();
    let capture = RawCapture::new("scene").with_record(ExposureKey::Hdr, scenario_record());
    let (pipeline, _) = mock_pipeline(false, false, capture.clone());

    let task = ConversionTask::new("scene.npz", output_dir.path(), ExposureKey::Short, "none", 2.2);
    match pipeline.execute(&task, &capture) {
        TaskOutcome::Failed(failure) => {
            assert_eq!(failure.kind, ErrorKind::Data);
            assert!(failure.message.contains("sht"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_bad_shape_is_a_shape_failure() {
    let output_dir = tempfile::tempdir().unwrap();
    let record = ArrayD::<f32>::zeros(ndarray::IxDyn(&[3, 4, 4]));
    let capture = RawCapture::new("scene").with_record(ExposureKey::Long, record);
    let (pipeline, _) = mock_pipeline(false, false, capture.clone());

    let task = ConversionTask::new("scene.npz", output_dir.path(), ExposureKey::Long, "none", 2.2);
    match pipeline.execute(&task, &capture) {
        TaskOutcome::Failed(failure) => assert_eq!(failure.kind, ErrorKind::Shape),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_png_output_is_deterministic() {
    let pipeline = RawToSrgbPipeline::new(ConversionConfig::default());
    let record = ArrayD::from_shape_fn(ndarray::IxDyn(&[4, 6, 5]), |idx| {
        0.05 + (idx[0] * 31 + idx[1] * 7 + idx[2] * 3) as f32 / 300.0
    });

    let mut first = Vec::new();
    let mut second = Vec::new();
    pipeline.convert(&record, WhiteBalanceStrategy::GrayWorld, &mut first).unwrap();
    pipeline.convert(&record, WhiteBalanceStrategy::GrayWorld, &mut second).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_output_paths_never_collide_across_strategies() {
    let dir = std::path::Path::new("out/train");
    let tasks: Vec<ConversionTask> = WhiteBalanceStrategy::ALL
        .iter()
        .flat_map(|s| ConversionTask::for_archive(std::path::Path::new("in/train/scene_7.npz"), dir, &ExposureKey::ALL, s.as_str(), 2.2))
        .collect();

    assert_eq!(tasks.len(), 8);
    let mut paths: Vec<_> = tasks.iter().map(|t| t.output_path.clone()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 8);
    assert!(paths.contains(&dir.join("lng").join("scene_7_wb_none.png")));
}
