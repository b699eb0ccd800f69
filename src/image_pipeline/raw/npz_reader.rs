//! Capture reader for NumPy `.npz` archives.
//!
//! Each archive stores one array per exposure key (`sht`, `mid`, `lng`,
//! `hdr`). Arrays are read as `float32`; `float64` records are narrowed to
//! `float32` on load.

use std::io::{Cursor, Read, Seek};

use ndarray::{ArrayD, IxDyn, OwnedRepr};
use ndarray_npy::NpzReader;
use tracing::{debug, warn};

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::reader::CaptureReader;
use crate::image_pipeline::raw::types::{ExposureKey, RawCapture};

/// Reads capture archives written by `numpy.savez` / `numpy.savez_compressed`.
///
/// Records whose name is not an exposure key are ignored. Absent keys are
/// left out of the capture and surface later as a missing record for the
/// task that needs them.
pub struct NpzCaptureReader;

impl CaptureReader for NpzCaptureReader {
    fn read_capture(&self, base_name: &str, data: &[u8]) -> Result<RawCapture> {
        debug!("Decoding archive {}, {} bytes", base_name, data.len());

        let mut npz = NpzReader::new(Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(format!("{base_name}: {e}")))?;
        let names = npz
            .names()
            .map_err(|e| ConversionError::DecodeError(format!("{base_name}: {e}")))?;

        let mut capture = RawCapture::new(base_name);
        for key in ExposureKey::ALL {
            let Some(entry) = names.iter().find(|name| key.matches_record_name(name)) else {
                debug!("Archive {} has no '{}' record", base_name, key);
                continue;
            };
            match read_record(&mut npz, entry) {
                Ok(array) => {
                    debug!("Record {} shape {:?}", key, array.shape());
                    capture.insert(key, array);
                }
                Err(detail) => {
                    warn!("Archive {} record '{}' is unreadable: {}", base_name, key, detail);
                    capture.mark_unreadable(key, detail);
                }
            }
        }

        Ok(capture)
    }
}

/// Reads one entry as f32, falling back to f64. The error is the reason the
/// entry was rejected.
fn read_record<R: Read + Seek>(npz: &mut NpzReader<R>, entry: &str) -> std::result::Result<ArrayD<f32>, String> {
    if let Ok(array) = npz.by_name::<OwnedRepr<f32>, IxDyn>(entry) {
        return Ok(array);
    }
    npz.by_name::<OwnedRepr<f64>, IxDyn>(entry)
        .map(|array| array.mapv(|v| v as f32))
        .map_err(|e| e.to_string())
}
