//! Raw capture data types

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{ArrayD, ArrayView2, ArrayView3, Axis, Ix3};

use crate::image_pipeline::common::error::{ConversionError, Result};

/// Largest leading axis still read as a stack of channel planes.
const MAX_CHANNEL_FIRST_AXIS: usize = 8;

/// One of the four exposures stored in every capture archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExposureKey {
    Short,
    Mid,
    Long,
    Hdr,
}

impl ExposureKey {
    pub const ALL: [ExposureKey; 4] = [
        ExposureKey::Short,
        ExposureKey::Mid,
        ExposureKey::Long,
        ExposureKey::Hdr,
    ];

    /// Record name inside the archive, also used as the output subfolder.
    pub fn as_str(self) -> &'static str {
        match self {
            ExposureKey::Short => "sht",
            ExposureKey::Mid => "mid",
            ExposureKey::Long => "lng",
            ExposureKey::Hdr => "hdr",
        }
    }

    /// Matches `sht` as well as `sht.npy`.
    pub fn matches_record_name(self, name: &str) -> bool {
        let name = name.strip_suffix(".npy").unwrap_or(name);
        name == self.as_str()
    }
}

impl fmt::Display for ExposureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of the stacked channel planes in a rank-3 exposure tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// (C, H, W)
    ChannelFirst,
    /// (H, W, C)
    ChannelLast,
}

impl ChannelLayout {
    pub fn channel_axis(self) -> Axis {
        match self {
            ChannelLayout::ChannelFirst => Axis(0),
            ChannelLayout::ChannelLast => Axis(2),
        }
    }
}

/// Decoded capture archive
#[derive(Debug, Clone)]
pub struct RawCapture {
    /// Archive file name without extension
    pub base_name: String,
    records: BTreeMap<ExposureKey, ArrayD<f32>>,
    /// Records present in the archive that could not be decoded, with the reason
    unreadable: BTreeMap<ExposureKey, String>,
}

impl RawCapture {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            records: BTreeMap::new(),
            unreadable: BTreeMap::new(),
        }
    }

    pub fn with_record(mut self, key: ExposureKey, data: ArrayD<f32>) -> Self {
        self.insert(key, data);
        self
    }

    pub fn insert(&mut self, key: ExposureKey, data: ArrayD<f32>) {
        self.records.insert(key, data);
    }

    /// Keeps a record that failed to decode so only the tasks reading it fail.
    pub fn mark_unreadable(&mut self, key: ExposureKey, detail: impl Into<String>) {
        self.records.remove(&key);
        self.unreadable.insert(key, detail.into());
    }

    pub fn record(&self, key: ExposureKey) -> Result<&ArrayD<f32>> {
        if let Some(data) = self.records.get(&key) {
            return Ok(data);
        }
        match self.unreadable.get(&key) {
            Some(detail) => Err(ConversionError::UnsupportedElementType {
                record: key.to_string(),
                detail: detail.clone(),
            }),
            None => Err(ConversionError::MissingRecord(key.to_string())),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = ExposureKey> + '_ {
        self.records.keys().copied()
    }
}

/// A single exposure record with its channel layout resolved.
///
/// The layout is decided once here and carried as a tag, so later stages
/// never re-inspect the tensor shape.
#[derive(Debug, Clone, Copy)]
pub struct RawExposure<'a> {
    data: ArrayView3<'a, f32>,
    layout: ChannelLayout,
}

impl<'a> RawExposure<'a> {
    /// Validates a record and resolves its layout.
    ///
    /// A leading axis of at most 8 marks the tensor as channel-first,
    /// otherwise a trailing axis of 4 or 8 marks it channel-last. The channel
    /// axis must hold 4 or 8 planes.
    pub fn resolve(data: &'a ArrayD<f32>) -> Result<Self> {
        let shape = data.shape().to_vec();
        let data = data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| ConversionError::shape(&shape, "expected a rank-3 tensor"))?;

        let layout = if shape[0] <= MAX_CHANNEL_FIRST_AXIS {
            ChannelLayout::ChannelFirst
        } else if matches!(shape[2], 4 | 8) {
            ChannelLayout::ChannelLast
        } else {
            return Err(ConversionError::shape(&shape, "no channel axis of size 4 or 8"));
        };

        let channels = data.len_of(layout.channel_axis());
        if channels != 4 && channels != 8 {
            return Err(ConversionError::shape(
                &shape,
                format!("channel axis holds {channels} planes, expected 4 or 8"),
            ));
        }

        Ok(Self { data, layout })
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.data.len_of(self.layout.channel_axis())
    }

    /// Spatial size as (height, width).
    pub fn spatial_dims(&self) -> (usize, usize) {
        let shape = self.data.shape();
        match self.layout {
            ChannelLayout::ChannelFirst => (shape[1], shape[2]),
            ChannelLayout::ChannelLast => (shape[0], shape[1]),
        }
    }

    /// Index of the first Bayer plane. With 8 planes the trailing group of 4
    /// belongs to this exposure; the leading group is a second acquisition.
    fn bayer_offset(&self) -> usize {
        if self.channels() == 8 { 4 } else { 0 }
    }

    /// View of Bayer plane `index` (0=b, 1=g1, 2=g2, 3=r).
    pub fn bayer_plane(&self, index: usize) -> ArrayView2<'a, f32> {
        self.data
            .index_axis_move(self.layout.channel_axis(), self.bayer_offset() + index)
    }
}
