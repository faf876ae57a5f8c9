//! Raw tag sources, one per container family.
//!
//! Each source wraps a parser library and exposes the same capability set:
//! typed raw fields, embedded artwork, technical stream properties and
//! auxiliary text frames. [`RawTagSource`] is the closed set selected by
//! container family at open time.

mod audio;
mod image;
mod mp4;

use std::path::Path;

use mediameta_types::{ContainerFamily, MetadataField};

use crate::charset::StringConverter;
use crate::error::{FieldReadError, OpenError};

pub use audio::AudioSource;
pub use image::{ImageSource, read_jpeg_comment};
pub use mp4::Mp4Source;

#[cfg(test)]
pub(crate) use audio::fixtures as audio_fixtures;
#[cfg(test)]
pub(crate) use image::fixtures as jpeg_fixtures;
#[cfg(test)]
pub(crate) use mp4::fixtures as mp4_fixtures;

/// One raw tag value, before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    /// Bare numeric year; `0` means unknown.
    Year(i64),
    /// Producer-formatted date, passed through as is.
    FullDate(String),
    Number(i64),
}

/// Artwork stored inside the container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedArtwork {
    pub data: Vec<u8>,
    /// Mimetype as declared by the tag, which may be bogus (`"PNG"`).
    pub mime_type: Option<String>,
}

/// Bitrate together with the unit convention of the source that reported it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bitrate {
    KilobitsPerSecond(i64),
    BitsPerSecond(i64),
}

/// Duration expressed in ticks of a timescale (ticks per second).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickDuration {
    pub ticks: i64,
    pub timescale: u32,
}

impl TickDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            ticks: i64::try_from(secs).unwrap_or(i64::MAX),
            timescale: 1,
        }
    }

    /// Whole seconds, or `None` for a zero timescale.
    pub fn whole_seconds(self) -> Option<i64> {
        if self.timescale == 0 {
            return None;
        }
        Some(self.ticks / i64::from(self.timescale))
    }
}

/// Stream properties as reported by the source; every member optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TechnicalProperties {
    pub bitrate: Option<Bitrate>,
    pub duration: Option<TickDuration>,
    pub sample_rate: Option<i64>,
    pub channels: Option<i64>,
}

/// Capability contract shared by every raw tag source.
pub trait TagSource {
    fn family(&self) -> ContainerFamily;

    /// Raw value backing `field`, `Ok(None)` when the tag is absent.
    fn field(&self, field: MetadataField) -> Result<Option<RawValue>, FieldReadError>;

    /// First embedded picture, if the container has one with data.
    fn embedded_artwork(&self) -> Option<EmbeddedArtwork>;

    fn technical_properties(&self) -> TechnicalProperties;

    /// First text frame with the given frame id, in native tag order.
    fn aux_text(&self, _frame_id: &str) -> Option<String> {
        None
    }
}

/// Source selected by container family.
pub enum RawTagSource {
    Image(ImageSource),
    Audio(AudioSource),
    Mp4(Mp4Source),
}

impl RawTagSource {
    /// Open `path` with the source matching `family`.
    pub fn open(
        family: ContainerFamily,
        path: &Path,
        conv: &StringConverter,
    ) -> Result<Self, OpenError> {
        let source = match family {
            ContainerFamily::Image => RawTagSource::Image(ImageSource::open(path, conv)?),
            ContainerFamily::Mpeg | ContainerFamily::Flac => {
                RawTagSource::Audio(AudioSource::open(family, path)?)
            }
            ContainerFamily::Mp4 => RawTagSource::Mp4(Mp4Source::open(path)?),
        };
        Ok(source)
    }

    fn inner(&self) -> &dyn TagSource {
        match self {
            RawTagSource::Image(source) => source,
            RawTagSource::Audio(source) => source,
            RawTagSource::Mp4(source) => source,
        }
    }
}

impl TagSource for RawTagSource {
    fn family(&self) -> ContainerFamily {
        self.inner().family()
    }

    fn field(&self, field: MetadataField) -> Result<Option<RawValue>, FieldReadError> {
        self.inner().field(field)
    }

    fn embedded_artwork(&self) -> Option<EmbeddedArtwork> {
        self.inner().embedded_artwork()
    }

    fn technical_properties(&self) -> TechnicalProperties {
        self.inner().technical_properties()
    }

    fn aux_text(&self, frame_id: &str) -> Option<String> {
        self.inner().aux_text(frame_id)
    }
}

/// Turn a lofty-style optional string into a raw text value.
fn text_value(value: Option<impl AsRef<str>>) -> Option<RawValue> {
    value
        .map(|text| text.as_ref().to_string())
        .filter(|text| !text.trim().is_empty())
        .map(RawValue::Text)
}
