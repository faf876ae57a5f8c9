//! MP4 family source: lofty reads the `ilst` atoms, symphonia the track timing.

use std::fs::File;
use std::path::Path;

use lofty::file::{FileType, TaggedFile};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};
use mediameta_types::{ContainerFamily, MetadataField};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{
    Bitrate, EmbeddedArtwork, RawValue, TagSource, TechnicalProperties, TickDuration, text_value,
};
use crate::error::{FieldReadError, OpenError};

pub struct Mp4Source {
    file: TaggedFile,
    timing: Option<TickDuration>,
}

impl Mp4Source {
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let file = Probe::open(path)?.guess_file_type()?.read()?;
        if file.file_type() != FileType::Mp4 {
            return Err(OpenError::WrongContainer(ContainerFamily::Mp4.label()));
        }
        let timing = read_track_timing(path);
        if timing.is_none() {
            tracing::debug!(path = %path.display(), "no track timing from demuxer");
        }
        Ok(Self { file, timing })
    }

    fn tag(&self) -> Option<&Tag> {
        self.file
            .tag(TagType::Mp4Ilst)
            .or_else(|| self.file.first_tag())
    }
}

impl TagSource for Mp4Source {
    fn family(&self) -> ContainerFamily {
        ContainerFamily::Mp4
    }

    fn field(&self, field: MetadataField) -> Result<Option<RawValue>, FieldReadError> {
        let Some(tag) = self.tag() else {
            return Ok(None);
        };
        let value = match field {
            MetadataField::Title => text_value(tag.title()),
            MetadataField::Artist => text_value(tag.artist()),
            MetadataField::Album => text_value(tag.album()),
            MetadataField::Genre => text_value(tag.genre()),
            MetadataField::Description => text_value(tag.comment()),
            MetadataField::Date => tag.get_string(&ItemKey::RecordingDate).and_then(day_value),
            MetadataField::TrackNumber => {
                tag.track().map(|track| RawValue::Number(i64::from(track)))
            }
            MetadataField::AlbumArtUri => None,
        };
        Ok(value)
    }

    fn embedded_artwork(&self) -> Option<EmbeddedArtwork> {
        let tag = self.tag()?;
        let pic = tag.pictures().iter().find(|pic| !pic.data().is_empty())?;
        Some(EmbeddedArtwork {
            data: pic.data().to_vec(),
            mime_type: pic.mime_type().map(|mime| mime.as_str().to_string()),
        })
    }

    fn technical_properties(&self) -> TechnicalProperties {
        let props = self.file.properties();
        let fallback = TickDuration {
            ticks: i64::try_from(props.duration().as_millis()).unwrap_or(i64::MAX),
            timescale: 1000,
        };
        TechnicalProperties {
            bitrate: props
                .audio_bitrate()
                .map(|kbps| Bitrate::BitsPerSecond(i64::from(kbps) * 1000)),
            duration: Some(self.timing.unwrap_or(fallback)),
            sample_rate: props.sample_rate().map(i64::from),
            channels: props.channels().map(i64::from),
        }
    }
}

/// `©day` holds either a bare year or a full date.
fn day_value(raw: &str) -> Option<RawValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse().ok().map(RawValue::Year);
    }
    Some(RawValue::FullDate(raw.to_string()))
}

/// Default track length as ticks of its own timescale.
fn read_track_timing(path: &Path) -> Option<TickDuration> {
    let file = File::open(path).ok()?;
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let opened = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;
    let track = opened.format.default_track()?;
    let params = &track.codec_params;
    let frames = params.n_frames?;
    match params.time_base {
        Some(tb) => Some(TickDuration {
            ticks: i64::try_from(frames.saturating_mul(u64::from(tb.numer))).ok()?,
            timescale: tb.denom,
        }),
        None => Some(TickDuration {
            ticks: i64::try_from(frames).ok()?,
            timescale: params.sample_rate?,
        }),
    }
}
