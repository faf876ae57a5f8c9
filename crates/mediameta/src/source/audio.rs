//! MP3 (ID3v2) and FLAC (Vorbis comment) source, backed by lofty.

use std::path::Path;

use lofty::file::{FileType, TaggedFile};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};
use mediameta_types::{ContainerFamily, MetadataField};

use super::{
    Bitrate, EmbeddedArtwork, RawValue, TagSource, TechnicalProperties, TickDuration, text_value,
};
use crate::error::{FieldReadError, OpenError};

pub struct AudioSource {
    family: ContainerFamily,
    file: TaggedFile,
}

impl AudioSource {
    pub fn open(family: ContainerFamily, path: &Path) -> Result<Self, OpenError> {
        let file = Probe::open(path)?.guess_file_type()?.read()?;
        let expected = match family {
            ContainerFamily::Mpeg => FileType::Mpeg,
            ContainerFamily::Flac => FileType::Flac,
            other => return Err(OpenError::WrongContainer(other.label())),
        };
        if file.file_type() != expected {
            return Err(OpenError::WrongContainer(family.label()));
        }
        Ok(Self { family, file })
    }

    /// ID3v2 for MP3, Vorbis comments for FLAC, else whatever tag exists.
    fn tag(&self) -> Option<&Tag> {
        self.file.primary_tag().or_else(|| self.file.first_tag())
    }
}

impl TagSource for AudioSource {
    fn family(&self) -> ContainerFamily {
        self.family
    }

    fn field(&self, field: MetadataField) -> Result<Option<RawValue>, FieldReadError> {
        Ok(self.tag().and_then(|tag| read_field(tag, field)))
    }

    fn embedded_artwork(&self) -> Option<EmbeddedArtwork> {
        match self.family {
            ContainerFamily::Mpeg => self
                .file
                .tag(TagType::Id3v2)
                .and_then(first_picture),
            // FLAC pictures live in metadata blocks, lofty attaches them to
            // whichever tag it builds.
            _ => self.file.tags().iter().find_map(first_picture),
        }
    }

    fn technical_properties(&self) -> TechnicalProperties {
        let props = self.file.properties();
        TechnicalProperties {
            bitrate: props
                .audio_bitrate()
                .map(|kbps| Bitrate::KilobitsPerSecond(i64::from(kbps))),
            duration: Some(TickDuration::from_secs(props.duration().as_secs())),
            sample_rate: props.sample_rate().map(i64::from),
            channels: props.channels().map(i64::from),
        }
    }

    fn aux_text(&self, frame_id: &str) -> Option<String> {
        if self.family != ContainerFamily::Mpeg {
            return None;
        }
        self.file
            .tag(TagType::Id3v2)
            .and_then(|tag| first_text_frame(tag, frame_id))
    }
}

fn read_field(tag: &Tag, field: MetadataField) -> Option<RawValue> {
    match field {
        MetadataField::Title => text_value(tag.title()),
        MetadataField::Artist => text_value(tag.artist()),
        MetadataField::Album => text_value(tag.album()),
        MetadataField::Genre => text_value(tag.genre()),
        MetadataField::Description => text_value(tag.comment()),
        MetadataField::Date => tag.year().map(|year| RawValue::Year(i64::from(year))),
        MetadataField::TrackNumber => {
            tag.track().map(|track| RawValue::Number(i64::from(track)))
        }
        MetadataField::AlbumArtUri => None,
    }
}

fn first_picture(tag: &Tag) -> Option<EmbeddedArtwork> {
    tag.pictures()
        .iter()
        .find(|pic| !pic.data().is_empty())
        .map(|pic| EmbeddedArtwork {
            data: pic.data().to_vec(),
            mime_type: pic.mime_type().map(|mime| mime.as_str().to_string()),
        })
}

fn first_text_frame(tag: &Tag, frame_id: &str) -> Option<String> {
    tag.items()
        .filter(|item| item.key().map_key(TagType::Id3v2, true) == Some(frame_id))
        .filter_map(|item| item.value().text())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod fixtures {
    fn block(out: &mut Vec<u8>, kind: u8, last: bool, body: &[u8]) {
        let header = if last { kind | 0x80 } else { kind };
        out.push(header);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        out.extend_from_slice(body);
    }

    /// Minimal FLAC: 10 seconds of 44.1 kHz stereo, the given Vorbis
    /// comments, and an optional picture block with a declared mimetype.
    pub fn flac(comments: &[(&str, &str)], picture: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut out = b"fLaC".to_vec();

        let mut info = Vec::new();
        info.extend_from_slice(&4096u16.to_be_bytes());
        info.extend_from_slice(&4096u16.to_be_bytes());
        info.extend_from_slice(&[0; 6]);
        let packed: u64 = (44_100u64 << 44) | (1 << 41) | (15 << 36) | 441_000;
        info.extend_from_slice(&packed.to_be_bytes());
        info.extend_from_slice(&[0; 16]);
        block(&mut out, 0, false, &info);

        let mut vorbis = Vec::new();
        let vendor = b"mediameta";
        vorbis.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        vorbis.extend_from_slice(vendor);
        vorbis.extend_from_slice(&(comments.len() as u32).to_le_bytes());
        for (key, value) in comments {
            let entry = format!("{key}={value}");
            vorbis.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            vorbis.extend_from_slice(entry.as_bytes());
        }
        block(&mut out, 4, picture.is_none(), &vorbis);

        if let Some((mime, data)) = picture {
            let mut pic = Vec::new();
            pic.extend_from_slice(&3u32.to_be_bytes());
            pic.extend_from_slice(&(mime.len() as u32).to_be_bytes());
            pic.extend_from_slice(mime.as_bytes());
            pic.extend_from_slice(&0u32.to_be_bytes());
            pic.extend_from_slice(&[0; 16]);
            pic.extend_from_slice(&(data.len() as u32).to_be_bytes());
            pic.extend_from_slice(data);
            block(&mut out, 6, true, &pic);
        }
        out
    }

    pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

    /// MPEG-1 Layer III, 128 kbps, 44.1 kHz, stereo, no padding.
    const MPEG_FRAME_HEADER: [u8; 4] = [0xff, 0xfb, 0x90, 0x00];
    const MPEG_FRAME_LEN: usize = 417;

    fn syncsafe(len: usize) -> [u8; 4] {
        let len = len as u32;
        [
            ((len >> 21) & 0x7f) as u8,
            ((len >> 14) & 0x7f) as u8,
            ((len >> 7) & 0x7f) as u8,
            (len & 0x7f) as u8,
        ]
    }

    fn id3_frame(out: &mut Vec<u8>, id: &str, body: &[u8]) {
        out.extend_from_slice(id.as_bytes());
        out.extend_from_slice(&syncsafe(body.len()));
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(body);
    }

    /// ID3v2.4 tag with UTF-8 text frames and an optional APIC front cover,
    /// followed by `frames` silent CBR frames.
    pub fn mp3(texts: &[(&str, &str)], picture: Option<(&str, &[u8])>, frames: usize) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, text) in texts {
            let mut value = vec![3];
            value.extend_from_slice(text.as_bytes());
            id3_frame(&mut body, id, &value);
        }
        if let Some((mime, data)) = picture {
            let mut apic = vec![0];
            apic.extend_from_slice(mime.as_bytes());
            apic.extend_from_slice(&[0, 3, 0]);
            apic.extend_from_slice(data);
            id3_frame(&mut body, "APIC", &apic);
        }

        let mut out = b"ID3\x04\x00\x00".to_vec();
        out.extend_from_slice(&syncsafe(body.len()));
        out.extend_from_slice(&body);
        for _ in 0..frames {
            out.extend_from_slice(&MPEG_FRAME_HEADER);
            out.resize(out.len() + MPEG_FRAME_LEN - MPEG_FRAME_HEADER.len(), 0);
        }
        out
    }
}
