//! EXIF image source.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use exif::{Exif, In, Tag, Value};
use mediameta_types::{ContainerFamily, MetadataField};

use super::{EmbeddedArtwork, RawValue, TagSource, TechnicalProperties};
use crate::charset::StringConverter;
use crate::describe::{DescriptionInputs, resolve_description};
use crate::error::{FieldReadError, OpenError};

const MARKER_SOI: u8 = 0xd8;
const MARKER_EOI: u8 = 0xd9;
const MARKER_SOS: u8 = 0xda;
const MARKER_COM: u8 = 0xfe;
const USER_COMMENT_PREFIX: usize = 8;

/// JPEG comment plus EXIF data, both optional.
pub struct ImageSource {
    comment: Option<String>,
    exif: Option<Exif>,
    conv: StringConverter,
}

impl ImageSource {
    pub fn open(path: &Path, conv: &StringConverter) -> Result<Self, OpenError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut soi = [0u8; 2];
        if reader.read_exact(&mut soi).is_err() || soi != [0xff, MARKER_SOI] {
            return Err(OpenError::WrongContainer(ContainerFamily::Image.label()));
        }
        reader.seek(SeekFrom::Start(0))?;

        let comment = match read_jpeg_comment(&mut reader) {
            Ok(raw) => raw
                .map(|raw| conv.convert_bytes(&raw))
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "truncated jpeg segments");
                None
            }
        };

        reader.seek(SeekFrom::Start(0))?;
        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Some(exif),
            Err(exif::Error::NotFound(_)) => None,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "no usable exif data");
                None
            }
        };

        Ok(Self {
            comment,
            exif,
            conv: *conv,
        })
    }

    fn ascii(&self, tag: Tag) -> Option<String> {
        let field = self.exif.as_ref()?.get_field(tag, In::PRIMARY)?;
        let Value::Ascii(ref parts) = field.value else {
            return None;
        };
        parts
            .iter()
            .map(|part| self.conv.convert_bytes(part).trim().to_string())
            .find(|text| !text.is_empty())
    }

    fn display(&self, tag: Tag) -> Option<String> {
        let exif = self.exif.as_ref()?;
        let field = exif.get_field(tag, In::PRIMARY)?;
        let text = field.display_value().with_unit(exif).to_string();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// `DateTimeOriginal` must be ASCII; any other type is a malformed field.
    fn date_taken(&self) -> Result<Option<RawValue>, FieldReadError> {
        let Some(field) = self
            .exif
            .as_ref()
            .and_then(|exif| exif.get_field(Tag::DateTimeOriginal, In::PRIMARY))
        else {
            return Ok(None);
        };
        if !matches!(field.value, Value::Ascii(_)) {
            return Err(FieldReadError::new(
                MetadataField::Date,
                format!("DateTimeOriginal has non-ASCII type {:?}", field.value),
            ));
        }
        Ok(self.display(Tag::DateTimeOriginal).map(RawValue::FullDate))
    }

    fn user_comment(&self) -> Option<String> {
        let exif = self.exif.as_ref()?;
        let field = exif.get_field(Tag::UserComment, In::PRIMARY)?;
        let Value::Undefined(ref raw, _) = field.value else {
            return None;
        };
        if raw.len() <= USER_COMMENT_PREFIX {
            return None;
        }
        let (code, body) = raw.split_at(USER_COMMENT_PREFIX);
        let text = if code.starts_with(b"UNICODE") {
            decode_utf16(body, exif.little_endian())
        } else {
            self.conv.convert_bytes(body)
        };
        let text = text.trim_matches(|ch: char| ch == '\0' || ch.is_whitespace());
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn description_inputs(&self) -> DescriptionInputs {
        DescriptionInputs {
            comment: self.comment.clone(),
            user_comment: self.user_comment(),
            camera_model: self.ascii(Tag::Model),
            flash: self.display(Tag::Flash),
            focal_length: self.display(Tag::FocalLength),
            focal_length_35mm: self.display(Tag::FocalLengthIn35mmFilm),
        }
    }
}

impl TagSource for ImageSource {
    fn family(&self) -> ContainerFamily {
        ContainerFamily::Image
    }

    fn field(&self, field: MetadataField) -> Result<Option<RawValue>, FieldReadError> {
        let value = match field {
            MetadataField::Date => self.date_taken()?,
            MetadataField::Description => {
                resolve_description(&self.description_inputs()).map(RawValue::Text)
            }
            _ => None,
        };
        Ok(value)
    }

    fn embedded_artwork(&self) -> Option<EmbeddedArtwork> {
        None
    }

    fn technical_properties(&self) -> TechnicalProperties {
        TechnicalProperties::default()
    }
}

fn decode_utf16(raw: &[u8], little_endian: bool) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| {
            let bytes = [pair[0], pair[1]];
            if little_endian {
                u16::from_le_bytes(bytes)
            } else {
                u16::from_be_bytes(bytes)
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Payload of the first JPEG COM segment before the scan data.
///
/// Returns `Ok(None)` for non-JPEG input and for JPEGs without a comment.
pub fn read_jpeg_comment<R: Read + Seek>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>> {
    let mut soi = [0u8; 2];
    if reader.read_exact(&mut soi).is_err() || soi != [0xff, MARKER_SOI] {
        return Ok(None);
    }
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        if byte[0] != 0xff {
            return Ok(None);
        }
        let mut marker = 0xff;
        while marker == 0xff {
            reader.read_exact(&mut byte)?;
            marker = byte[0];
        }
        match marker {
            MARKER_EOI | MARKER_SOS => return Ok(None),
            0x01 | 0xd0..=0xd7 => continue,
            _ => {}
        }
        let mut len = [0u8; 2];
        reader.read_exact(&mut len)?;
        let payload = usize::from(u16::from_be_bytes(len)).saturating_sub(2);
        if marker == MARKER_COM {
            let mut data = vec![0u8; payload];
            reader.read_exact(&mut data)?;
            return Ok(Some(data));
        }
        reader.seek(SeekFrom::Current(payload as i64))?;
    }
}
