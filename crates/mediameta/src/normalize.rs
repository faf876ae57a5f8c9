//! Raw tag values into canonical catalog fields.

use mediameta_types::{MediaItem, MetadataField};

use crate::charset::StringConverter;
use crate::source::{RawValue, TagSource};

/// Copy every available raw field into `item`.
///
/// Each field is read on its own; a failing read is logged and skipped.
/// Returns how many fields were written.
pub fn normalize_fields(
    source: &dyn TagSource,
    item: &mut MediaItem,
    conv: &StringConverter,
) -> usize {
    let mut written = 0;
    for field in MetadataField::ALL {
        let raw = match source.field(field) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(err) => {
                tracing::debug!(
                    path = %item.location().display(),
                    error = %err,
                    "skipping unreadable field"
                );
                continue;
            }
        };
        if apply_field(item, field, raw, conv) {
            written += 1;
        }
    }
    written
}

/// Write one raw value; returns false when it normalizes to nothing.
pub fn apply_field(
    item: &mut MediaItem,
    field: MetadataField,
    raw: RawValue,
    conv: &StringConverter,
) -> bool {
    match field {
        MetadataField::TrackNumber => match track_number(&raw) {
            Some(track) => {
                item.set_metadata(field, track.to_string());
                item.set_track_number(track);
                true
            }
            None => false,
        },
        MetadataField::Date => match date_value(&raw, conv) {
            Some(date) => {
                item.set_metadata(field, date);
                true
            }
            None => false,
        },
        MetadataField::AlbumArtUri => false,
        _ => match text_of(&raw, conv) {
            Some(text) => {
                item.set_metadata(field, text);
                true
            }
            None => false,
        },
    }
}

/// Copy the configured ID3v2 text frames into the item's aux data.
pub fn collect_aux_data(
    source: &dyn TagSource,
    item: &mut MediaItem,
    frame_ids: &[String],
    conv: &StringConverter,
) {
    for frame_id in frame_ids {
        if frame_id.is_empty() {
            continue;
        }
        let Some(raw) = source.aux_text(frame_id) else {
            continue;
        };
        let text = conv.convert(&raw);
        let text = text.trim();
        if !text.is_empty() {
            item.set_aux_data(frame_id.clone(), text);
        }
    }
}

fn text_of(raw: &RawValue, conv: &StringConverter) -> Option<String> {
    let text = match raw {
        RawValue::Text(text) | RawValue::FullDate(text) => conv.convert(text),
        RawValue::Year(n) | RawValue::Number(n) => n.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn date_value(raw: &RawValue, conv: &StringConverter) -> Option<String> {
    match raw {
        RawValue::Year(year) | RawValue::Number(year) => {
            (*year > 0).then(|| format!("{year:04}-01-01"))
        }
        RawValue::FullDate(_) | RawValue::Text(_) => text_of(raw, conv),
    }
}

/// Positive track index; text such as `"5/12"` keeps the leading number.
fn track_number(raw: &RawValue) -> Option<u32> {
    let value = match raw {
        RawValue::Number(n) | RawValue::Year(n) => *n,
        RawValue::Text(text) | RawValue::FullDate(text) => {
            let head = text.trim().split('/').next().unwrap_or_default();
            head.trim().parse::<i64>().ok()?
        }
    };
    u32::try_from(value).ok().filter(|track| *track > 0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mediameta_types::ContainerFamily;

    use super::*;
    use crate::error::FieldReadError;
    use crate::source::{EmbeddedArtwork, TechnicalProperties};

    #[derive(Default)]
    struct StubSource {
        fields: HashMap<MetadataField, RawValue>,
        broken: Vec<MetadataField>,
        aux: HashMap<String, String>,
    }

    impl TagSource for StubSource {
        fn family(&self) -> ContainerFamily {
            ContainerFamily::Mpeg
        }

        fn field(&self, field: MetadataField) -> Result<Option<RawValue>, FieldReadError> {
            if self.broken.contains(&field) {
                return Err(FieldReadError::new(field, "corrupt frame"));
            }
            Ok(self.fields.get(&field).cloned())
        }

        fn embedded_artwork(&self) -> Option<EmbeddedArtwork> {
            None
        }

        fn technical_properties(&self) -> TechnicalProperties {
            TechnicalProperties::default()
        }

        fn aux_text(&self, frame_id: &str) -> Option<String> {
            self.aux.get(frame_id).cloned()
        }
    }

    fn item() -> MediaItem {
        MediaItem::new("/music/track.mp3", "audio/mpeg")
    }

    fn normalize(fields: Vec<(MetadataField, RawValue)>) -> MediaItem {
        let source = StubSource {
            fields: fields.into_iter().collect(),
            ..Default::default()
        };
        let mut item = item();
        normalize_fields(&source, &mut item, &StringConverter::default());
        item
    }

    #[test]
    fn missing_fields_stay_absent() {
        let item = normalize(Vec::new());
        for field in MetadataField::ALL {
            assert_eq!(item.metadata(field), None);
        }
        assert_eq!(item.track_number, None);
    }

    #[test]
    fn text_is_trimmed_and_blank_is_absent() {
        let item = normalize(vec![
            (MetadataField::Title, RawValue::Text("  Kind of Blue \0".to_string())),
            (MetadataField::Genre, RawValue::Text("   ".to_string())),
        ]);
        assert_eq!(item.metadata(MetadataField::Title), Some("Kind of Blue"));
        assert_eq!(item.metadata(MetadataField::Genre), None);
    }

    #[test]
    fn year_becomes_first_of_january() {
        let item = normalize(vec![(MetadataField::Date, RawValue::Year(2003))]);
        assert_eq!(item.metadata(MetadataField::Date), Some("2003-01-01"));

        let item = normalize(vec![(MetadataField::Date, RawValue::Year(0))]);
        assert_eq!(item.metadata(MetadataField::Date), None);
    }

    #[test]
    fn full_date_passes_through() {
        let item = normalize(vec![(
            MetadataField::Date,
            RawValue::FullDate(" 2016-09-15 12:34:56 ".to_string()),
        )]);
        assert_eq!(item.metadata(MetadataField::Date), Some("2016-09-15 12:34:56"));

        let item = normalize(vec![(MetadataField::Date, RawValue::FullDate(String::new()))]);
        assert_eq!(item.metadata(MetadataField::Date), None);
    }

    #[test]
    fn track_number_must_be_positive() {
        let item = normalize(vec![(MetadataField::TrackNumber, RawValue::Number(5))]);
        assert_eq!(item.metadata(MetadataField::TrackNumber), Some("5"));
        assert_eq!(item.track_number, Some(5));

        for bad in [0, -3] {
            let item = normalize(vec![(MetadataField::TrackNumber, RawValue::Number(bad))]);
            assert_eq!(item.metadata(MetadataField::TrackNumber), None);
            assert_eq!(item.track_number, None);
        }
    }

    #[test]
    fn textual_track_keeps_leading_index() {
        let track = |text: &str| (MetadataField::TrackNumber, RawValue::Text(text.to_string()));
        let item = normalize(vec![track("7/12")]);
        assert_eq!(item.track_number, Some(7));
        let item = normalize(vec![track("side A")]);
        assert_eq!(item.track_number, None);
    }

    #[test]
    fn failing_field_does_not_abort_others() {
        let source = StubSource {
            fields: [
                (MetadataField::Title, RawValue::Text("Title".to_string())),
                (MetadataField::Album, RawValue::Text("Album".to_string())),
            ]
            .into_iter()
            .collect(),
            broken: vec![MetadataField::Artist],
            ..Default::default()
        };
        let mut item = item();
        let written = normalize_fields(&source, &mut item, &StringConverter::default());
        assert_eq!(written, 2);
        assert_eq!(item.metadata(MetadataField::Title), Some("Title"));
        assert_eq!(item.metadata(MetadataField::Album), Some("Album"));
        assert_eq!(item.metadata(MetadataField::Artist), None);
    }

    #[test]
    fn aux_frames_copied_when_present() {
        let source = StubSource {
            aux: [("TCOM".to_string(), " Bill Evans ".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let mut item = item();
        let frames = vec!["TCOM".to_string(), "TBPM".to_string(), String::new()];
        collect_aux_data(&source, &mut item, &frames, &StringConverter::default());
        assert_eq!(item.aux_data.get("TCOM").map(String::as_str), Some("Bill Evans"));
        assert!(!item.aux_data.contains_key("TBPM"));
    }
}
