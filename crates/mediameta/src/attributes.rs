//! Technical attributes of the primary stream.

use mediameta_types::{MediaItem, ResourceAttr};

use crate::source::{Bitrate, TechnicalProperties};

const PRIMARY: usize = 0;

/// Bitrate as bytes per second.
///
/// Kilobit sources use the 1024-based kilobit, matching what tag libraries
/// have historically reported.
pub fn bitrate_bytes_per_second(bitrate: Bitrate) -> Option<i64> {
    let bytes = match bitrate {
        Bitrate::KilobitsPerSecond(kbps) if kbps > 0 => kbps * 1024 / 8,
        Bitrate::BitsPerSecond(bps) if bps > 0 => bps / 8,
        _ => return None,
    };
    Some(bytes)
}

/// `H:MM:SS`, hours unbounded.
pub fn seconds_to_hms(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// Write bitrate, duration, sample rate and channels onto resource 0.
/// Non-positive values are skipped.
pub fn apply_technical_attributes(item: &mut MediaItem, props: &TechnicalProperties) {
    if let Some(bytes) = props.bitrate.and_then(bitrate_bytes_per_second) {
        item.add_attribute(PRIMARY, ResourceAttr::Bitrate, bytes.to_string());
    }
    if let Some(secs) = props.duration.and_then(|d| d.whole_seconds()) {
        if secs > 0 {
            item.add_attribute(PRIMARY, ResourceAttr::Duration, seconds_to_hms(secs));
        }
    }
    if let Some(rate) = props.sample_rate.filter(|rate| *rate > 0) {
        item.add_attribute(PRIMARY, ResourceAttr::SampleFrequency, rate.to_string());
    }
    if let Some(channels) = props.channels.filter(|channels| *channels > 0) {
        item.add_attribute(PRIMARY, ResourceAttr::NrAudioChannels, channels.to_string());
    }
}
