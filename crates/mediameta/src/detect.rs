//! Map files to a container family by extension, falling back to content sniffing.

use std::path::Path;

use mediameta_types::ContainerFamily;

/// Family and item mimetype for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detected {
    pub family: ContainerFamily,
    pub mime_type: String,
}

pub fn family_for_extension(ext: &str) -> Option<ContainerFamily> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" => Some(ContainerFamily::Image),
        "mp3" => Some(ContainerFamily::Mpeg),
        "flac" => Some(ContainerFamily::Flac),
        "mp4" | "m4a" | "m4b" | "m4v" | "mov" => Some(ContainerFamily::Mp4),
        _ => None,
    }
}

pub fn family_for_mime(mime: &str) -> Option<ContainerFamily> {
    match mime {
        "image/jpeg" => Some(ContainerFamily::Image),
        "audio/mpeg" => Some(ContainerFamily::Mpeg),
        "audio/x-flac" | "audio/flac" => Some(ContainerFamily::Flac),
        "video/mp4" | "audio/m4a" | "audio/mp4" | "video/quicktime" => Some(ContainerFamily::Mp4),
        _ => None,
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "mp3" => "audio/mpeg",
        "flac" => "audio/x-flac",
        "m4a" | "m4b" => "audio/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}

/// Detect the container family of `path`.
///
/// Extensions win; `sniff` enables a look at the file head for anything else.
pub fn detect_family(path: &Path, sniff: bool) -> Option<Detected> {
    let ext = path.extension().and_then(|ext| ext.to_str());
    if let Some(ext) = ext {
        if let (Some(family), Some(mime)) = (family_for_extension(ext), mime_for_extension(ext)) {
            return Some(Detected {
                family,
                mime_type: mime.to_string(),
            });
        }
    }
    if !sniff {
        return None;
    }
    let kind = match infer::get_from_path(path) {
        Ok(kind) => kind?,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "sniff failed");
            return None;
        }
    };
    let family = family_for_mime(kind.mime_type())?;
    Some(Detected {
        family,
        mime_type: kind.mime_type().to_string(),
    })
}
