//! Deferred serving of registered album art.
//!
//! Nothing is cached at extraction time: the container is reopened and the
//! embedded-then-sibling lookup runs again for every request.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use mediameta_types::{MIMETYPE_DEFAULT, MediaItem};

use crate::album_art::AlbumArtResolver;
use crate::config::ExtractConfig;
use crate::error::ServeError;
use crate::source::RawTagSource;

/// Artwork bytes ready to be streamed; length known up front.
#[derive(Debug)]
pub struct ArtworkContent {
    mime_type: String,
    inner: Cursor<Vec<u8>>,
}

impl ArtworkContent {
    fn new(mime_type: String, data: Vec<u8>) -> Self {
        Self {
            mime_type,
            inner: Cursor::new(data),
        }
    }

    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Bytes `start..=end`; the read position is left after `end`.
    pub fn read_range(&mut self, start: u64, end: u64) -> io::Result<Vec<u8>> {
        if start > end || end >= self.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("range {start}-{end} outside {} bytes", self.len()),
            ));
        }
        self.inner.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start + 1) as usize];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl Read for ArtworkContent {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for ArtworkContent {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Reproduce the artwork behind resource `index` of `item`.
pub fn serve_artwork(
    item: &MediaItem,
    index: usize,
    config: &ExtractConfig,
) -> Result<ArtworkContent, ServeError> {
    serve_artwork_with(item, index, config, &AlbumArtResolver::from_config(config))
}

pub fn serve_artwork_with(
    item: &MediaItem,
    index: usize,
    config: &ExtractConfig,
    resolver: &AlbumArtResolver,
) -> Result<ArtworkContent, ServeError> {
    let res = item
        .resource(index)
        .ok_or(ServeError::NoSuchResource { index })?;
    let handler = match res.handler {
        Some(handler) if res.is_album_art() => handler,
        _ => return Err(ServeError::NotAlbumArt { index }),
    };
    let path = item.location();
    let source = RawTagSource::open(handler, path, &config.converter()).map_err(|source| {
        ServeError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let candidate = resolver
        .find_candidate(&source, path)
        .ok_or_else(|| ServeError::ArtworkNotFound {
            path: path.to_path_buf(),
        })?;
    let mime_type = res.mime_type().unwrap_or(MIMETYPE_DEFAULT).to_string();
    tracing::debug!(
        path = %path.display(),
        index,
        bytes = candidate.data.len(),
        origin = ?candidate.origin,
        "serving album art"
    );
    Ok(ArtworkContent::new(mime_type, candidate.data))
}

/// Inclusive byte range from an HTTP `Range` header value.
///
/// Accepts `bytes=start-end`, `bytes=start-` and the suffix form `bytes=-n`;
/// only the first range of a list is used. `end` is clamped to the content.
pub fn parse_single_range(header: &str, total_len: u64) -> Option<(u64, u64)> {
    let range = header.trim().strip_prefix("bytes=")?;
    let first = range.split(',').next()?.trim();
    let (start_s, end_s) = first.split_once('-')?;
    let last = total_len.checked_sub(1)?;
    if start_s.is_empty() {
        let suffix = end_s.parse::<u64>().ok()?;
        if suffix == 0 {
            return None;
        }
        return Some((total_len.saturating_sub(suffix), last));
    }
    let start = start_s.parse::<u64>().ok()?;
    let end = if end_s.is_empty() {
        last
    } else {
        end_s.parse::<u64>().ok()?
    };
    if start > last || end < start {
        return None;
    }
    Some((start, end.min(last)))
}
