//! Metadata extraction for media catalogs.
//!
//! Reads tags from JPEG/EXIF, MP3/ID3v2, FLAC and MP4 containers, normalizes
//! them into canonical catalog fields, attaches technical stream attributes and
//! resolves album art. Artwork is only registered at extraction time; its bytes
//! are re-derived from the source file when served.

pub mod album_art;
pub mod attributes;
pub mod charset;
pub mod config;
pub mod describe;
pub mod detect;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod scan;
pub mod serve;
pub mod source;

pub use album_art::{AlbumArtResolver, ArtResolution};
pub use config::{ConfigFile, ExtractConfig};
pub use error::{ExtractError, ServeError};
pub use extract::{ExtractSummary, extract_file, extract_into};
pub use scan::{ScanFailure, ScanReport, scan_library};
pub use serve::{ArtworkContent, parse_single_range, serve_artwork};
