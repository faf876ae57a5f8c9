//! Error types for extraction and serving.

use std::path::PathBuf;

use mediameta_types::MetadataField;
use thiserror::Error;

/// Failure to open or parse a container with its raw tag source.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tags(#[from] lofty::error::LoftyError),
    #[error("not a {0} container")]
    WrongContainer(&'static str),
}

/// A single raw field could not be read; never aborts the other fields.
#[derive(Debug, Error)]
#[error("{field:?}: {reason}")]
pub struct FieldReadError {
    pub field: MetadataField,
    pub reason: String,
}

impl FieldReadError {
    pub fn new(field: MetadataField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that abort extraction for one file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no supported container family for {path:?}")]
    UnsupportedContainer { path: PathBuf },
    #[error("could not read {family} container {path:?}")]
    SourceUnreadable {
        path: PathBuf,
        family: &'static str,
        #[source]
        source: OpenError,
    },
}

/// Errors surfaced to a client requesting a registered artwork resource.
///
/// Every variant is NotFound-class: the resource cannot be produced right now.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("item has no resource {index}")]
    NoSuchResource { index: usize },
    #[error("resource {index} is not album art")]
    NotAlbumArt { index: usize },
    #[error("could not reopen {path:?}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: OpenError,
    },
    #[error("no album art found for {path:?}")]
    ArtworkNotFound { path: PathBuf },
}

/// Invalid values in an otherwise well-formed configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown charset {0:?}")]
    UnknownCharset(String),
}
