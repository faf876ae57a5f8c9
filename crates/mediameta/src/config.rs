//! Configuration loading and parsing.
//!
//! Defines the TOML schema and resolves it into the immutable snapshot that is
//! handed to every extraction and serving call.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::charset::{Charset, StringConverter};
use crate::error::ConfigError;

/// Top-level configuration file loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Import/extraction settings.
    pub import: Option<ImportConfig>,
}

/// `[import]` section.
#[derive(Debug, Default, Deserialize)]
pub struct ImportConfig {
    /// Charset assumed for raw tag bytes that are not valid UTF-8.
    pub charset: Option<String>,
    /// Extra ID3v2 text frame ids copied into the item's aux data.
    pub aux_tags: Option<Vec<String>>,
    /// Enable content sniffing for artwork and container detection.
    pub sniff_mimetype: Option<bool>,
}

impl ConfigFile {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse config {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str::<ConfigFile>(raw)?)
    }
}

/// Read-only settings shared by all extraction and serving calls.
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    pub charset: Charset,
    pub aux_tags: Vec<String>,
    pub sniff_mimetype: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            charset: Charset::Utf8,
            aux_tags: Vec::new(),
            sniff_mimetype: true,
        }
    }
}

impl ExtractConfig {
    /// Resolve a parsed config file, filling defaults for missing values.
    pub fn from_file(cfg: &ConfigFile) -> Result<Self, ConfigError> {
        let mut resolved = Self::default();
        let Some(import) = cfg.import.as_ref() else {
            return Ok(resolved);
        };
        if let Some(charset) = import.charset.as_deref() {
            resolved.charset = charset.parse()?;
        }
        if let Some(tags) = import.aux_tags.as_ref() {
            resolved.aux_tags = tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(sniff) = import.sniff_mimetype {
            resolved.sniff_mimetype = sniff;
        }
        Ok(resolved)
    }

    /// Load and resolve in one step.
    pub fn load(path: &Path) -> Result<Self> {
        let cfg = ConfigFile::load(path)?;
        Self::from_file(&cfg).with_context(|| format!("resolve config {:?}", path))
    }

    pub fn converter(&self) -> StringConverter {
        StringConverter::new(self.charset)
    }
}
