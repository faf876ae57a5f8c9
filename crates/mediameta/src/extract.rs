//! Single-file extraction: detect, open, normalize, attach resources.

use std::path::Path;

use mediameta_types::{ContainerFamily, MediaItem, ResourceAttr};

use crate::album_art::{AlbumArtResolver, ArtResolution};
use crate::attributes::apply_technical_attributes;
use crate::config::ExtractConfig;
use crate::detect::detect_family;
use crate::error::ExtractError;
use crate::normalize::{collect_aux_data, normalize_fields};
use crate::source::{RawTagSource, TagSource};

/// What one extraction pass did to an item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSummary {
    pub fields: usize,
    pub art: Option<ArtResolution>,
}

/// Build a catalog item for `path`.
pub fn extract_file(path: &Path, config: &ExtractConfig) -> Result<MediaItem, ExtractError> {
    let detected = detect_family(path, config.sniff_mimetype).ok_or_else(|| {
        ExtractError::UnsupportedContainer {
            path: path.to_path_buf(),
        }
    })?;
    let mut item = MediaItem::new(path, detected.mime_type);
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() > 0 {
            item.add_attribute(0, ResourceAttr::Size, meta.len().to_string());
        }
    }
    let resolver = AlbumArtResolver::from_config(config);
    extract_into(&mut item, detected.family, config, &resolver)?;
    Ok(item)
}

/// Populate an existing item from the container at its location.
pub fn extract_into(
    item: &mut MediaItem,
    family: ContainerFamily,
    config: &ExtractConfig,
    resolver: &AlbumArtResolver,
) -> Result<ExtractSummary, ExtractError> {
    let conv = config.converter();
    let source = match RawTagSource::open(family, item.location(), &conv) {
        Ok(source) => source,
        Err(source) => {
            tracing::warn!(
                path = %item.location().display(),
                family = family.label(),
                error = %source,
                "cannot read container"
            );
            return Err(ExtractError::SourceUnreadable {
                path: item.location().to_path_buf(),
                family: family.label(),
                source,
            });
        }
    };

    let fields = normalize_fields(&source, item, &conv);

    let art = if family.is_av() {
        if family == ContainerFamily::Mpeg {
            collect_aux_data(&source, item, &config.aux_tags, &conv);
        }
        apply_technical_attributes(item, &source.technical_properties());
        Some(resolver.resolve(&source, item))
    } else {
        None
    };

    tracing::debug!(
        path = %item.location().display(),
        family = source.family().label(),
        fields,
        art = ?art,
        "extracted"
    );
    Ok(ExtractSummary { fields, art })
}
