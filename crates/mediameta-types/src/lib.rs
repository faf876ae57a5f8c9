use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Resource parameter naming the kind of content a resource carries.
pub const RESOURCE_CONTENT_TYPE: &str = "rct";
/// Content-type parameter value marking a resource as album art.
pub const ALBUM_ART_CONTENT: &str = "aa";
/// Mimetype used when nothing better could be established.
pub const MIMETYPE_DEFAULT: &str = "application/octet-stream";

/// Render the protocol info string advertised for a resource.
pub fn render_protocol_info(mime_type: &str) -> String {
    format!("http-get:*:{mime_type}:*")
}

/// Media container family; decides which raw tag source reads a file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFamily {
    /// JPEG images carrying EXIF data.
    Image,
    /// MPEG audio with ID3v2 tags.
    Mpeg,
    /// FLAC with Vorbis comments and picture blocks.
    Flac,
    /// ISO base media (MP4/M4A) with ilst atoms.
    Mp4,
}

impl ContainerFamily {
    /// Short label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            ContainerFamily::Image => "image",
            ContainerFamily::Mpeg => "mpeg",
            ContainerFamily::Flac => "flac",
            ContainerFamily::Mp4 => "mp4",
        }
    }

    /// `true` for families that carry an audio/video stream.
    pub fn is_av(self) -> bool {
        !matches!(self, ContainerFamily::Image)
    }
}

/// Canonical, format-independent metadata field understood by the catalog.
///
/// Serialized under the catalog key, so a JSON item reads `{"dc:title": ...}`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataField {
    #[serde(rename = "dc:title")]
    Title,
    #[serde(rename = "upnp:artist")]
    Artist,
    #[serde(rename = "upnp:album")]
    Album,
    #[serde(rename = "dc:date")]
    Date,
    #[serde(rename = "upnp:genre")]
    Genre,
    #[serde(rename = "dc:description")]
    Description,
    #[serde(rename = "upnp:originalTrackNumber")]
    TrackNumber,
    #[serde(rename = "upnp:albumArtURI")]
    AlbumArtUri,
}

impl MetadataField {
    /// Every field, in normalization order.
    pub const ALL: [MetadataField; 8] = [
        MetadataField::Title,
        MetadataField::Artist,
        MetadataField::Album,
        MetadataField::Date,
        MetadataField::Genre,
        MetadataField::Description,
        MetadataField::TrackNumber,
        MetadataField::AlbumArtUri,
    ];

    /// External catalog key for this field.
    pub fn catalog_key(self) -> &'static str {
        match self {
            MetadataField::Title => "dc:title",
            MetadataField::Artist => "upnp:artist",
            MetadataField::Album => "upnp:album",
            MetadataField::Date => "dc:date",
            MetadataField::Genre => "upnp:genre",
            MetadataField::Description => "dc:description",
            MetadataField::TrackNumber => "upnp:originalTrackNumber",
            MetadataField::AlbumArtUri => "upnp:albumArtURI",
        }
    }
}

/// Resource attribute names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceAttr {
    /// Stream bitrate in bytes per second.
    Bitrate,
    /// Playing time as `H:MM:SS`.
    Duration,
    /// Sample rate in Hz.
    SampleFrequency,
    /// Number of audio channels.
    NrAudioChannels,
    /// `http-get:*:{mime}:*`.
    ProtocolInfo,
    /// Payload size in bytes.
    Size,
}

impl ResourceAttr {
    pub fn name(self) -> &'static str {
        match self {
            ResourceAttr::Bitrate => "bitrate",
            ResourceAttr::Duration => "duration",
            ResourceAttr::SampleFrequency => "sampleFrequency",
            ResourceAttr::NrAudioChannels => "nrAudioChannels",
            ResourceAttr::ProtocolInfo => "protocolInfo",
            ResourceAttr::Size => "size",
        }
    }
}

/// One deliverable artifact attached to an item.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Container family that has to be reopened to serve this resource.
    /// `None` for the primary stream, which is served from the file itself.
    pub handler: Option<ContainerFamily>,
    /// Resource attributes keyed by [`ResourceAttr::name`].
    pub attributes: BTreeMap<String, String>,
    /// Extra resource parameters (content-type marker and such).
    pub parameters: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    /// Descriptor for the primary media stream.
    pub fn primary() -> Self {
        Self::default()
    }

    /// Descriptor for an album art attachment served through `handler`.
    pub fn album_art(handler: ContainerFamily, mime_type: &str) -> Self {
        let mut res = Self {
            handler: Some(handler),
            ..Self::default()
        };
        res.attributes.insert(
            ResourceAttr::ProtocolInfo.name().to_string(),
            render_protocol_info(mime_type),
        );
        res.parameters.insert(
            RESOURCE_CONTENT_TYPE.to_string(),
            ALBUM_ART_CONTENT.to_string(),
        );
        res
    }

    pub fn attribute(&self, attr: ResourceAttr) -> Option<&str> {
        self.attributes.get(attr.name()).map(String::as_str)
    }

    pub fn is_album_art(&self) -> bool {
        self.parameters
            .get(RESOURCE_CONTENT_TYPE)
            .is_some_and(|value| value == ALBUM_ART_CONTENT)
    }

    /// Mimetype recovered from the protocol info attribute.
    pub fn mime_type(&self) -> Option<&str> {
        let info = self.attribute(ResourceAttr::ProtocolInfo)?;
        info.split(':').nth(2).filter(|mime| !mime.is_empty())
    }
}

/// Catalog item populated by extraction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaItem {
    /// Absolute location of the media file.
    pub location: PathBuf,
    /// Mimetype of the primary stream, as assigned by the catalog.
    pub mime_type: String,
    /// Canonical metadata; at most one value per field.
    pub metadata: BTreeMap<MetadataField, String>,
    /// Track number attribute, mirrored from [`MetadataField::TrackNumber`].
    pub track_number: Option<u32>,
    /// Auxiliary raw tags requested by configuration.
    pub aux_data: BTreeMap<String, String>,
    /// Resources; index 0 is always the primary stream.
    pub resources: Vec<ResourceDescriptor>,
}

impl MediaItem {
    /// Create an item with its primary resource in place.
    pub fn new(location: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            mime_type: mime_type.into(),
            metadata: BTreeMap::new(),
            track_number: None,
            aux_data: BTreeMap::new(),
            resources: vec![ResourceDescriptor::primary()],
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn metadata(&self, field: MetadataField) -> Option<&str> {
        self.metadata.get(&field).map(String::as_str)
    }

    pub fn set_metadata(&mut self, field: MetadataField, value: impl Into<String>) {
        self.metadata.insert(field, value.into());
    }

    pub fn set_track_number(&mut self, track: u32) {
        self.track_number = Some(track);
    }

    pub fn set_aux_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.aux_data.insert(key.into(), value.into());
    }

    /// Append a resource and return its index.
    pub fn add_resource(&mut self, resource: ResourceDescriptor) -> usize {
        self.resources.push(resource);
        self.resources.len() - 1
    }

    pub fn resource(&self, index: usize) -> Option<&ResourceDescriptor> {
        self.resources.get(index)
    }

    /// Set an attribute on resource `index`; returns `false` if there is no such resource.
    pub fn add_attribute(
        &mut self,
        index: usize,
        attr: ResourceAttr,
        value: impl Into<String>,
    ) -> bool {
        match self.resources.get_mut(index) {
            Some(res) => {
                res.attributes.insert(attr.name().to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// First album art resource, with its index.
    pub fn album_art_resource(&self) -> Option<(usize, &ResourceDescriptor)> {
        self.resources
            .iter()
            .enumerate()
            .find(|(_, res)| res.is_album_art())
    }
}
