//! Album art resolution: embedded pictures first, then sibling image files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mediameta_types::{MIMETYPE_DEFAULT, MediaItem, ResourceDescriptor};

use crate::config::ExtractConfig;
use crate::source::TagSource;

/// Sibling names tried against each directory entry, in priority order.
/// Substring match, case-sensitive.
pub const ART_FILE_NAMES: [&str; 14] = [
    "Folder.jpg",
    "Folder.jpeg",
    "folder.jpg",
    "folder.jpeg",
    "Art.jpg",
    "Art.jpeg",
    "art.jpg",
    "art.jpeg",
    "Cover.jpg",
    "Cover.jpeg",
    "cover.jpg",
    "cover.jpeg",
    ".jpg",
    ".jpeg",
];

/// Lists the regular files of a directory in the order the platform returns them.
/// Symlinks to regular files are included.
pub trait DirLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FsDirLister;

impl DirLister for FsDirLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(dir = %dir.display(), error = %err, "skipping directory entry");
                    continue;
                }
            };
            // Follows symlinks, so a linked cover image still counts.
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Guesses a mimetype from content.
pub trait MimeSniffer {
    fn sniff(&self, data: &[u8]) -> Option<String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InferSniffer;

impl MimeSniffer for InferSniffer {
    fn sniff(&self, data: &[u8]) -> Option<String> {
        infer::get(data).map(|kind| kind.mime_type().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtworkOrigin {
    Embedded,
    Sibling(PathBuf),
}

/// Artwork bytes found for one media file, before mimetype validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkCandidate {
    pub data: Vec<u8>,
    pub declared_mime: Option<String>,
    pub origin: ArtworkOrigin,
}

/// Outcome of one resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtResolution {
    Registered { index: usize, mime_type: String },
    /// A candidate existed but its mimetype could not be established.
    Rejected,
    NotFound,
}

pub struct AlbumArtResolver {
    lister: Box<dyn DirLister + Send + Sync>,
    sniffer: Option<Box<dyn MimeSniffer + Send + Sync>>,
}

impl AlbumArtResolver {
    pub fn new(
        lister: Box<dyn DirLister + Send + Sync>,
        sniffer: Option<Box<dyn MimeSniffer + Send + Sync>>,
    ) -> Self {
        Self { lister, sniffer }
    }

    /// Filesystem lister, plus content sniffing when the config enables it.
    pub fn from_config(config: &ExtractConfig) -> Self {
        let sniffer: Option<Box<dyn MimeSniffer + Send + Sync>> = if config.sniff_mimetype {
            Some(Box::new(InferSniffer))
        } else {
            None
        };
        Self::new(Box::new(FsDirLister), sniffer)
    }

    /// Embedded artwork if the source has any, otherwise a sibling image.
    pub fn find_candidate(
        &self,
        source: &dyn TagSource,
        media_path: &Path,
    ) -> Option<ArtworkCandidate> {
        if let Some(embedded) = source.embedded_artwork() {
            if !embedded.data.is_empty() {
                return Some(ArtworkCandidate {
                    data: embedded.data,
                    declared_mime: embedded.mime_type,
                    origin: ArtworkOrigin::Embedded,
                });
            }
        }
        self.find_sibling_art(media_path)
    }

    pub fn find_sibling_art(&self, media_path: &Path) -> Option<ArtworkCandidate> {
        let dir = media_path.parent()?;
        let files = match self.lister.list(dir) {
            Ok(files) => files,
            Err(err) => {
                tracing::debug!(
                    dir = %dir.display(),
                    error = %err,
                    "cannot list album art siblings"
                );
                return None;
            }
        };
        let path = files.into_iter().find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| ART_FILE_NAMES.iter().any(|pattern| name.contains(pattern)))
        })?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "cannot read album art");
                return None;
            }
        };
        if data.is_empty() {
            return None;
        }
        Some(ArtworkCandidate {
            data,
            declared_mime: None,
            origin: ArtworkOrigin::Sibling(path),
        })
    }

    /// Final mimetype for a candidate; [`MIMETYPE_DEFAULT`] when unknown.
    pub fn validate_mime(&self, candidate: &ArtworkCandidate) -> String {
        if let Some(declared) = candidate.declared_mime.as_deref() {
            if declared.contains('/') {
                return declared.to_string();
            }
        }
        self.sniffer
            .as_ref()
            .and_then(|sniffer| sniffer.sniff(&candidate.data))
            .unwrap_or_else(|| MIMETYPE_DEFAULT.to_string())
    }

    /// Find, validate and register album art on `item`.
    ///
    /// At most one artwork resource is added. A rejected candidate ends the
    /// pass; siblings are not consulted after a rejected embedded picture.
    pub fn resolve(&self, source: &dyn TagSource, item: &mut MediaItem) -> ArtResolution {
        let Some(candidate) = self.find_candidate(source, item.location()) else {
            return ArtResolution::NotFound;
        };
        let mime_type = self.validate_mime(&candidate);
        if mime_type == MIMETYPE_DEFAULT {
            tracing::debug!(
                path = %item.location().display(),
                origin = ?candidate.origin,
                "album art rejected, unknown mimetype"
            );
            return ArtResolution::Rejected;
        }
        let index = item.add_resource(ResourceDescriptor::album_art(source.family(), &mime_type));
        tracing::debug!(
            path = %item.location().display(),
            index,
            mime = %mime_type,
            "album art registered"
        );
        ArtResolution::Registered { index, mime_type }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mediameta_types::{ContainerFamily, MetadataField, ResourceAttr};

    use super::*;
    use crate::error::FieldReadError;
    use crate::source::{EmbeddedArtwork, RawValue, TechnicalProperties};

    struct ArtOnly(Option<EmbeddedArtwork>);

    impl TagSource for ArtOnly {
        fn family(&self) -> ContainerFamily {
            ContainerFamily::Flac
        }

        fn field(&self, _field: MetadataField) -> Result<Option<RawValue>, FieldReadError> {
            Ok(None)
        }

        fn embedded_artwork(&self) -> Option<EmbeddedArtwork> {
            self.0.clone()
        }

        fn technical_properties(&self) -> TechnicalProperties {
            TechnicalProperties::default()
        }
    }

    /// Returns a fixed listing and counts calls.
    struct FixedLister {
        files: Vec<PathBuf>,
        calls: Arc<AtomicUsize>,
    }

    impl DirLister for FixedLister {
        fn list(&self, _dir: &Path) -> io::Result<Vec<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.files.clone())
        }
    }

    fn resolver(files: Vec<PathBuf>, sniff: bool) -> (AlbumArtResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let lister = FixedLister {
            files,
            calls: calls.clone(),
        };
        let sniffer: Option<Box<dyn MimeSniffer + Send + Sync>> = if sniff {
            Some(Box::new(InferSniffer))
        } else {
            None
        };
        (AlbumArtResolver::new(Box::new(lister), sniffer), calls)
    }

    fn embedded(mime: &str) -> ArtOnly {
        ArtOnly(Some(EmbeddedArtwork {
            data: b"\xff\xd8\xff\xe0\0\x10JFIF\0".to_vec(),
            mime_type: Some(mime.to_string()),
        }))
    }

    #[test]
    fn embedded_art_skips_directory_listing() {
        let (resolver, calls) = resolver(vec![PathBuf::from("/music/cover.jpg")], true);
        let mut item = MediaItem::new("/music/track.flac", "audio/x-flac");

        let outcome = resolver.resolve(&embedded("image/jpeg"), &mut item);
        assert_eq!(
            outcome,
            ArtResolution::Registered {
                index: 1,
                mime_type: "image/jpeg".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let res = item.resource(1).unwrap();
        assert!(res.is_album_art());
        assert_eq!(res.handler, Some(ContainerFamily::Flac));
        assert_eq!(
            res.attribute(ResourceAttr::ProtocolInfo),
            Some("http-get:*:image/jpeg:*")
        );
    }

    #[test]
    fn bogus_declared_mime_is_sniffed() {
        let (resolver, _) = resolver(Vec::new(), true);
        let mut item = MediaItem::new("/music/track.flac", "audio/x-flac");
        let outcome = resolver.resolve(&embedded("JPG"), &mut item);
        assert_eq!(
            outcome,
            ArtResolution::Registered {
                index: 1,
                mime_type: "image/jpeg".to_string()
            }
        );
    }

    #[test]
    fn unknown_mime_is_rejected_without_fallback() {
        let (resolver, calls) = resolver(vec![PathBuf::from("/music/cover.jpg")], false);
        let mut item = MediaItem::new("/music/track.flac", "audio/x-flac");

        assert_eq!(resolver.resolve(&embedded("JPG"), &mut item), ArtResolution::Rejected);
        assert_eq!(item.resources.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_listed_sibling_wins() {
        let dir = tempfile::tempdir().unwrap();
        let z_folder = dir.path().join("z_folder.jpg");
        let cover = dir.path().join("cover.jpg");
        std::fs::write(&z_folder, b"\xff\xd8\xff\xdbz").unwrap();
        std::fs::write(&cover, b"\xff\xd8\xff\xdbc").unwrap();

        let (resolver, calls) = resolver(vec![z_folder.clone(), cover], true);
        let candidate = resolver
            .find_candidate(&ArtOnly(None), &dir.path().join("track.mp3"))
            .unwrap();
        assert_eq!(candidate.origin, ArtworkOrigin::Sibling(z_folder));
        assert_eq!(candidate.declared_mime, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_art_siblings_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        let empty = dir.path().join("Folder.jpg");
        std::fs::write(&notes, b"liner notes").unwrap();
        std::fs::write(&empty, b"").unwrap();

        let (resolver, _) = resolver(vec![notes, empty], true);
        let mut item = MediaItem::new(dir.path().join("track.mp3"), "audio/mpeg");
        assert_eq!(resolver.resolve(&ArtOnly(None), &mut item), ArtResolution::NotFound);
        assert_eq!(item.resources.len(), 1);
    }

    #[test]
    fn filesystem_lister_returns_only_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cover.jpg.d")).unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"x").unwrap();

        let files = FsDirLister.list(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("cover.jpg")]);
    }

    #[cfg(unix)]
    #[test]
    fn filesystem_lister_follows_symlinked_art() {
        let dir = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        let target = shared.path().join("front.jpg");
        std::fs::write(&target, b"x").unwrap();
        let link = dir.path().join("cover.jpg");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("scans")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("dangling.jpg"))
            .unwrap();

        let files = FsDirLister.list(dir.path()).unwrap();
        assert_eq!(files, vec![link]);
    }

    #[test]
    fn declared_mime_with_slash_is_trusted() {
        let (resolver, _) = resolver(Vec::new(), false);
        let candidate = ArtworkCandidate {
            data: b"not an image".to_vec(),
            declared_mime: Some("image/webp".to_string()),
            origin: ArtworkOrigin::Embedded,
        };
        assert_eq!(resolver.validate_mime(&candidate), "image/webp");
    }
}
