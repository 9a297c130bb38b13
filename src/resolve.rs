//! Asset resolution: one reference in, raw bytes (or an embeddable costume
//! payload) out.
//!
//! Exactly one backend is selected when a project loads — every asset of an
//! archive-loaded project comes from the archive, every asset of a
//! network-loaded project from the remote service. The two are never mixed.

use std::sync::Arc;

use base64::Engine as _;
use tracing::warn;

use crate::{
    archive::ProjectArchive,
    config::LoaderConfig,
    descriptor::AssetReference,
    error::{StageError, StageResult},
    fetch::Fetch,
};

/// Materialized costume image.
#[derive(Clone, Debug, PartialEq)]
pub enum CostumePayload {
    /// Raw fetched bytes (remote mode), with pixel dimensions when the bytes
    /// decode as a raster image.
    Bytes {
        /// Fetched image bytes.
        bytes: Vec<u8>,
        /// Probed width, when decodable.
        width: Option<u32>,
        /// Probed height, when decodable.
        height: Option<u32>,
    },
    /// Self-contained `data:<mime>;base64,` string (archive mode).
    DataUrl(String),
}

/// Resolves asset references against the backend selected at load time.
#[derive(Clone)]
pub struct AssetResolver {
    source: AssetSource,
}

#[derive(Clone)]
enum AssetSource {
    Remote {
        fetch: Arc<dyn Fetch>,
        config: Arc<LoaderConfig>,
    },
    Archive {
        archive: Arc<ProjectArchive>,
    },
}

impl AssetResolver {
    /// Resolver that fetches every asset from the remote service.
    pub fn remote(fetch: Arc<dyn Fetch>, config: Arc<LoaderConfig>) -> Self {
        Self {
            source: AssetSource::Remote { fetch, config },
        }
    }

    /// Resolver that reads every asset from a pre-loaded archive.
    pub fn archive(archive: Arc<ProjectArchive>) -> Self {
        Self {
            source: AssetSource::Archive { archive },
        }
    }

    /// Whether this resolver reads from an archive.
    pub fn is_archive(&self) -> bool {
        matches!(self.source, AssetSource::Archive { .. })
    }

    /// Resolve an asset reference to raw bytes.
    ///
    /// An archive miss is an explicit [`StageError::AssetUnresolved`]; it
    /// never leaves the caller waiting on a request that cannot complete.
    pub async fn resolve(&self, asset: &AssetReference) -> StageResult<Vec<u8>> {
        match &self.source {
            AssetSource::Remote { fetch, config } => {
                fetch.fetch_bytes(&config.asset_url(&asset.digest)).await
            }
            AssetSource::Archive { archive } => {
                let name = asset.archive_entry_name();
                match archive.entry(&name) {
                    Some(bytes) => Ok(bytes.to_vec()),
                    None => {
                        warn!(entry = %name, "archive miss for asset");
                        Err(StageError::AssetUnresolved(name))
                    }
                }
            }
        }
    }

    /// Resolve a costume reference to its presentation payload.
    ///
    /// Archive mode embeds the image as a data URL with a MIME marker chosen
    /// from the digest extension; remote mode delivers the fetched bytes with
    /// probed dimensions where the format is decodable.
    pub async fn resolve_costume(&self, asset: &AssetReference) -> StageResult<CostumePayload> {
        match &self.source {
            AssetSource::Remote { .. } => {
                let bytes = self.resolve(asset).await?;
                let (width, height) = probe_dimensions(&bytes);
                Ok(CostumePayload::Bytes {
                    bytes,
                    width,
                    height,
                })
            }
            AssetSource::Archive { .. } => {
                let extension = asset.digest_extension();
                let Some(mime) = mime_for_extension(extension) else {
                    warn!(%extension, "cannot embed costume with unknown extension");
                    return Err(StageError::UnknownExtension(extension.to_string()));
                };
                let bytes = self.resolve(asset).await?;
                let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
                Ok(CostumePayload::DataUrl(format!(
                    "data:{mime};base64,{payload}"
                )))
            }
        }
    }
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        ".png" => Some("image/png"),
        ".svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Pixel dimensions of raster bytes, or `(None, None)` for formats the image
/// decoder does not handle (vector costumes in particular).
fn probe_dimensions(bytes: &[u8]) -> (Option<u32>, Option<u32>) {
    match image::load_from_memory(bytes) {
        Ok(img) => (Some(img.width()), Some(img.height())),
        Err(_) => (None, None),
    }
}
