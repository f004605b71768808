//! Asynchronous card-face loading.

use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    future::Future,
    hash::{Hash, Hasher},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{
    error::AssetError,
    pool::{is_image_name, AssetLayout, ImageId},
};

/// Where a face's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceOrigin {
    /// Read from an image file.
    File,
    /// Synthesised from the identifier alone.
    Generated,
}

/// A resolved front face, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFace {
    /// Identifier this face belongs to.
    pub id: ImageId,
    /// Stable hash of the face data; drives the rendered motif.
    pub fingerprint: u64,
    /// Size of the source data in bytes.
    pub byte_len: usize,
    /// Source of the data.
    pub origin: FaceOrigin,
}

impl CardFace {
    fn from_bytes(id: ImageId, bytes: &[u8], origin: FaceOrigin) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            id,
            fingerprint: hasher.finish(),
            byte_len: bytes.len(),
            origin,
        }
    }
}

/// Resolves card identifiers to faces, one identifier per call.
pub trait AssetSource: Send + Sync + 'static {
    /// Load the face for `id`, or report why it cannot be shown.
    fn load(&self, id: ImageId) -> impl Future<Output = Result<CardFace, AssetError>> + Send;
}

/// Reads faces from `<root>/front`, caching each successful load.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    layout: AssetLayout,
    cache: HashMap<ImageId, CardFace>,
}

impl FsAssetSource {
    /// Source rooted at the given asset directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                layout: AssetLayout::new(root),
                cache: HashMap::new(),
            })),
        }
    }

    /// Number of faces held in the cache.
    pub fn cached(&self) -> usize {
        self.inner.read().cache.len()
    }

    fn cached_face(&self, id: &ImageId) -> Option<CardFace> {
        self.inner.read().cache.get(id).cloned()
    }

    fn remember(&self, face: CardFace) {
        self.inner.write().cache.insert(face.id.clone(), face);
    }
}

impl AssetSource for FsAssetSource {
    async fn load(&self, id: ImageId) -> Result<CardFace, AssetError> {
        if let Some(face) = self.cached_face(&id) {
            return Ok(face);
        }
        if !is_image_name(id.as_str()) {
            return Err(AssetError::Unsupported(id.to_string()));
        }

        let path = self.inner.read().layout.front(&id);
        let bytes = read_asset(&path).await?;
        let face = CardFace::from_bytes(id, &bytes, FaceOrigin::File);
        debug!(image = %face.id, bytes = face.byte_len, "Loaded card face");
        self.remember(face.clone());
        Ok(face)
    }
}

async fn read_asset(path: &Path) -> Result<Vec<u8>, AssetError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Err(AssetError::Empty(path.to_path_buf())),
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Card face missing");
            Err(AssetError::Missing(path.to_path_buf()))
        }
        Err(err) => Err(AssetError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

/// Produces faces from identifiers when no image files are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedAssets;

impl AssetSource for GeneratedAssets {
    async fn load(&self, id: ImageId) -> Result<CardFace, AssetError> {
        let seed = id.as_str().as_bytes().to_vec();
        Ok(CardFace::from_bytes(id, &seed, FaceOrigin::Generated))
    }
}

/// The asset source chosen at startup.
#[derive(Debug, Clone)]
pub enum CardAssets {
    /// Image files on disk.
    Files(FsAssetSource),
    /// Synthesised faces.
    Generated(GeneratedAssets),
}

impl CardAssets {
    /// Files when an asset root is configured, generated faces otherwise.
    pub fn for_root(root: Option<&Path>) -> Self {
        match root {
            Some(root) => Self::Files(FsAssetSource::new(root)),
            None => Self::Generated(GeneratedAssets),
        }
    }
}

impl AssetSource for CardAssets {
    async fn load(&self, id: ImageId) -> Result<CardFace, AssetError> {
        match self {
            Self::Files(source) => source.load(id).await,
            Self::Generated(source) => source.load(id).await,
        }
    }
}
