//! The fixed set of front-face images a hand is drawn from.

use std::{
    cmp::Ordering,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::PoolError;

/// Number of faces shipped with the standard deck.
pub const STANDARD_POOL_SIZE: usize = 62;

/// Sub-directory of the asset root holding front faces.
pub const FRONT_DIR: &str = "front";

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)_?(\d+)\.[A-Za-z]+$").expect("invalid image name regex"));

/// File name of a single front-face image, e.g. `Dixit_17.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(String);

impl ImageId {
    /// Wrap a file name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Raw file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing card number, when the name carries one.
    pub fn number(&self) -> Option<u32> {
        NUMBERED_RE
            .captures(&self.0)
            .and_then(|caps| caps.get(2))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Human-facing label: `Dixit_17.png` becomes `Dixit 17`.
    pub fn label(&self) -> String {
        let stem = Path::new(&self.0)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.0);
        stem.replace('_', " ")
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable, ordered pool of front-face identifiers. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePool {
    ids: Arc<[ImageId]>,
}

impl ImagePool {
    /// Build a pool from explicit identifiers, keeping their order.
    pub fn from_ids(ids: impl IntoIterator<Item = ImageId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// The 62 generated names `Dixit_1.png` through `Dixit_62.png`.
    pub fn standard() -> Self {
        Self::from_ids((1..=STANDARD_POOL_SIZE).map(|n| ImageId::new(format!("Dixit_{n}.png"))))
    }

    /// Scan `<asset_root>/front` for image files.
    ///
    /// Numbered names are ordered numerically, the rest alphabetically after them.
    pub fn discover(asset_root: impl AsRef<Path>) -> Result<Self, PoolError> {
        let front = asset_root.as_ref().join(FRONT_DIR);
        if !front.is_dir() {
            return Err(PoolError::MissingDirectory(front));
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&front).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| PoolError::Scan {
                path: front.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_image_name(&name) {
                debug!(file = %name, "Skipping non-image file");
                continue;
            }
            ids.push(ImageId::new(name));
        }

        if ids.is_empty() {
            return Err(PoolError::Empty(front));
        }
        ids.sort_by(compare_ids);
        Ok(Self::from_ids(ids))
    }

    /// Discover from disk when a root is given, falling back to the standard pool.
    pub fn discover_or_standard(asset_root: Option<&Path>) -> Self {
        let Some(root) = asset_root else {
            return Self::standard();
        };
        match Self::discover(root) {
            Ok(pool) => pool,
            Err(err) => {
                warn!(%err, "Falling back to the standard image pool");
                Self::standard()
            }
        }
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the pool has no identifiers.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in pool order.
    pub fn ids(&self) -> &[ImageId] {
        &self.ids
    }

    /// Whether `id` belongs to the pool.
    pub fn contains(&self, id: &ImageId) -> bool {
        self.ids.contains(id)
    }
}

/// Paths of every static asset the widget uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    root: PathBuf,
}

impl AssetLayout {
    /// Layout rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path to a front face.
    pub fn front(&self, id: &ImageId) -> PathBuf {
        self.root.join(FRONT_DIR).join(id.as_str())
    }

    /// Shared card back.
    pub fn back(&self) -> PathBuf {
        self.root.join("Dixit_Back.png")
    }

    /// Full-screen background.
    pub fn background(&self) -> PathBuf {
        self.root.join("Background.png")
    }

    /// Loading-screen logo.
    pub fn logo(&self) -> PathBuf {
        self.root.join("Dixit_Logo.png")
    }

    /// Reshuffle button icon.
    pub fn shuffle_icon(&self) -> PathBuf {
        self.root.join("Shuffle_Button.png")
    }

    /// Static (non-face) assets that are absent from disk.
    pub fn missing_static(&self) -> Vec<PathBuf> {
        [
            self.back(),
            self.background(),
            self.logo(),
            self.shuffle_icon(),
        ]
        .into_iter()
        .filter(|path| !path.is_file())
        .collect()
    }
}

pub(crate) fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn compare_ids(a: &ImageId, b: &ImageId) -> Ordering {
    match (a.number(), b.number()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn standard_pool_has_sixty_two_distinct_names() {
        let pool = ImagePool::standard();
        assert_eq!(pool.len(), STANDARD_POOL_SIZE);
        assert_eq!(pool.ids()[0].as_str(), "Dixit_1.png");
        assert_eq!(pool.ids()[61].as_str(), "Dixit_62.png");

        let mut names: Vec<_> = pool.ids().to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), STANDARD_POOL_SIZE);
    }

    #[test]
    fn labels_and_numbers() {
        let id = ImageId::new("Dixit_17.png");
        assert_eq!(id.number(), Some(17));
        assert_eq!(id.label(), "Dixit 17");
        assert_eq!(ImageId::new("sunset.png").number(), None);
    }

    #[test]
    fn discovers_images_in_numeric_order() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let front = temp.path().join(FRONT_DIR);
        fs::create_dir_all(&front)?;
        for name in ["Dixit_10.png", "Dixit_2.png", "Dixit_1.png", "extra.jpg"] {
            fs::write(front.join(name), b"img")?;
        }
        fs::write(front.join("notes.txt"), "not an image")?;
        fs::create_dir_all(front.join("nested"))?;

        let pool = ImagePool::discover(temp.path())?;
        let names: Vec<_> = pool.ids().iter().map(ImageId::as_str).collect();
        assert_eq!(
            names,
            ["Dixit_1.png", "Dixit_2.png", "Dixit_10.png", "extra.jpg"]
        );
        Ok(())
    }

    #[test]
    fn discovery_errors_are_explicit() -> anyhow::Result<()> {
        let temp = tempdir()?;
        assert!(matches!(
            ImagePool::discover(temp.path()),
            Err(PoolError::MissingDirectory(_))
        ));

        fs::create_dir_all(temp.path().join(FRONT_DIR))?;
        assert!(matches!(
            ImagePool::discover(temp.path()),
            Err(PoolError::Empty(_))
        ));

        let pool = ImagePool::discover_or_standard(Some(temp.path()));
        assert_eq!(pool, ImagePool::standard());
        Ok(())
    }

    #[test]
    fn layout_reports_missing_static_assets() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let layout = AssetLayout::new(temp.path());
        assert_eq!(layout.missing_static().len(), 4);

        fs::write(layout.back(), b"back")?;
        fs::write(layout.logo(), b"logo")?;
        let missing = layout.missing_static();
        assert_eq!(missing, vec![layout.background(), layout.shuffle_icon()]);
        Ok(())
    }
}
