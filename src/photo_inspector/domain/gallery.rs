use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::infrastructure::error::InfrastructureError;

pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

/// Extension check only, case-insensitive.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// A subfolder of the gallery root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photographer {
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "previewImage")]
    pub preview_image: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub name: String,
    pub path: PathBuf,
}

pub trait FileLister: Send + Sync {
    /// Subdirectories of `root`, sorted by name.
    fn list_photographers(
        &self,
        root: &Path,
    ) -> impl Future<Output = Result<Vec<Photographer>, InfrastructureError>> + Send;

    /// Image files directly inside `folder`, sorted by name.
    fn list_images(
        &self,
        folder: &Path,
    ) -> impl Future<Output = Result<Vec<ImageEntry>, InfrastructureError>> + Send;
}
