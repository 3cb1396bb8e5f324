use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::fs;

use super::error::InfrastructureError;
use crate::domain::gallery::{is_image_path, FileLister, ImageEntry, Photographer};

/// Lists gallery folders straight off the local filesystem.
pub struct LocalFileLister;

impl LocalFileLister {
    pub fn new() -> Self {
        Self
    }

    async fn read_sorted(
        folder: &Path,
    ) -> Result<Vec<(String, PathBuf, std::fs::FileType)>, InfrastructureError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(folder).await.map_err(InfrastructureError::IoError)?;
        while let Some(entry) = dir.next_entry().await.map_err(InfrastructureError::IoError)? {
            let file_type = entry.file_type().await.map_err(InfrastructureError::IoError)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push((name, entry.path(), file_type));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    async fn images_in(folder: &Path) -> Result<Vec<ImageEntry>, InfrastructureError> {
        let images = Self::read_sorted(folder)
            .await?
            .into_iter()
            .filter(|(_, path, file_type)| file_type.is_file() && is_image_path(path))
            .map(|(name, path, _)| ImageEntry { name, path })
            .collect();
        Ok(images)
    }
}

impl Default for LocalFileLister {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLister for LocalFileLister {
    fn list_photographers(
        &self,
        root: &Path,
    ) -> impl Future<Output = Result<Vec<Photographer>, InfrastructureError>> + Send {
        let root = root.to_path_buf();
        async move {
            let mut photographers = Vec::new();
            for (name, path, file_type) in Self::read_sorted(&root).await? {
                if !file_type.is_dir() {
                    continue;
                }
                // 読めないフォルダはプレビューなしで表示する
                let preview_image = Self::images_in(&path)
                    .await
                    .ok()
                    .and_then(|images| images.into_iter().next())
                    .map(|image| image.path);
                photographers.push(Photographer { name, path, preview_image });
            }
            Ok(photographers)
        }
    }

    fn list_images(
        &self,
        folder: &Path,
    ) -> impl Future<Output = Result<Vec<ImageEntry>, InfrastructureError>> + Send {
        let folder = folder.to_path_buf();
        async move { Self::images_in(&folder).await }
    }
}
