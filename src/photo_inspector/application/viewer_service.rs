use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::error::ApplicationError;
use super::inspector_session::PixelInspectorSession;
use crate::domain::gallery::{FileLister, ImageEntry, Photographer};
use crate::domain::pixel_source::ImageDecoder;
use crate::domain::settings::SettingsStore;

/// Gallery listing for the browse views. Listing errors show up as empty
/// results, same as an empty folder.
pub struct GalleryService<F: FileLister> {
    lister: Arc<F>,
}

impl<F: FileLister> GalleryService<F> {
    pub fn new(lister: Arc<F>) -> Self {
        Self { lister }
    }

    pub async fn photographers(&self, root: &Path) -> Vec<Photographer> {
        match self.lister.list_photographers(root).await {
            Ok(photographers) => photographers,
            Err(e) => {
                error!("Error reading photographers in {:?}: {}", root, e);
                Vec::new()
            }
        }
    }

    pub async fn images(&self, folder: &Path) -> Vec<ImageEntry> {
        match self.lister.list_images(folder).await {
            Ok(images) => images,
            Err(e) => {
                error!("Error reading images in {:?}: {}", folder, e);
                Vec::new()
            }
        }
    }
}

/// The image viewer: which image of which folder is shown, and the
/// inspector session that reacts to it.
pub struct ViewerService<F, D, S>
where
    F: FileLister,
    D: ImageDecoder,
    S: SettingsStore,
{
    lister: Arc<F>,
    decoder: D,
    session: PixelInspectorSession<S>,
    folder: Option<PathBuf>,
    images: Vec<ImageEntry>,
    index: usize,
}

impl<F, D, S> ViewerService<F, D, S>
where
    F: FileLister,
    D: ImageDecoder,
    S: SettingsStore,
{
    pub fn new(lister: Arc<F>, decoder: D, session: PixelInspectorSession<S>) -> Self {
        Self {
            lister,
            decoder,
            session,
            folder: None,
            images: Vec::new(),
            index: 0,
        }
    }

    pub fn session(&self) -> &PixelInspectorSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PixelInspectorSession<S> {
        &mut self.session
    }

    pub fn is_open(&self) -> bool {
        self.folder.is_some()
    }

    pub fn current_image(&self) -> Option<&ImageEntry> {
        self.folder.as_ref().and_then(|_| self.images.get(self.index))
    }

    /// Opens the viewer on `folder` at `index` (clamped to the last image).
    pub async fn open(
        &mut self,
        folder: &Path,
        index: usize,
    ) -> Result<ImageEntry, ApplicationError> {
        let images = self.lister.list_images(folder).await?;
        if images.is_empty() {
            return Err(ApplicationError::NoImages(folder.to_path_buf()));
        }

        if self.is_open() {
            self.session.on_viewer_closed();
        }
        self.index = index.min(images.len() - 1);
        self.images = images;
        self.folder = Some(folder.to_path_buf());
        info!("Viewer opened on {:?} at image {}", folder, self.index);

        self.session.on_viewer_opened();
        Ok(self.display_current().await)
    }

    /// Wraps from the last image to the first.
    pub async fn next(&mut self) -> Result<ImageEntry, ApplicationError> {
        if !self.is_open() {
            return Err(ApplicationError::ViewerNotOpen);
        }
        self.index = if self.index + 1 < self.images.len() { self.index + 1 } else { 0 };
        Ok(self.display_current().await)
    }

    /// Wraps from the first image to the last.
    pub async fn previous(&mut self) -> Result<ImageEntry, ApplicationError> {
        if !self.is_open() {
            return Err(ApplicationError::ViewerNotOpen);
        }
        self.index = if self.index > 0 { self.index - 1 } else { self.images.len() - 1 };
        Ok(self.display_current().await)
    }

    pub fn close(&mut self) {
        if self.folder.take().is_some() {
            self.session.on_viewer_closed();
            self.images.clear();
            self.index = 0;
            info!("Viewer closed");
        }
    }

    // デコード完了を待ってからセッションに渡す
    // 失敗時は表示だけ前のまま
    async fn display_current(&mut self) -> ImageEntry {
        let entry = self.images[self.index].clone();
        match self.decoder.decode(&entry.path).await {
            Ok(raster) => self.session.on_image_displayed(raster),
            Err(e) => {
                warn!("Failed to decode {:?}: {}", entry.path, e);
                self.session.on_image_failed();
            }
        }
        entry
    }
}
