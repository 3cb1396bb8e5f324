use std::future::Future;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;

use super::error::InfrastructureError;
use crate::domain::color::Rgb;
use crate::domain::error::DomainError;
use crate::domain::pixel_source::{ImageDecoder, PixelSource, SharedPixelSource};

/// Decoded bitmap at its natural size. Alpha is ignored when sampling.
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn from_bytes(image_bytes: Vec<u8>) -> Result<Self, InfrastructureError> {
        let reader = image::io::Reader::new(Cursor::new(image_bytes))
            .with_guessed_format()
            .map_err(InfrastructureError::IoError)?;
        let pixels = reader.decode().map_err(InfrastructureError::DecodeError)?.to_rgba8();
        Ok(Self::new(pixels))
    }
}

impl PixelSource for RasterImage {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn read_pixel(&self, x: u32, y: u32) -> Result<Rgb, DomainError> {
        if x >= self.pixels.width() || y >= self.pixels.height() {
            return Err(DomainError::SampleOutOfBounds {
                x: i64::from(x),
                y: i64::from(y),
                width: self.pixels.width(),
                height: self.pixels.height(),
            });
        }
        let [r, g, b, _] = self.pixels.get_pixel(x, y).0;
        Ok(Rgb::new(r, g, b))
    }
}

/// Reads image files from disk and decodes them with the `image` crate.
pub struct RasterDecoder;

impl RasterDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<SharedPixelSource, InfrastructureError>> + Send {
        let path = path.to_path_buf();
        async move {
            let image_bytes = tokio::fs::read(&path).await.map_err(InfrastructureError::IoError)?;
            let raster = RasterImage::from_bytes(image_bytes)?;
            debug!(
                path = %path.display(),
                width = raster.width(),
                height = raster.height(),
                "decoded image",
            );
            Ok(Arc::new(raster) as SharedPixelSource)
        }
    }
}
