use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::domain::color::Rgb;
use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;

/// Read access to a decoded bitmap.
///
/// The inspector only ever reads through this trait, so it has no idea whether
/// the pixels come from a decoded file or a test fixture.
pub trait PixelSource {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Caller guarantees `x < width` and `y < height`. Implementations return
    /// `DomainError::CanvasRead` when the backing store refuses the read.
    fn read_pixel(&self, x: u32, y: u32) -> Result<Rgb, DomainError>;

    fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }
}

pub type SharedPixelSource = Arc<dyn PixelSource + Send + Sync>;

// デコード処理はインフラ層で実装する
pub trait ImageDecoder: Send + Sync {
    fn decode(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<SharedPixelSource, InfrastructureError>> + Send;
}

/// Row-major in-memory raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Result<Self, DomainError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(DomainError::InvalidInput(format!(
                "{}x{} grid needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Rgb) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { width, height, pixels }
    }
}

impl PixelSource for PixelGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_pixel(&self, x: u32, y: u32) -> Result<Rgb, DomainError> {
        if x >= self.width || y >= self.height {
            return Err(DomainError::SampleOutOfBounds {
                x: i64::from(x),
                y: i64::from(y),
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.pixels[y as usize * self.width as usize + x as usize])
    }
}
