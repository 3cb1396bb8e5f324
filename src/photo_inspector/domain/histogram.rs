use image::RgbaImage;

use crate::domain::color::luminosity;
use crate::domain::error::DomainError;
use crate::domain::pixel_source::PixelSource;

pub const BUCKET_COUNT: usize = 256;

/// Every 4th pixel is read. The histogram is an approximation of the full
/// distribution traded for speed on large photos.
pub const DEFAULT_SAMPLE_STRIDE: u32 = 4;

/// Sample counts per luminosity value. The bucket total equals the number of
/// pixels sampled, not the pixel count of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminosityHistogram {
    buckets: [u64; BUCKET_COUNT],
}

impl Default for LuminosityHistogram {
    fn default() -> Self {
        Self {
            buckets: [0; BUCKET_COUNT],
        }
    }
}

impl LuminosityHistogram {
    pub fn from_buckets(buckets: [u64; BUCKET_COUNT]) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &[u64; BUCKET_COUNT] {
        &self.buckets
    }

    pub fn get(&self, bucket: u8) -> u64 {
        self.buckets[usize::from(bucket)]
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().sum()
    }

    pub fn max(&self) -> u64 {
        self.buckets.iter().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.max() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HistogramEngine {
    stride: u32,
}

impl Default for HistogramEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_STRIDE)
    }
}

impl HistogramEngine {
    /// A stride of 0 is treated as 1.
    pub fn new(stride: u32) -> Self {
        Self { stride: stride.max(1) }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Walks pixel indices 0, stride, 2*stride, ... in row-major order.
    ///
    /// Fails with the source's error if any read is refused; nothing partial is
    /// returned in that case.
    pub fn compute<P>(&self, image: &P) -> Result<LuminosityHistogram, DomainError>
    where
        P: PixelSource + ?Sized,
    {
        let mut histogram = LuminosityHistogram::default();
        let width = u64::from(image.width());
        let pixel_count = image.pixel_count();
        if pixel_count == 0 {
            return Ok(histogram);
        }

        for index in (0..pixel_count).step_by(self.stride as usize) {
            let (x, y) = ((index % width) as u32, (index / width) as u32);
            let rgb = image.read_pixel(x, y)?;
            histogram.buckets[usize::from(luminosity(rgb.r, rgb.g, rgb.b))] += 1;
        }
        Ok(histogram)
    }
}

// 描画処理はインフラ層で実装する
pub trait HistogramRenderer {
    /// Draws `histogram` into a fresh `canvas_width` x `canvas_height` buffer,
    /// with a marker over `highlight` when given. Same inputs, same pixels.
    fn render(
        &self,
        histogram: &LuminosityHistogram,
        highlight: Option<u8>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> RgbaImage;
}
