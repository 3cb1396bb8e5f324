use crate::domain::color::PixelSample;
use crate::domain::error::DomainError;
use crate::domain::pixel_source::PixelSource;

/// Eyedropper: reads one pixel and derives its luminosity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorSampler;

impl ColorSampler {
    pub fn new() -> Self {
        Self
    }

    pub fn sample<P>(&self, image: &P, x: i64, y: i64) -> Result<PixelSample, DomainError>
    where
        P: PixelSource + ?Sized,
    {
        let (width, height) = (image.width(), image.height());
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
            return Err(DomainError::SampleOutOfBounds { x, y, width, height });
        }

        let rgb = image.read_pixel(x as u32, y as u32)?;
        Ok(PixelSample::from_rgb(rgb))
    }
}
