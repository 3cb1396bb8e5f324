use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, Blend};
use imageproc::rect::Rect;

use super::error::InfrastructureError;
use crate::domain::histogram::{HistogramRenderer, LuminosityHistogram, BUCKET_COUNT};

const BAR_COLOR: Rgba<u8> = Rgba([255, 255, 255, 204]);
const GRID_COLOR: Rgba<u8> = Rgba([255, 255, 255, 51]);
const MARKER_COLOR: Rgba<u8> = Rgba([142, 0, 0, 230]);

/// Draws the histogram overlay with imageproc on a transparent canvas.
pub struct DefaultHistogramRenderer;

impl DefaultHistogramRenderer {
    pub fn new() -> Self {
        Self
    }

    // バケット i が占める x 範囲 [left, right)
    fn bar_span(bucket: usize, canvas_width: u32) -> (u32, u32) {
        let width = u64::from(canvas_width);
        let left = (bucket as u64 * width / BUCKET_COUNT as u64) as u32;
        let right = ((bucket as u64 + 1) * width / BUCKET_COUNT as u64) as u32;
        (left, right.max(left + 1))
    }

    fn draw_bars(
        canvas: &mut Blend<RgbaImage>,
        histogram: &LuminosityHistogram,
        max: u64,
        canvas_width: u32,
        canvas_height: u32,
    ) {
        for (bucket, &count) in histogram.buckets().iter().enumerate() {
            let bar_height = (count as f64 / max as f64 * f64::from(canvas_height)).round() as u32;
            if bar_height == 0 {
                continue;
            }
            let (left, right) = Self::bar_span(bucket, canvas_width);
            let top = (canvas_height - bar_height) as i32;
            let rect = Rect::at(left as i32, top).of_size(right - left, bar_height);
            draw_filled_rect_mut(canvas, rect, BAR_COLOR);
        }
    }

    // 1/4, 2/4, 3/4 の位置に補助線
    fn draw_grid(canvas: &mut Blend<RgbaImage>, canvas_width: u32, canvas_height: u32) {
        let (w, h) = (canvas_width as f32, canvas_height as f32);
        for quarter in 1..4 {
            let x = (canvas_width * quarter / 4) as f32;
            draw_line_segment_mut(canvas, (x, 0.0), (x, h - 1.0), GRID_COLOR);
        }
        for quarter in 1..4 {
            let y = (canvas_height * quarter / 4) as f32;
            draw_line_segment_mut(canvas, (0.0, y), (w - 1.0, y), GRID_COLOR);
        }
    }

    fn draw_marker(
        canvas: &mut Blend<RgbaImage>,
        bucket: u8,
        canvas_width: u32,
        canvas_height: u32,
    ) {
        let (left, right) = Self::bar_span(usize::from(bucket), canvas_width);
        let rect = Rect::at(left as i32, 0).of_size(right - left, canvas_height);
        draw_filled_rect_mut(canvas, rect, MARKER_COLOR);
    }
}

impl Default for DefaultHistogramRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistogramRenderer for DefaultHistogramRenderer {
    fn render(
        &self,
        histogram: &LuminosityHistogram,
        highlight: Option<u8>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> RgbaImage {
        let mut canvas = Blend(RgbaImage::new(canvas_width, canvas_height));
        let max = histogram.max();
        if max == 0 || canvas_width == 0 || canvas_height == 0 {
            return canvas.0;
        }

        Self::draw_bars(&mut canvas, histogram, max, canvas_width, canvas_height);
        Self::draw_grid(&mut canvas, canvas_width, canvas_height);
        if let Some(bucket) = highlight {
            Self::draw_marker(&mut canvas, bucket, canvas_width, canvas_height);
        }
        canvas.0
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, InfrastructureError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| {
            InfrastructureError::ImageProcessingError(format!("PNG encoding failed: {}", e))
        })?;
    Ok(buffer.into_inner())
}

/// `data:image/png;base64,...` for embedding the render in a JSON response.
pub fn to_png_data_url(image: &RgbaImage) -> Result<String, InfrastructureError> {
    Ok(format!("data:image/png;base64,{}", base64::encode(encode_png(image)?)))
}
