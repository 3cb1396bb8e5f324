use crate::domain::error::DomainError;

/// Pointer location in display (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where the image is drawn on screen and how large it appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Rejects negative or non-finite geometry reported by the UI. A zero
    /// extent is accepted; it only means nothing can be sampled.
    pub fn checked(left: f64, top: f64, width: f64, height: f64) -> Result<Self, DomainError> {
        let finite = [left, top, width, height].iter().all(|v| v.is_finite());
        if !finite || width < 0.0 || height < 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "bad display rect: left={left} top={top} width={width} height={height}"
            )));
        }
        Ok(Self::new(left, top, width, height))
    }

    /// Maps a pointer position onto raster pixel coordinates:
    /// `floor((pointer - origin) * raster_extent / displayed_extent)`.
    ///
    /// The result is not bounds-checked; scaling can round past the last
    /// column or row. `None` when the rect has no visible area.
    pub fn to_raster(
        &self,
        pointer: PointerPosition,
        raster_width: u32,
        raster_height: u32,
    ) -> Option<(i64, i64)> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let x = ((pointer.x - self.left) * f64::from(raster_width) / self.width).floor();
        let y = ((pointer.y - self.top) * f64::from(raster_height) / self.height).floor();
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some((x as i64, y as i64))
    }
}
