use serde::Serialize;

use crate::domain::error::DomainError;

// ITU-R BT.709 の輝度係数
const RED_WEIGHT: f64 = 0.2126;
const GREEN_WEIGHT: f64 = 0.7152;
const BLUE_WEIGHT: f64 = 0.0722;

/// Perceptual brightness of an RGB triple, 0-255.
///
/// Rounds with `floor(x + 0.5)`. The histogram and the eyedropper readout both
/// go through this function so the highlight marker always lands on the bucket
/// the readout shows.
pub fn luminosity(r: u8, g: u8, b: u8) -> u8 {
    let weighted =
        RED_WEIGHT * f64::from(r) + GREEN_WEIGHT * f64::from(g) + BLUE_WEIGHT * f64::from(b);
    (weighted + 0.5).floor().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn luminosity(self) -> u8 {
        luminosity(self.r, self.g, self.b)
    }

    /// `#RRGGBB`, uppercase.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Accepts `RRGGBB` with or without a leading `#`, in either case.
    pub fn from_hex(hex_str: &str) -> Result<Self, DomainError> {
        let hex = hex_str.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(DomainError::InvalidInput(format!("not a #RRGGBB color: {hex_str}")));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| DomainError::InvalidInput(format!("not a #RRGGBB color: {hex_str}")))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// One eyedropper reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSample {
    pub rgb: Rgb,
    pub luminosity: u8,
}

impl PixelSample {
    pub fn from_rgb(rgb: Rgb) -> Self {
        Self {
            rgb,
            luminosity: rgb.luminosity(),
        }
    }
}

/// What the viewer's RGB panel displays for the pixel under the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readout {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub luminosity: u8,
    pub hex: String,
}

impl From<PixelSample> for Readout {
    fn from(sample: PixelSample) -> Self {
        Self {
            r: sample.rgb.r,
            g: sample.rgb.g,
            b: sample.rgb.b,
            luminosity: sample.luminosity,
            hex: sample.rgb.to_hex(),
        }
    }
}
