use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sample at ({x}, {y}) is outside the {width}x{height} raster")]
    SampleOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    // 画素バッファが読めない (例: 読み取り制限のあるキャンバス)
    #[error("Pixel buffer could not be read: {0}")]
    CanvasRead(String),
}
