use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("Image processing failed: {0}")]
    ImageProcessingError(String),

    #[error("Image could not be decoded")]
    DecodeError(#[from] image::ImageError), // image::ImageError をラップ

    #[error("Underlying I/O error")]
    IoError(#[from] std::io::Error), // std::io::Error をラップ

    #[error("Settings file error")]
    SettingsError(#[from] serde_json::Error),

    #[error("Settings store unavailable: {0}")]
    StoreUnavailable(String),
}
