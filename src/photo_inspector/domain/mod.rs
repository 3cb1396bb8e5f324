pub mod color;
pub mod error;
pub mod gallery;
pub mod histogram;
pub mod pixel_source;
pub mod pointer;
pub mod position;
pub mod sampler;
pub mod settings;
