pub mod axum_handler;
pub mod config;
pub mod error;
pub mod file_lister;
pub mod histogram_renderer;
pub mod pointer_listener;
pub mod raster;
pub mod settings_store;
