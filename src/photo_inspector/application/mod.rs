pub mod error;
pub mod inspector_session;
pub mod viewer_service;
