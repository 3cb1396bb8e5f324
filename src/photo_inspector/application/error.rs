use std::path::PathBuf;

use thiserror::Error;
use tracing::error;

use crate::domain::error::DomainError; // ドメインエラーをラップするため
use crate::infrastructure::error::InfrastructureError;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("The image viewer is not open")]
    ViewerNotOpen,

    #[error("No images found in {0:?}")]
    NoImages(PathBuf),

    #[error("Domain error occurred: {0}")]
    DomainError(#[from] DomainError),

    #[error("Infrastructure error occurred: {0}")]
    InfrastructureError(#[from] InfrastructureError),
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApplicationError::ViewerNotOpen => {
                (StatusCode::CONFLICT, "The image viewer is not open".to_string())
            }
            ApplicationError::NoImages(folder) => {
                (StatusCode::NOT_FOUND, format!("No images found in {:?}", folder))
            }
            ApplicationError::DomainError(domain_err) => {
                (StatusCode::BAD_REQUEST, domain_err.to_string())
            }
            ApplicationError::InfrastructureError(infra_err) => {
                error!("InfrastructureError: {:?}", infra_err);
                match infra_err {
                    InfrastructureError::IoError(ref io_err)
                        if io_err.kind() == std::io::ErrorKind::NotFound =>
                    {
                        (StatusCode::NOT_FOUND, infra_err.to_string())
                    }
                    InfrastructureError::DecodeError(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, infra_err.to_string())
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, infra_err.to_string()),
                }
            }
        };
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
