use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing::error;

/// An error while mapping the ambient options into a tool configuration
#[derive(Debug, thiserror::Error)]
pub enum ToolConfigError {
    #[error("header '{name}' has a value that is not valid UTF-8: {source}")]
    HeaderValue {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for ToolConfigError {
    fn into_response(self) -> Response {
        error!(error = %self, "Failed to build the tool configuration");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid mount path '{0}': a mount path must be empty or start with '/'")]
    InvalidMountPath(String),

    #[error("Failed to start server: {0}")]
    Io(#[from] std::io::Error),
}
