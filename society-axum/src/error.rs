use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use society_core::errors::SocietyError;
use tracing::error;

#[derive(Debug)]
pub struct SocietyAxumError(pub anyhow::Error);

impl From<anyhow::Error> for SocietyAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<SocietyError> for SocietyAxumError {
    fn from(e: SocietyError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for SocietyAxumError {
    fn into_response(self) -> Response {
        // A SocietyError anywhere in the chain keeps its kind and fields.
        let safe = match SocietyError::from_anyhow(&self.0) {
            Some(e) => e.sanitize_for_client(),
            None => {
                error!(error = ?self.0, "unstructured error reached the HTTP layer");
                SocietyError::general_error("Internal server error")
            }
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
