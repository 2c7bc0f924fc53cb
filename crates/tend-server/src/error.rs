use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tend_core::TendError;

/// Unified error type for HTTP responses: any `TendError` (or anyhow chain
/// around one) becomes a JSON body with a status derived from the kind.
#[derive(Debug)]
pub struct AppError {
    status: Option<StatusCode>,
    error: anyhow::Error,
}

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: Some(StatusCode::BAD_REQUEST),
            error: anyhow::anyhow!("{}", msg.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or_else(|| {
            match self.error.downcast_ref::<TendError>() {
                Some(
                    TendError::NotARepository
                    | TendError::UnknownConfigKey(_)
                    | TendError::InvalidConfigValue { .. },
                ) => StatusCode::BAD_REQUEST,
                Some(TendError::AlreadyRunning { .. }) => StatusCode::CONFLICT,
                Some(TendError::GhMissing(_) | TendError::GhNotAuthenticated) => {
                    StatusCode::PRECONDITION_FAILED
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        });

        let body = serde_json::json!({ "error": format!("{:#}", self.error) });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: None,
            error: err.into(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, AppError>;
