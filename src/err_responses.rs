use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub enum ErrorResponse {
    InternalServerError,
    StatusCode(StatusCode),
}

pub trait MapErrorResponse<T> {
    fn map_err_response(self, mapper: ErrorResponse) -> Result<T, Response>;
}

impl<T, E: ToString> MapErrorResponse<T> for Result<T, E> {
    fn map_err_response(self, mapper: ErrorResponse) -> Result<T, Response> {
        match self {
            Ok(val) => Ok(val),
            Err(err) => Err(mapper.transform(err)),
        }
    }
}

impl ErrorResponse {
    pub fn transform<E: ToString>(&self, err: E) -> Response {
        let status = match self {
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StatusCode(code) => *code,
        };
        let error = err.to_string();

        if status.is_server_error() {
            tracing::error!(%status, %error, "Request failed");
        } else {
            tracing::warn!(%status, %error, "Request rejected");
        }

        (status, Json(ErrorBody { error })).into_response()
    }
}
