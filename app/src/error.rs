use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use err_derive::Error;
use log::*;
use serde_json::json;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(display = "Missing required field: {}", _0)]
    MissingField(&'static str),

    #[error(display = "Invalid value for {}", _0)]
    InvalidField(&'static str),

    #[error(display = "Malformed payload: {}", _0)]
    MalformedPayload(String),

    #[error(display = "Invalid {}", _0)]
    InvalidReference(&'static str),

    #[error(display = "No such {}", _0)]
    NotFound(&'static str),

    #[error(display = "The {} already exists", _0)]
    Conflict(&'static str),

    #[error(display = "Invalid credentials")]
    InvalidCredential,

    #[error(display = "Missing or invalid token")]
    AuthRejected,

    #[error(display = "Store failure: {}", _0)]
    StoreFailure(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::StoreFailure(err)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::StoreFailure(err.into())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::StoreFailure(err.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::InvalidField(_)
            | AppError::MalformedPayload(_)
            | AppError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::AuthRejected => StatusCode::FORBIDDEN,
            AppError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::StoreFailure(err) => {
                error!("Internal error: {:?}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
