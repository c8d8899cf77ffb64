use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const MISSING_AUTHORIZATION_MESSAGE: &str = "Authorization header is missing.";
pub const UNAUTHORIZED_MESSAGE: &str = "You do not have permission to perform this action.";
pub const INSUFFICIENT_STOCK_MESSAGE: &str = "Not enough stock available.";

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    MissingAuthHeader,
    Unauthorized { message: Option<String> },
    BadRequest { code: &'static str, message: Option<String> },
    NotFound { code: &'static str, message: Option<String> },
    InsufficientStock { requested: i32, on_hand: i32 },
    Internal { message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self { Self::Internal { message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self { Self::BadRequest { code, message: Some(message.into()) } }
    pub fn unauthorized() -> Self { Self::Unauthorized { message: None } }
    pub fn not_found(code: &'static str) -> Self { Self::NotFound { code, message: None } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAuthHeader
            | ApiError::BadRequest { .. }
            | ApiError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingAuthHeader => "missing_authorization",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::BadRequest { code, .. } | ApiError::NotFound { code, .. } => code,
            ApiError::InsufficientStock { .. } => "insufficient_stock",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::MissingAuthHeader => MISSING_AUTHORIZATION_MESSAGE.to_string(),
            ApiError::Unauthorized { message } => message.unwrap_or_else(|| UNAUTHORIZED_MESSAGE.to_string()),
            ApiError::BadRequest { message, .. } => message.unwrap_or_else(|| "Bad request.".to_string()),
            ApiError::NotFound { message, .. } => message.unwrap_or_else(|| "Medicine not found.".to_string()),
            ApiError::InsufficientStock { .. } => INSUFFICIENT_STOCK_MESSAGE.to_string(),
            ApiError::Internal { message } => match message {
                Some(detail) => format!("An error occurred while processing the request: {detail}"),
                None => "An error occurred while processing the request.".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let body = ErrorBody { code: error_code.into(), message: self.message() };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

// Body extraction failures surface as 400 rather than axum's 415/422 defaults.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest { code: "invalid_body", message: Some(rejection.body_text()) }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest { code: "invalid_path", message: Some(rejection.body_text()) }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
