use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repo::StoreError;

/// Error surfaced to API clients. The variant decides the status code and
/// which field of [`ErrorBody`] carries the text.
#[derive(Debug, Error)]
pub enum AppError {
	#[error("{0}")]
	Unauthorized(String),

	#[error("{0}")]
	BadRequest(String),

	#[error("validation failed: {}", .0.join(", "))]
	Validation(Vec<String>),

	#[error("{0}")]
	NotFound(String),

	/// A scrape or model call failed; the upstream message is passed through.
	#[error("{0}")]
	Upstream(String),

	#[error("{0}")]
	Internal(String),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub errors: Option<Vec<String>>,
}

impl ErrorBody {
	pub fn message(m: &str) -> Self {
		Self { success: false, message: Some(m.to_string()), error: None, errors: None }
	}
}

impl From<&AppError> for ErrorBody {
	fn from(err: &AppError) -> Self {
		match err {
			AppError::Upstream(e) => {
				Self { success: false, message: None, error: Some(e.clone()), errors: None }
			},
			AppError::Validation(errors) => {
				Self { success: false, message: None, error: None, errors: Some(errors.clone()) }
			},
			AppError::Unauthorized(m) |
			AppError::BadRequest(m) |
			AppError::NotFound(m) |
			AppError::Internal(m) => Self::message(m),
		}
	}
}

impl ResponseError for AppError {
	fn status_code(&self) -> StatusCode {
		match self {
			AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
			AppError::NotFound(_) => StatusCode::NOT_FOUND,
			AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_response(&self) -> HttpResponse {
		HttpResponse::build(self.status_code()).json(ErrorBody::from(self))
	}
}

impl From<StoreError> for AppError {
	fn from(e: StoreError) -> Self {
		log::error!("Database error: {}", e);
		AppError::Internal("Database error".to_string())
	}
}

impl From<validator::ValidationErrors> for AppError {
	fn from(e: validator::ValidationErrors) -> Self {
		let mut errors: Vec<String> = e
			.field_errors()
			.iter()
			.flat_map(|(field, errs)| {
				errs.iter().map(move |err| match &err.message {
					Some(m) => m.to_string(),
					None => format!("{} is invalid", field),
				})
			})
			.collect();
		errors.sort();
		AppError::Validation(errors)
	}
}

/// Malformed bodies get the same JSON error shape as every other failure.
pub fn json_config() -> web::JsonConfig {
	web::JsonConfig::default().error_handler(|err, _req| {
		log::warn!("Rejected request body: {}", err);
		AppError::BadRequest("Invalid JSON format in request body".to_string()).into()
	})
}
