//! Error type shared by all preservation crates.

use axum::{
	Json,
	http::StatusCode,
	response::{Html, IntoResponse, Response},
};

use crate::action::{DenyReason, Surface};
use crate::template::blocked_page;

pub type ClResult<T> = std::result::Result<T, Error>;

/// Message shown for every write refused by preservation mode
pub const WRITE_FORBIDDEN_MESSAGE: &str =
	"Saving is disabled - Site is in historical preservation mode.";

#[derive(Debug)]
pub enum Error {
	NotFound,
	/// Authenticated, but the capability model refuses the request
	PermissionDenied,
	/// No authenticated principal or session where one is required
	Unauthorized,
	/// Refused by preservation mode
	WriteForbidden {
		reason: DenyReason,
		surface: Surface,
	},
	ValidationError(String),
	ConfigError(String),
	Internal(String),
	Parse,

	// externals
	Io(std::io::Error),
	Json(serde_json::Error),
}

impl Error {
	pub fn write_forbidden(reason: DenyReason, surface: Surface) -> Self {
		Error::WriteForbidden { reason, surface }
	}

	/// Stable machine-readable code for API clients
	pub fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "not_found",
			Error::PermissionDenied => "permission_denied",
			Error::Unauthorized => "unauthorized",
			Error::WriteForbidden { .. } => "write_forbidden",
			Error::ValidationError(_) | Error::Parse => "validation_error",
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) | Error::Json(_) => {
				"internal"
			}
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied | Error::WriteForbidden { .. } => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::ValidationError(_) | Error::Parse => StatusCode::BAD_REQUEST,
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) | Error::Json(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Json(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::WriteForbidden { reason, .. } => {
				write!(f, "{} ({})", WRITE_FORBIDDEN_MESSAGE, reason)
			}
			Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "Internal error: {}", msg),
			Error::Io(err) => write!(f, "IO error: {}", err),
			Error::Json(err) => write!(f, "JSON error: {}", err),
			_ => write!(f, "{:?}", self),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		match self {
			Error::WriteForbidden { surface: Surface::Screen, .. } => {
				(StatusCode::FORBIDDEN, Html(blocked_page())).into_response()
			}
			Error::WriteForbidden { reason, surface: Surface::Api } => {
				let body = serde_json::json!({
					"error": {
						"code": "write_forbidden",
						"message": WRITE_FORBIDDEN_MESSAGE,
						"details": {
							"reason": reason.as_str()
						}
					}
				});
				(StatusCode::FORBIDDEN, Json(body)).into_response()
			}
			err => {
				let message = match &err {
					Error::NotFound => "Not found".to_string(),
					Error::PermissionDenied => "Permission denied".to_string(),
					Error::Unauthorized => "Authentication required".to_string(),
					Error::ValidationError(msg) => msg.clone(),
					Error::Parse => "Malformed request".to_string(),
					_ => {
						tracing::error!("Internal error: {}", err);
						"Internal server error".to_string()
					}
				};
				let body = serde_json::json!({
					"error": {
						"code": err.code(),
						"message": message
					}
				});
				(err.status(), Json(body)).into_response()
			}
		}
	}
}


// vim: ts=4
