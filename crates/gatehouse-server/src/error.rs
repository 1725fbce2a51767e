// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::{Deserialize, Serialize};

use crate::db::DbError;

/// JSON error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
			action: None,
			resource_type: None,
			reason: None,
		}
	}
}

/// Errors raised by route handlers once the guard has let a request through.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("{0}")]
	NotFound(String),

	#[error(transparent)]
	Db(#[from] DbError),
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match self {
			ServerError::NotFound(message) => (
				StatusCode::NOT_FOUND,
				Json(ErrorResponse::new("not_found", message)),
			)
				.into_response(),
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					Json(ErrorResponse::new("internal_error", "Internal server error")),
				)
					.into_response()
			}
		}
	}
}
