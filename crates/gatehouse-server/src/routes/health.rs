// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub database: &'static str,
	pub policies: usize,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
	let database_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
	let policies = state.authorizer.engine().config().policies().len();

	let (status, label, database) = if database_ok {
		(StatusCode::OK, "ok", "ok")
	} else {
		(StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
	};

	(
		status,
		Json(HealthResponse {
			status: label,
			database,
			policies,
		}),
	)
}
