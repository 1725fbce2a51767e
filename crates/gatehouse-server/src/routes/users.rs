// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	Extension, Json,
};

use crate::api::AppState;
use crate::auth::AuthContext;
use crate::db::User;
use crate::error::ServerError;

async fn find_user(state: &AppState, user_id: i64) -> Result<Json<User>, ServerError> {
	state
		.users
		.find(user_id)
		.await?
		.map(Json)
		.ok_or_else(|| ServerError::NotFound("User not found.".to_string()))
}

pub async fn read_user(
	State(state): State<AppState>,
	Path(user_id): Path<i64>,
) -> Result<Json<User>, ServerError> {
	find_user(&state, user_id).await
}

pub async fn read_me(
	State(state): State<AppState>,
	Extension(auth): Extension<AuthContext>,
) -> Result<Json<User>, ServerError> {
	let subject = auth
		.subject
		.ok_or_else(|| ServerError::NotFound("User not found.".to_string()))?;
	find_user(&state, subject.id).await
}
