// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};

use crate::api::AppState;
use crate::db::Product;
use crate::error::ServerError;

pub async fn list_catalog(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ServerError> {
	Ok(Json(state.products.list().await?))
}

pub async fn download_product(
	State(state): State<AppState>,
	Path(product_id): Path<i64>,
) -> Result<Json<Product>, ServerError> {
	state
		.products
		.find(product_id)
		.await?
		.map(Json)
		.ok_or_else(|| ServerError::NotFound("Product not found.".to_string()))
}

pub async fn delete_product(
	State(state): State<AppState>,
	Path(product_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
	if state.products.delete(product_id).await? {
		tracing::info!(product_id, "product deleted");
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ServerError::NotFound("Product not found.".to_string()))
	}
}
