// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::{
	middleware::from_fn_with_state,
	routing::{delete, get},
	Router,
};
use gatehouse_audit::{AuditHook, SensitiveActions, SqliteAuditSink, TracingAuditSink};
use gatehouse_server_config::{AuditConfig, AuditSinkKind};
use sqlx::SqlitePool;

use crate::auth::auth_layer;
use crate::authorize::Authorizer;
use crate::db::{ProductRepository, UserRepository};
use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub authorizer: Arc<Authorizer>,
	pub products: ProductRepository,
	pub users: UserRepository,
}

pub fn create_app_state(pool: SqlitePool, authorizer: Authorizer) -> AppState {
	AppState {
		products: ProductRepository::new(pool.clone()),
		users: UserRepository::new(pool.clone()),
		authorizer: Arc::new(authorizer),
		pool,
	}
}

/// Builds the audit hook described by `config`.
pub fn create_audit_hook(config: &AuditConfig, pool: SqlitePool) -> AuditHook {
	if !config.enabled {
		tracing::info!("audit persistence disabled");
		return AuditHook::disabled();
	}

	let sensitive: SensitiveActions = config.sensitive_actions.iter().cloned().collect();
	match config.sink {
		AuditSinkKind::Sqlite => AuditHook::new(Arc::new(SqliteAuditSink::new(pool)), sensitive),
		AuditSinkKind::Tracing => AuditHook::new(Arc::new(TracingAuditSink::new()), sensitive),
	}
}

/// Create the API router with all routes.
pub fn create_router(state: AppState) -> Router {
	let authz = Arc::clone(&state.authorizer);

	let api = Router::new()
		.route(
			"/products",
			get(routes::products::list_catalog).route_layer(authz.authorize("list", "catalog")),
		)
		.route(
			"/products/{product_id}",
			delete(routes::products::delete_product).route_layer(authz.authorize("delete", "product")),
		)
		.route(
			"/products/{product_id}/download",
			get(routes::products::download_product)
				.route_layer(authz.authorize("download", "product")),
		)
		.route(
			"/users/me",
			get(routes::users::read_me).route_layer(authz.authorize("read", "user")),
		)
		.route(
			"/users/{user_id}",
			get(routes::users::read_user).route_layer(authz.authorize("read", "user")),
		)
		.layer(from_fn_with_state(state.clone(), auth_layer));

	Router::new()
		.route("/health", get(routes::health::health))
		.nest("/api/v1", api)
		.with_state(state)
}
