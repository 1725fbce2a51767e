// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end tests of the authorization guard over an in-memory database.

use std::sync::Arc;

use axum::{
	body::{to_bytes, Body},
	http::{Method, Request, StatusCode},
	Router,
};
use gatehouse_audit::{AuditHook, AuditRecord, SensitiveActions, SqliteAuditSink};
use gatehouse_policy::{PolicyConfig, PolicyEngine};
use gatehouse_server::{
	create_app_state, create_router, db, Authorizer, ErrorResponse, OrderHistoryEnvironment,
	CONTEXT_UNAVAILABLE, USER_ID_HEADER,
};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;

const ADMIN: i64 = 1;
const OWNER: i64 = 2;
const BUYER: i64 = 3;
const STRANGER: i64 = 99;

const PRIVATE_PRODUCT: i64 = 1;
const PUBLIC_PRODUCT: i64 = 2;
const PURCHASED_PRODUCT: i64 = 3;

fn shipped_policies() -> PolicyConfig {
	PolicyConfig::load(concat!(
		env!("CARGO_MANIFEST_DIR"),
		"/../../config/abac_policies.yaml"
	))
	.unwrap()
}

async fn test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	db::run_migrations(&pool).await.unwrap();
	seed(&pool).await;
	pool
}

async fn seed(pool: &SqlitePool) {
	let statements = [
		"INSERT INTO roles (id, title) VALUES (1, 'admin'), (2, 'seller'), (3, 'user')",
		r#"INSERT INTO users (id, username, email) VALUES
			(1, 'root', 'root@example.com'),
			(2, 'maker', 'maker@example.com'),
			(3, 'buyer', 'buyer@example.com'),
			(99, 'stranger', 'stranger@example.com')"#,
		"INSERT INTO user_roles (user_id, role_id) VALUES (1, 1), (2, 2), (3, 3), (99, 3)",
		r#"INSERT INTO products (id, name, price, owner_id, is_public) VALUES
			(1, 'Draft manuscript', 10.0, 2, 0),
			(2, 'Free sampler', 0.0, 2, 1),
			(3, 'Field guide', 25.0, 2, 0)"#,
		"INSERT INTO orders (id, user_id) VALUES (1, 3)",
		"INSERT INTO order_items (order_id, product_id, quantity) VALUES (1, 3, 1)",
	];
	for statement in statements {
		sqlx::query(statement).execute(pool).await.unwrap();
	}
}

fn app_at_hour(pool: &SqlitePool, hour: u32) -> Router {
	let audit = AuditHook::new(
		Arc::new(SqliteAuditSink::new(pool.clone())),
		SensitiveActions::new(["delete_product"]),
	);
	let authorizer = Authorizer::new(PolicyEngine::new(shipped_policies()), pool.clone())
		.with_environment(Arc::new(OrderHistoryEnvironment::at_hour(hour)))
		.with_audit(audit);
	create_router(create_app_state(pool.clone(), authorizer))
}

async fn app(pool: &SqlitePool) -> Router {
	app_at_hour(pool, 10)
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<i64>) -> (StatusCode, Value) {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(id) = user {
		builder = builder.header(USER_ID_HEADER, id.to_string());
	}
	let response = app
		.clone()
		.oneshot(builder.body(Body::empty()).unwrap())
		.await
		.unwrap();
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let body = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap()
	};
	(status, body)
}

fn error_of(body: Value) -> ErrorResponse {
	serde_json::from_value(body).unwrap()
}

async fn audit_records(pool: &SqlitePool) -> Vec<AuditRecord> {
	SqliteAuditSink::new(pool.clone()).recent(100).await.unwrap()
}

#[tokio::test]
async fn admin_may_delete_any_product() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, _) = send(
		&app,
		Method::DELETE,
		&format!("/api/v1/products/{PRIVATE_PRODUCT}"),
		Some(ADMIN),
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let records = audit_records(&pool).await;
	assert_eq!(records.len(), 1);
	assert!(records[0].allowed);
	assert_eq!(records[0].reason, "user_is_admin");
	assert_eq!(records[0].policy_name, "delete_product");
	assert_eq!(records[0].subject_id.as_deref(), Some("1"));
	assert_eq!(records[0].resource_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn owner_may_delete_during_working_hours() {
	let pool = test_pool().await;
	let app = app_at_hour(&pool, 10);

	let (status, _) = send(
		&app,
		Method::DELETE,
		&format!("/api/v1/products/{PRIVATE_PRODUCT}"),
		Some(OWNER),
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let records = audit_records(&pool).await;
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].reason, "owner_and_ok");
}

#[tokio::test]
async fn owner_may_not_delete_outside_working_hours() {
	let pool = test_pool().await;
	let app = app_at_hour(&pool, 3);

	let (status, body) = send(
		&app,
		Method::DELETE,
		&format!("/api/v1/products/{PRIVATE_PRODUCT}"),
		Some(OWNER),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(error_of(body).reason.as_deref(), Some("denied_by_policy"));
}

#[tokio::test]
async fn stranger_is_denied_and_the_denial_is_audited() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(
		&app,
		Method::DELETE,
		&format!("/api/v1/products/{PRIVATE_PRODUCT}"),
		Some(STRANGER),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let error = error_of(body);
	assert_eq!(error.error, "forbidden");
	assert_eq!(error.action.as_deref(), Some("delete"));
	assert_eq!(error.resource_type.as_deref(), Some("product"));
	assert_eq!(error.reason.as_deref(), Some("denied_by_policy"));
	assert_eq!(
		error.message,
		"Access denied for 'delete' on 'product': denied_by_policy"
	);

	let records = audit_records(&pool).await;
	assert_eq!(records.len(), 1);
	assert!(!records[0].allowed);
	assert_eq!(records[0].reason, "denied_by_policy");
	assert_eq!(records[0].subject_id.as_deref(), Some("99"));

	// The product is untouched.
	let (status, _) = send(
		&app,
		Method::GET,
		&format!("/api/v1/products/{PRIVATE_PRODUCT}/download"),
		Some(ADMIN),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn public_download_is_allowed_and_not_audited() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(
		&app,
		Method::GET,
		&format!("/api/v1/products/{PUBLIC_PRODUCT}/download"),
		Some(STRANGER),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["id"], PUBLIC_PRODUCT);

	assert!(audit_records(&pool).await.is_empty());
}

#[tokio::test]
async fn purchase_history_grants_download() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let uri = format!("/api/v1/products/{PURCHASED_PRODUCT}/download");
	let (status, _) = send(&app, Method::GET, &uri, Some(BUYER)).await;
	assert_eq!(status, StatusCode::OK);

	let (status, _) = send(&app, Method::GET, &uri, Some(STRANGER)).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn purchases_are_read_fresh_on_every_request() {
	let pool = test_pool().await;
	let app = app(&pool).await;
	let uri = format!("/api/v1/products/{PRIVATE_PRODUCT}/download");

	let (status, _) = send(&app, Method::GET, &uri, Some(BUYER)).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	sqlx::query("INSERT INTO orders (id, user_id) VALUES (2, 3)")
		.execute(&pool)
		.await
		.unwrap();
	sqlx::query("INSERT INTO order_items (order_id, product_id) VALUES (2, 1)")
		.execute(&pool)
		.await
		.unwrap();

	let (status, _) = send(&app, Method::GET, &uri, Some(BUYER)).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_product_is_404_not_403() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(&app, Method::GET, "/api/v1/products/999/download", Some(ADMIN)).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(error_of(body).message, "Product not found.");

	let (status, _) = send(&app, Method::GET, "/api/v1/products/abc/download", Some(ADMIN)).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	assert!(audit_records(&pool).await.is_empty());
}

#[tokio::test]
async fn requests_without_a_subject_are_401() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let uri = format!("/api/v1/products/{PUBLIC_PRODUCT}/download");
	let (status, body) = send(&app, Method::GET, &uri, None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(error_of(body).error, "unauthorized");

	let (status, _) = send(&app, Method::GET, &uri, Some(4242)).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn storage_failure_denies_with_context_unavailable() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	sqlx::query("DROP TABLE order_items")
		.execute(&pool)
		.await
		.unwrap();

	let (status, body) = send(
		&app,
		Method::GET,
		&format!("/api/v1/products/{PUBLIC_PRODUCT}/download"),
		Some(ADMIN),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(error_of(body).reason.as_deref(), Some(CONTEXT_UNAVAILABLE));
}

#[tokio::test]
async fn audit_failure_does_not_change_the_outcome() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	sqlx::query("DROP TABLE audit_logs")
		.execute(&pool)
		.await
		.unwrap();

	let (status, _) = send(
		&app,
		Method::DELETE,
		&format!("/api/v1/products/{PRIVATE_PRODUCT}"),
		Some(ADMIN),
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = send(
		&app,
		Method::DELETE,
		&format!("/api/v1/products/{PUBLIC_PRODUCT}"),
		Some(STRANGER),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn audit_records_caller_metadata() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let request = Request::builder()
		.method(Method::DELETE)
		.uri(format!("/api/v1/products/{PRIVATE_PRODUCT}"))
		.header(USER_ID_HEADER, STRANGER.to_string())
		.header("x-forwarded-for", "198.51.100.7, 10.0.0.2")
		.header("user-agent", "gatehouse-tests/1.0")
		.body(Body::empty())
		.unwrap();
	let response = app.clone().oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	let records = audit_records(&pool).await;
	assert_eq!(records[0].actor_ip.as_deref(), Some("198.51.100.7"));
	assert_eq!(records[0].actor_agent.as_deref(), Some("gatehouse-tests/1.0"));
}

#[tokio::test]
async fn users_may_read_themselves_and_admins_anyone() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(&app, Method::GET, &format!("/api/v1/users/{BUYER}"), Some(BUYER)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["username"], "buyer");

	let (status, body) = send(&app, Method::GET, &format!("/api/v1/users/{OWNER}"), Some(BUYER)).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(error_of(body).resource_type.as_deref(), Some("user"));

	let (status, _) = send(&app, Method::GET, &format!("/api/v1/users/{OWNER}"), Some(ADMIN)).await;
	assert_eq!(status, StatusCode::OK);

	let (status, _) = send(&app, Method::GET, "/api/v1/users/12345", Some(ADMIN)).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_resolves_to_the_acting_subject() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(&app, Method::GET, "/api/v1/users/me", Some(OWNER)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["id"], OWNER);
	assert_eq!(body["roles"], serde_json::json!(["seller"]));
}

#[tokio::test]
async fn catalog_is_open_to_any_subject() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(&app, Method::GET, "/api/v1/products", Some(STRANGER)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn health_reports_loaded_policies() {
	let pool = test_pool().await;
	let app = app(&pool).await;

	let (status, body) = send(&app, Method::GET, "/health", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
	assert_eq!(body["policies"], 5);
}
