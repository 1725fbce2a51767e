// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatehouse_audit::SqliteAuditSink;
use sqlx::SqlitePool;

use super::error::Result;

const SCHEMA: [&str; 7] = [
	r#"
	CREATE TABLE IF NOT EXISTS users (
		id INTEGER PRIMARY KEY,
		username TEXT NOT NULL UNIQUE,
		email TEXT NOT NULL UNIQUE,
		is_active INTEGER NOT NULL DEFAULT 1,
		created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS roles (
		id INTEGER PRIMARY KEY,
		title TEXT NOT NULL UNIQUE
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS user_roles (
		user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
		role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
		PRIMARY KEY (user_id, role_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS products (
		id INTEGER PRIMARY KEY,
		name TEXT NOT NULL,
		description TEXT,
		price REAL NOT NULL DEFAULT 0,
		owner_id INTEGER NOT NULL REFERENCES users(id),
		is_public INTEGER NOT NULL DEFAULT 0,
		created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS orders (
		id INTEGER PRIMARY KEY,
		user_id INTEGER NOT NULL REFERENCES users(id),
		created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS order_items (
		id INTEGER PRIMARY KEY,
		order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
		product_id INTEGER NOT NULL REFERENCES products(id),
		quantity INTEGER NOT NULL DEFAULT 1
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id)",
];

/// Creates every table the server uses, including `audit_logs`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	for statement in SCHEMA {
		sqlx::query(statement).execute(pool).await?;
	}
	SqliteAuditSink::new(pool.clone()).migrate().await?;

	tracing::info!("database migrations complete");
	Ok(())
}
