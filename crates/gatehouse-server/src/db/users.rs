// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::Row;

use super::error::Result;

/// An account together with its role titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub email: String,
	pub roles: Vec<String>,
}

#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch an active user and their roles on a connection the caller holds.
	#[tracing::instrument(skip(conn))]
	pub async fn find_on(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>> {
		let Some(row) = sqlx::query(
			"SELECT id, username, email FROM users WHERE id = ? AND is_active = 1",
		)
		.bind(id)
		.fetch_optional(&mut *conn)
		.await?
		else {
			return Ok(None);
		};

		let roles = sqlx::query(
			r#"
			SELECT r.title
			FROM roles r
			JOIN user_roles ur ON ur.role_id = r.id
			WHERE ur.user_id = ?
			ORDER BY r.title
			"#,
		)
		.bind(id)
		.fetch_all(&mut *conn)
		.await?
		.iter()
		.map(|r| r.get::<String, _>("title"))
		.collect();

		Ok(Some(User {
			id: row.get("id"),
			username: row.get("username"),
			email: row.get("email"),
			roles,
		}))
	}

	#[tracing::instrument(skip(self))]
	pub async fn find(&self, id: i64) -> Result<Option<User>> {
		let mut conn = self.pool.acquire().await?;
		Self::find_on(&mut conn, id).await
	}
}
