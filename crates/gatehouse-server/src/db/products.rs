// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;

use super::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
	pub id: i64,
	pub name: String,
	pub description: Option<String>,
	pub price: f64,
	pub owner_id: i64,
	pub is_public: bool,
}

impl Product {
	fn from_row(row: &SqliteRow) -> Self {
		Self {
			id: row.get("id"),
			name: row.get("name"),
			description: row.get("description"),
			price: row.get("price"),
			owner_id: row.get("owner_id"),
			is_public: row.get("is_public"),
		}
	}
}

const SELECT_PRODUCT: &str =
	"SELECT id, name, description, price, owner_id, is_public FROM products";

#[derive(Clone)]
pub struct ProductRepository {
	pool: SqlitePool,
}

impl ProductRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch a product on a connection the caller already holds.
	#[tracing::instrument(skip(conn))]
	pub async fn find_on(conn: &mut SqliteConnection, id: i64) -> Result<Option<Product>> {
		let row = sqlx::query(&format!("{SELECT_PRODUCT} WHERE id = ?"))
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?;
		Ok(row.as_ref().map(Product::from_row))
	}

	#[tracing::instrument(skip(self))]
	pub async fn find(&self, id: i64) -> Result<Option<Product>> {
		let mut conn = self.pool.acquire().await?;
		Self::find_on(&mut conn, id).await
	}

	#[tracing::instrument(skip(self))]
	pub async fn list(&self) -> Result<Vec<Product>> {
		let rows = sqlx::query(&format!("{SELECT_PRODUCT} ORDER BY id"))
			.fetch_all(&self.pool)
			.await?;
		Ok(rows.iter().map(Product::from_row).collect())
	}

	/// Returns false when no product had that id.
	#[tracing::instrument(skip(self))]
	pub async fn delete(&self, id: i64) -> Result<bool> {
		let result = sqlx::query("DELETE FROM products WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}
