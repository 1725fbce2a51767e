// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

use super::error::Result;

pub struct OrderRepository;

impl OrderRepository {
	/// Distinct ids of every product the user has ordered.
	#[tracing::instrument(skip(conn))]
	pub async fn purchased_product_ids(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<i64>> {
		let rows = sqlx::query(
			r#"
			SELECT DISTINCT oi.product_id
			FROM order_items oi
			JOIN orders o ON o.id = oi.order_id
			WHERE o.user_id = ?
			ORDER BY oi.product_id
			"#,
		)
		.bind(user_id)
		.fetch_all(&mut *conn)
		.await?;

		Ok(rows.iter().map(|r| r.get("product_id")).collect())
	}
}
