// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environmental facts gathered per authorization check.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use gatehouse_policy::Environment;
use sqlx::sqlite::SqliteConnection;

use crate::auth::Subject;
use crate::db::{OrderRepository, Result};

/// Supplies the facts environment-dependent rules read.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
	async fn gather(&self, conn: &mut SqliteConnection, subject: &Subject) -> Result<Environment>;
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Current UTC hour plus the subject's purchase history.
///
/// Purchases are read on every call.
#[derive(Clone)]
pub struct OrderHistoryEnvironment {
	clock: Clock,
}

impl OrderHistoryEnvironment {
	pub fn new() -> Self {
		Self {
			clock: Arc::new(Utc::now),
		}
	}

	/// Uses `clock` instead of the system time.
	pub fn with_clock(clock: Clock) -> Self {
		Self { clock }
	}

	/// Pins the hour of day.
	pub fn at_hour(hour: u32) -> Self {
		Self::with_clock(Arc::new(move || {
			let now = Utc::now();
			now.with_hour(hour.min(23)).unwrap_or(now)
		}))
	}
}

impl Default for OrderHistoryEnvironment {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl EnvironmentProvider for OrderHistoryEnvironment {
	#[tracing::instrument(skip(self, conn, subject), fields(subject_id = subject.id))]
	async fn gather(&self, conn: &mut SqliteConnection, subject: &Subject) -> Result<Environment> {
		let hour = (self.clock)().hour();
		let purchased = OrderRepository::purchased_product_ids(conn, subject.id).await?;
		tracing::trace!(hour, purchased = purchased.len(), "environment gathered");
		Ok(Environment::new()
			.with_hour(hour)
			.with_purchased_ids(purchased))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::run_migrations;
	use gatehouse_policy::AttrValue;
	use sqlx::sqlite::SqlitePoolOptions;
	use sqlx::SqlitePool;

	async fn seeded_pool() -> SqlitePool {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		run_migrations(&pool).await.unwrap();
		for statement in [
			"INSERT INTO users (id, username, email) VALUES (1, 'bo', 'bo@example.com')",
			"INSERT INTO users (id, username, email) VALUES (2, 'cy', 'cy@example.com')",
			"INSERT INTO products (id, name, owner_id) VALUES (10, 'lamp', 2)",
			"INSERT INTO products (id, name, owner_id) VALUES (11, 'desk', 2)",
			"INSERT INTO orders (id, user_id) VALUES (1, 1)",
			"INSERT INTO orders (id, user_id) VALUES (2, 1)",
			"INSERT INTO order_items (order_id, product_id) VALUES (1, 10)",
			"INSERT INTO order_items (order_id, product_id) VALUES (2, 10)",
		] {
			sqlx::query(statement).execute(&pool).await.unwrap();
		}
		pool
	}

	fn subject(id: i64) -> Subject {
		Subject {
			id,
			username: format!("user{id}"),
			roles: Vec::new(),
		}
	}

	#[tokio::test]
	async fn gathers_pinned_hour_and_purchases() {
		let pool = seeded_pool().await;
		let mut conn = pool.acquire().await.unwrap();

		let env = OrderHistoryEnvironment::at_hour(14)
			.gather(&mut conn, &subject(1))
			.await
			.unwrap();

		assert_eq!(env.hour(), 14);
		assert!(env.has_purchased(&AttrValue::from(10)));
		assert!(!env.has_purchased(&AttrValue::from(11)));
	}

	#[tokio::test]
	async fn subject_without_orders_has_no_purchases() {
		let pool = seeded_pool().await;
		let mut conn = pool.acquire().await.unwrap();

		let env = OrderHistoryEnvironment::at_hour(3)
			.gather(&mut conn, &subject(2))
			.await
			.unwrap();

		assert_eq!(env.hour(), 3);
		assert!(!env.has_purchased(&AttrValue::from(10)));
	}

	#[tokio::test]
	async fn out_of_range_hour_is_clamped() {
		let pool = seeded_pool().await;
		let mut conn = pool.acquire().await.unwrap();

		let env = OrderHistoryEnvironment::at_hour(30)
			.gather(&mut conn, &subject(2))
			.await
			.unwrap();

		assert_eq!(env.hour(), 23);
	}

	#[tokio::test]
	async fn missing_order_tables_surface_as_errors() {
		let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
		let mut conn = pool.acquire().await.unwrap();

		let result = OrderHistoryEnvironment::new()
			.gather(&mut conn, &subject(1))
			.await;

		assert!(result.is_err());
	}
}
