// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::error::AuditSinkError;
use crate::record::AuditRecord;
use crate::sink::AuditSink;

const CREATE_AUDIT_LOGS: &str = r#"
	CREATE TABLE IF NOT EXISTS audit_logs (
		id TEXT PRIMARY KEY,
		timestamp TEXT NOT NULL,
		subject_id TEXT,
		action TEXT NOT NULL,
		resource_type TEXT NOT NULL,
		resource_id TEXT,
		policy_name TEXT NOT NULL,
		allowed INTEGER NOT NULL,
		reason TEXT NOT NULL,
		ip_address TEXT,
		user_agent TEXT,
		created_at TEXT NOT NULL
	)
"#;

/// Persists audit records to the `audit_logs` table.
///
/// Records are append-only and retained indefinitely.
pub struct SqliteAuditSink {
	pool: SqlitePool,
	name: String,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			name: "sqlite".to_string(),
		}
	}

	/// Creates the `audit_logs` table if it does not exist.
	pub async fn migrate(&self) -> Result<(), sqlx::Error> {
		sqlx::query(CREATE_AUDIT_LOGS).execute(&self.pool).await?;
		sqlx::query(
			"CREATE INDEX IF NOT EXISTS idx_audit_logs_policy ON audit_logs (policy_name, timestamp)",
		)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// Most recent records first. Rows whose id or timestamp cannot be parsed
	/// are logged and skipped.
	#[tracing::instrument(skip(self))]
	pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRecord>, sqlx::Error> {
		let rows = sqlx::query(
			r#"
			SELECT id, timestamp, subject_id, action, resource_type, resource_id,
				policy_name, allowed, reason, ip_address, user_agent
			FROM audit_logs
			ORDER BY timestamp DESC
			LIMIT ?
			"#,
		)
		.bind(limit)
		.fetch_all(&self.pool)
		.await?;

		let records = rows
			.into_iter()
			.filter_map(|row| {
				let raw_id: String = row.get("id");
				let id = match Uuid::parse_str(&raw_id) {
					Ok(id) => id,
					Err(e) => {
						warn!(audit_id = %raw_id, error = %e, "skipping audit row with malformed id");
						return None;
					}
				};

				let ts: String = row.get("timestamp");
				let timestamp = match DateTime::parse_from_rfc3339(&ts) {
					Ok(dt) => dt.with_timezone(&Utc),
					Err(e) => {
						warn!(audit_id = %raw_id, timestamp = %ts, error = %e, "skipping audit row with malformed timestamp");
						return None;
					}
				};

				Some(AuditRecord {
					id,
					subject_id: row.get("subject_id"),
					action: row.get("action"),
					resource_type: row.get("resource_type"),
					resource_id: row.get("resource_id"),
					policy_name: row.get("policy_name"),
					allowed: row.get("allowed"),
					reason: row.get("reason"),
					actor_ip: row.get("ip_address"),
					actor_agent: row.get("user_agent"),
					timestamp,
				})
			})
			.collect();

		Ok(records)
	}

	pub async fn count(&self) -> Result<i64, sqlx::Error> {
		let row = sqlx::query("SELECT COUNT(*) AS cnt FROM audit_logs")
			.fetch_one(&self.pool)
			.await?;
		Ok(row.get("cnt"))
	}
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
	fn name(&self) -> &str {
		&self.name
	}

	async fn publish(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
		let now = Utc::now();

		sqlx::query(
			r#"
			INSERT INTO audit_logs (
				id, timestamp, subject_id, action, resource_type, resource_id,
				policy_name, allowed, reason, ip_address, user_agent, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(record.id.to_string())
		.bind(record.timestamp.to_rfc3339())
		.bind(&record.subject_id)
		.bind(&record.action)
		.bind(&record.resource_type)
		.bind(&record.resource_id)
		.bind(&record.policy_name)
		.bind(record.allowed)
		.bind(&record.reason)
		.bind(&record.actor_ip)
		.bind(&record.actor_agent)
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| {
			if is_transient_error(&e) {
				AuditSinkError::Transient(format!("database error: {e}"))
			} else {
				AuditSinkError::Permanent(format!("database error: {e}"))
			}
		})?;

		Ok(())
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked") || msg.contains("timeout")
		}
		_ => false,
	}
}
