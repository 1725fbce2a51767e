// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::record::AuditRecord;

#[cfg(feature = "sink-sqlite")]
pub mod sqlite;

#[cfg(feature = "sink-tracing")]
pub mod tracing;

/// Destination for persisted audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, record: &AuditRecord) -> Result<(), AuditSinkError>;
}

/// Discards every record. Used when auditing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
	fn name(&self) -> &str {
		"noop"
	}

	async fn publish(&self, _record: &AuditRecord) -> Result<(), AuditSinkError> {
		Ok(())
	}
}
