// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::record::AuditRecord;
use crate::sink::AuditSink;

/// Emits audit records as structured log events on the `audit` target.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
		::tracing::info!(
			target: "audit",
			audit_id = %record.id,
			timestamp = %record.timestamp.to_rfc3339(),
			subject_id = record.subject_id.as_deref().unwrap_or("-"),
			action = %record.action,
			resource_type = %record.resource_type,
			resource_id = record.resource_id.as_deref().unwrap_or("-"),
			policy_name = %record.policy_name,
			allowed = record.allowed,
			reason = %record.reason,
			actor_ip = record.actor_ip.as_deref().unwrap_or("-"),
			actor_agent = record.actor_agent.as_deref().unwrap_or("-"),
			"authorization decision"
		);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gatehouse_policy::Decision;
	use std::io;
	use std::sync::{Arc, Mutex};
	use tracing_subscriber::layer::SubscriberExt;

	#[derive(Clone, Default)]
	struct Captured(Arc<Mutex<Vec<u8>>>);

	impl io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[tokio::test]
	async fn publishing_never_fails() {
		let sink = TracingAuditSink::new();
		let record = AuditRecord::builder("delete", "product")
			.decision(&Decision::deny("denied_by_policy"))
			.build();
		assert!(sink.publish(&record).await.is_ok());
		assert_eq!(sink.name(), "tracing");
	}

	#[test]
	fn event_carries_every_record_field() {
		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = tracing_subscriber::registry().with(
			tracing_subscriber::fmt::layer()
				.with_ansi(false)
				.with_writer(move || writer.clone()),
		);
		let record = AuditRecord::builder("delete", "product")
			.subject("3")
			.resource_id("1")
			.decision(&Decision::deny("denied_by_policy"))
			.actor_ip(Some("203.0.113.9".to_string()))
			.actor_agent(Some("curl/8.0".to_string()))
			.build();

		::tracing::subscriber::with_default(subscriber, || {
			futures::executor::block_on(TracingAuditSink::new().publish(&record)).unwrap();
		});

		let line = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
		assert!(line.contains("audit:"));
		assert!(line.contains("subject_id=\"3\""));
		assert!(line.contains("policy_name=delete_product"));
		assert!(line.contains("allowed=false"));
		assert!(line.contains("actor_ip=\"203.0.113.9\""));
		assert!(line.contains("actor_agent=\"curl/8.0\""));
	}
}
