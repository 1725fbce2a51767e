// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::filter::SensitiveActions;
use crate::record::AuditRecord;
use crate::sink::{AuditSink, NoopAuditSink};

/// Receives every authorization decision and persists the ones that matter.
///
/// Persistence is best-effort: sink failures are logged here and never reach
/// the caller.
#[derive(Clone)]
pub struct AuditHook {
	sink: Arc<dyn AuditSink>,
	sensitive: SensitiveActions,
}

impl AuditHook {
	pub fn new(sink: Arc<dyn AuditSink>, sensitive: SensitiveActions) -> Self {
		Self { sink, sensitive }
	}

	/// A hook that persists nothing.
	pub fn disabled() -> Self {
		Self::new(Arc::new(NoopAuditSink), SensitiveActions::default())
	}

	#[instrument(
		skip(self, record),
		fields(
			policy_name = %record.policy_name,
			allowed = record.allowed,
			sink = self.sink.name(),
		)
	)]
	pub async fn record(&self, record: AuditRecord) {
		if !self.sensitive.should_persist(&record) {
			debug!("routine allowed decision, not persisted");
			return;
		}

		if let Err(e) = self.sink.publish(&record).await {
			warn!(
				audit_id = %record.id,
				reason = %record.reason,
				error = %e,
				"audit write failed"
			);
		}
	}
}

impl std::fmt::Debug for AuditHook {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuditHook")
			.field("sink", &self.sink.name())
			.field("sensitive", &self.sensitive)
			.finish()
	}
}
