// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The audit record written for an authorization decision.

use chrono::{DateTime, Utc};
use gatehouse_policy::{Decision, PolicyEngine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable record of one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
	pub id: Uuid,
	pub subject_id: Option<String>,
	pub action: String,
	pub resource_type: String,
	pub resource_id: Option<String>,
	pub policy_name: String,
	pub allowed: bool,
	pub reason: String,
	pub actor_ip: Option<String>,
	pub actor_agent: Option<String>,
	pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
	/// Start building a record for `action` on `resource_type`.
	pub fn builder(action: impl Into<String>, resource_type: impl Into<String>) -> AuditRecordBuilder {
		AuditRecordBuilder::new(action, resource_type)
	}
}

/// Fluent construction of [`AuditRecord`]s.
///
/// The policy name defaults to `"{action}_{resource_type}"` and the decision to
/// a denial with an empty reason until [`AuditRecordBuilder::decision`] is set.
#[derive(Debug, Clone)]
pub struct AuditRecordBuilder {
	subject_id: Option<String>,
	action: String,
	resource_type: String,
	resource_id: Option<String>,
	policy_name: Option<String>,
	allowed: bool,
	reason: String,
	actor_ip: Option<String>,
	actor_agent: Option<String>,
}

impl AuditRecordBuilder {
	pub fn new(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
		Self {
			subject_id: None,
			action: action.into(),
			resource_type: resource_type.into(),
			resource_id: None,
			policy_name: None,
			allowed: false,
			reason: String::new(),
			actor_ip: None,
			actor_agent: None,
		}
	}

	pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
		self.subject_id = Some(subject_id.into());
		self
	}

	pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
		self.resource_id = Some(resource_id.into());
		self
	}

	pub fn policy(mut self, policy_name: impl Into<String>) -> Self {
		self.policy_name = Some(policy_name.into());
		self
	}

	pub fn decision(mut self, decision: &Decision) -> Self {
		self.allowed = decision.allowed;
		self.reason = decision.reason.clone();
		self
	}

	pub fn actor_ip(mut self, ip: Option<String>) -> Self {
		self.actor_ip = ip;
		self
	}

	pub fn actor_agent(mut self, agent: Option<String>) -> Self {
		self.actor_agent = agent;
		self
	}

	pub fn build(self) -> AuditRecord {
		let policy_name = self
			.policy_name
			.unwrap_or_else(|| PolicyEngine::policy_name(&self.action, &self.resource_type));

		AuditRecord {
			id: Uuid::new_v4(),
			subject_id: self.subject_id,
			action: self.action,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			policy_name,
			allowed: self.allowed,
			reason: self.reason,
			actor_ip: self.actor_ip,
			actor_agent: self.actor_agent,
			timestamp: Utc::now(),
		}
	}
}
