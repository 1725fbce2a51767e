// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation.
//!
//! A policy is an ordered list of conditions combined with OR; a group
//! condition combines its members with AND. Evaluation short-circuits in both
//! directions and never fails: unknown policies and unresolvable rules deny.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::attributes::{get, Attributes, Environment};
use crate::config::{Condition, PolicyConfig};

/// Stable reason codes carried by [`Decision`].
///
/// Audit consumers and denial messages match on these strings.
pub mod reason {
	pub const ALLOWED_BY_POLICY: &str = "allowed_by_policy";
	pub const DENIED_BY_POLICY: &str = "denied_by_policy";
	pub const POLICY_NOT_FOUND: &str = "policy_not_found";
	pub const RULE_NOT_FOUND: &str = "rule_not_found";
}

const UNKNOWN_RESOURCE_TYPE: &str = "unknown";

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
	pub allowed: bool,
	pub reason: String,
}

impl Decision {
	pub fn allow(reason: impl Into<String>) -> Self {
		Self {
			allowed: true,
			reason: reason.into(),
		}
	}

	pub fn deny(reason: impl Into<String>) -> Self {
		Self {
			allowed: false,
			reason: reason.into(),
		}
	}
}

/// Everything an access check looks at, built per request.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
	pub subject: &'a dyn Attributes,
	pub resource: &'a dyn Attributes,
	pub action: &'a str,
	pub environment: &'a Environment,
}

impl EvaluationContext<'_> {
	/// The resource's `type` attribute, or `"unknown"` when it has none.
	pub fn resource_type(&self) -> String {
		match get(self.resource, "type", Value::Null) {
			Value::String(resource_type) => resource_type,
			_ => UNKNOWN_RESOURCE_TYPE.to_string(),
		}
	}

	/// The policy governing this context: `"{action}_{resource_type}"`.
	pub fn policy_name(&self) -> String {
		PolicyEngine::policy_name(self.action, &self.resource_type())
	}
}

/// Evaluates policies from an immutable [`PolicyConfig`].
///
/// Construct once at startup and share by reference; evaluation takes `&self`
/// and touches no mutable state.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
	config: PolicyConfig,
}

impl PolicyEngine {
	pub fn new(config: PolicyConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &PolicyConfig {
		&self.config
	}

	pub fn policy_name(action: &str, resource_type: &str) -> String {
		format!("{action}_{resource_type}")
	}

	/// Evaluates a single condition.
	///
	/// Atomic conditions resolve through the document's `rules`; a name that
	/// does not resolve is logged and evaluates to `false`. Groups are true
	/// only if every member is true, stopping at the first false member.
	pub fn evaluate_condition(
		&self,
		condition: &Condition,
		subject: &dyn Attributes,
		resource: &dyn Attributes,
		environment: &Environment,
	) -> bool {
		match condition {
			Condition::Atomic(logical_name) => match self.config.resolve_rule(logical_name) {
				Some(rule) => rule.evaluate(subject, resource, environment),
				None => {
					error!(
						rule = %logical_name,
						reason = reason::RULE_NOT_FOUND,
						"rule not found or not mapped"
					);
					false
				}
			},
			Condition::Group(members) => members
				.iter()
				.all(|member| self.evaluate_condition(member, subject, resource, environment)),
		}
	}

	/// Evaluates the named policy.
	///
	/// Returns on the first top-level condition that holds. The reason is the
	/// grant reason configured for that condition's leading rule, falling back
	/// to `allowed_by_policy`.
	#[instrument(level = "debug", skip(self, subject, resource, environment))]
	pub fn evaluate(
		&self,
		policy_name: &str,
		subject: &dyn Attributes,
		resource: &dyn Attributes,
		environment: &Environment,
	) -> Decision {
		let Some(conditions) = self.config.policy(policy_name) else {
			warn!(policy_name, "policy not defined");
			return Decision::deny(reason::POLICY_NOT_FOUND);
		};

		for condition in conditions {
			if self.evaluate_condition(condition, subject, resource, environment) {
				let reason = condition
					.leading_rule()
					.and_then(|rule| self.config.grant_reason(rule))
					.unwrap_or(reason::ALLOWED_BY_POLICY);
				return Decision::allow(reason);
			}
		}

		Decision::deny(reason::DENIED_BY_POLICY)
	}

	/// Derives the policy name from the context and evaluates it.
	pub fn check_access(&self, context: &EvaluationContext<'_>) -> Decision {
		let policy_name = context.policy_name();
		let decision = self.evaluate(
			&policy_name,
			context.subject,
			context.resource,
			context.environment,
		);

		let subject_id = get(context.subject, "id", Value::Null);
		if decision.allowed {
			debug!(
				policy_name = %policy_name,
				subject_id = %subject_id,
				reason = %decision.reason,
				"access allowed"
			);
		} else {
			info!(
				policy_name = %policy_name,
				subject_id = %subject_id,
				reason = %decision.reason,
				"access denied"
			);
		}

		decision
	}
}
