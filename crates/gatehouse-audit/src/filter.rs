// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;

use crate::record::AuditRecord;

/// Policies whose allowed decisions are still persisted.
///
/// An explicit allow-list of policy names; nothing is inferred from the
/// action string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveActions {
	policies: BTreeSet<String>,
}

impl SensitiveActions {
	pub fn new<I, S>(policies: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			policies: policies.into_iter().map(Into::into).collect(),
		}
	}

	pub fn contains(&self, policy_name: &str) -> bool {
		self.policies.contains(policy_name)
	}

	/// Every denial is persisted; an allowed decision only for a sensitive policy.
	pub fn should_persist(&self, record: &AuditRecord) -> bool {
		!record.allowed || self.contains(&record.policy_name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.policies.iter().map(String::as_str)
	}
}

impl<S: Into<String>> FromIterator<S> for SensitiveActions {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gatehouse_policy::Decision;
	use proptest::prelude::*;

	fn record(policy: &str, allowed: bool) -> AuditRecord {
		let decision = if allowed {
			Decision::allow("allowed_by_policy")
		} else {
			Decision::deny("denied_by_policy")
		};
		AuditRecord::builder("act", "thing")
			.policy(policy)
			.decision(&decision)
			.build()
	}

	#[test]
	fn denials_are_always_persisted() {
		let sensitive = SensitiveActions::default();
		assert!(sensitive.should_persist(&record("download_product", false)));
	}

	#[test]
	fn routine_allows_are_skipped() {
		let sensitive = SensitiveActions::new(["delete_product"]);
		assert!(!sensitive.should_persist(&record("download_product", true)));
	}

	#[test]
	fn sensitive_allows_are_persisted() {
		let sensitive = SensitiveActions::new(["delete_product"]);
		assert!(sensitive.should_persist(&record("delete_product", true)));
	}

	#[test]
	fn matching_is_exact() {
		let sensitive: SensitiveActions = ["delete_product"].into_iter().collect();
		assert!(!sensitive.contains("delete"));
		assert!(!sensitive.contains("delete_products"));
		assert_eq!(sensitive.iter().collect::<Vec<_>>(), vec!["delete_product"]);
	}

	proptest! {
		#[test]
		fn persist_iff_denied_or_sensitive(
			policy in "[a-z]{1,6}_[a-z]{1,6}",
			allowed in any::<bool>(),
			listed in any::<bool>(),
		) {
			let sensitive = if listed {
				SensitiveActions::new([policy.clone()])
			} else {
				SensitiveActions::default()
			};
			prop_assert_eq!(
				sensitive.should_persist(&record(&policy, allowed)),
				!allowed || listed
			);
		}
	}
}
