// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The declarative policy document.
//!
//! ```yaml
//! rules:                 # logical name -> registered rule identifier
//!   admin: is_admin
//!   owner: is_owner
//!   working_hours: in_working_hours
//! reasons:               # optional: logical name -> reason code on allow
//!   admin: user_is_admin
//! policies:              # "{action}_{resource_type}" -> OR of conditions
//!   delete_product:
//!     - admin                       # atomic condition
//!     - [owner, working_hours]      # group: AND of its members
//! ```
//!
//! A document is loaded once at startup and never changes afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PolicyLoadError;
use crate::rules::RuleId;

/// A policy condition: a rule reference or a conjunction of conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
	/// Reference to a logical rule name declared under `rules`.
	Atomic(String),
	/// True only if every member is true. An empty group is true.
	Group(Vec<Condition>),
}

impl Condition {
	pub fn atomic(name: impl Into<String>) -> Self {
		Condition::Atomic(name.into())
	}

	pub fn group<I, C>(members: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<Condition>,
	{
		Condition::Group(members.into_iter().map(Into::into).collect())
	}

	/// The first logical rule name reached depth-first, if any.
	pub fn leading_rule(&self) -> Option<&str> {
		match self {
			Condition::Atomic(name) => Some(name.as_str()),
			Condition::Group(members) => members.iter().find_map(Condition::leading_rule),
		}
	}

	fn visit_rule_names<'a>(&'a self, out: &mut Vec<&'a str>) {
		match self {
			Condition::Atomic(name) => out.push(name.as_str()),
			Condition::Group(members) => {
				for member in members {
					member.visit_rule_names(out);
				}
			}
		}
	}
}

impl From<&str> for Condition {
	fn from(name: &str) -> Self {
		Condition::Atomic(name.to_string())
	}
}

impl From<String> for Condition {
	fn from(name: String) -> Self {
		Condition::Atomic(name)
	}
}

/// The document exactly as written, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
	pub rules: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub reasons: BTreeMap<String, String>,
	pub policies: BTreeMap<String, Vec<Condition>>,
}

/// A validated policy document.
///
/// Every logical rule name resolves to a registered [`RuleId`]; construction
/// fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
	document: PolicyDocument,
	resolved: BTreeMap<String, RuleId>,
}

impl PolicyConfig {
	/// Reads and validates the policy document at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
		let path = path.as_ref();
		debug!(path = %path.display(), "loading policy document");
		let content = std::fs::read_to_string(path).map_err(|e| PolicyLoadError::FileRead {
			path: path.to_path_buf(),
			source: e,
		})?;
		let config = Self::from_yaml_str(&content)?;
		info!(
			path = %path.display(),
			rules = config.document.rules.len(),
			policies = config.document.policies.len(),
			"policy document loaded"
		);
		Ok(config)
	}

	pub fn from_yaml_str(content: &str) -> Result<Self, PolicyLoadError> {
		let document: PolicyDocument =
			serde_yaml::from_str(content).map_err(PolicyLoadError::Parse)?;
		Self::from_document(document)
	}

	pub fn from_document(document: PolicyDocument) -> Result<Self, PolicyLoadError> {
		let mut resolved = BTreeMap::new();
		for (logical_name, rule_id) in &document.rules {
			let rule = RuleId::lookup(rule_id).ok_or_else(|| PolicyLoadError::UnknownRule {
				logical_name: logical_name.clone(),
				rule_id: rule_id.clone(),
			})?;
			resolved.insert(logical_name.clone(), rule);
		}

		if let Some(logical_name) = document
			.reasons
			.keys()
			.find(|name| !document.rules.contains_key(*name))
		{
			return Err(PolicyLoadError::UnknownReasonRule {
				logical_name: logical_name.clone(),
			});
		}

		for (policy_name, conditions) in &document.policies {
			let mut names = Vec::new();
			for condition in conditions {
				condition.visit_rule_names(&mut names);
			}
			for name in names.into_iter().filter(|name| !resolved.contains_key(*name)) {
				warn!(
					policy_name = %policy_name,
					rule = %name,
					"policy references an undeclared rule; the condition will always deny"
				);
			}
		}

		Ok(Self { document, resolved })
	}

	/// Serializes the document back to YAML.
	pub fn to_yaml(&self) -> Result<String, PolicyLoadError> {
		serde_yaml::to_string(&self.document).map_err(PolicyLoadError::Serialize)
	}

	pub fn document(&self) -> &PolicyDocument {
		&self.document
	}

	pub fn rules(&self) -> &BTreeMap<String, String> {
		&self.document.rules
	}

	pub fn policies(&self) -> &BTreeMap<String, Vec<Condition>> {
		&self.document.policies
	}

	pub fn policy(&self, policy_name: &str) -> Option<&[Condition]> {
		self.document.policies.get(policy_name).map(Vec::as_slice)
	}

	/// Resolves a logical rule name to its registered rule.
	pub fn resolve_rule(&self, logical_name: &str) -> Option<RuleId> {
		self.resolved.get(logical_name).copied()
	}

	/// The reason code reported when `logical_name` leads an allowing condition.
	pub fn grant_reason(&self, logical_name: &str) -> Option<&str> {
		self.document.reasons.get(logical_name).map(String::as_str)
	}
}
