// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit logging configuration section.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

const DEFAULT_SENSITIVE_ACTIONS: [&str; 1] = ["delete_product"];

/// Where persisted audit records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSinkKind {
	#[default]
	Sqlite,
	Tracing,
}

impl FromStr for AuditSinkKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"sqlite" => Ok(Self::Sqlite),
			"tracing" => Ok(Self::Tracing),
			other => Err(format!("unknown audit sink '{other}' (expected sqlite or tracing)")),
		}
	}
}

impl fmt::Display for AuditSinkKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sqlite => write!(f, "sqlite"),
			Self::Tracing => write!(f, "tracing"),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub sink: Option<AuditSinkKind>,
	#[serde(default)]
	pub sensitive_actions: Option<Vec<String>>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.sink.is_some() {
			self.sink = other.sink;
		}
		if other.sensitive_actions.is_some() {
			self.sensitive_actions = other.sensitive_actions;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			sink: self.sink.unwrap_or_default(),
			sensitive_actions: self.sensitive_actions.unwrap_or_else(|| {
				DEFAULT_SENSITIVE_ACTIONS
					.iter()
					.map(|s| s.to_string())
					.collect()
			}),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
	pub enabled: bool,
	pub sink: AuditSinkKind,
	/// Policy names whose allowed decisions are persisted alongside denials.
	pub sensitive_actions: Vec<String>,
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditConfigLayer::default().finalize()
	}
}
