// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Location of the policy document. The document itself is loaded once by the
//! server and is not layered.

use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_POLICY_PATH: &str = "config/abac_policies.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySourceConfig {
	pub path: PathBuf,
}

impl Default for PolicySourceConfig {
	fn default() -> Self {
		PolicySourceConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicySourceConfigLayer {
	#[serde(default)]
	pub path: Option<PathBuf>,
}

impl PolicySourceConfigLayer {
	pub fn merge(&mut self, other: PolicySourceConfigLayer) {
		if other.path.is_some() {
			self.path = other.path;
		}
	}

	pub fn finalize(self) -> PolicySourceConfig {
		PolicySourceConfig {
			path: self
				.path
				.unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_PATH)),
		}
	}
}
