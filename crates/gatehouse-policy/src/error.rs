// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a policy document.
///
/// All of them are fatal: a process must not start with an invalid policy set.
#[derive(Error, Debug)]
pub enum PolicyLoadError {
	#[error("failed to read policy document {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed policy document: {0}")]
	Parse(#[source] serde_yaml::Error),

	#[error("rule '{logical_name}' maps to unregistered rule '{rule_id}'")]
	UnknownRule {
		logical_name: String,
		rule_id: String,
	},

	#[error("reason configured for '{logical_name}', which is not a declared rule")]
	UnknownReasonRule { logical_name: String },

	#[error("failed to serialize policy document: {0}")]
	Serialize(#[source] serde_yaml::Error),
}
