// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline commands of the server binary.

use std::io::Write;
use std::path::Path;

use gatehouse_policy::{PolicyConfig, PolicyLoadError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckPolicyError {
	#[error(transparent)]
	Load(#[from] PolicyLoadError),

	#[error("failed to write policy document: {0}")]
	Write(#[from] std::io::Error),
}

/// Validates the policy document at `path` and writes its normalized YAML to
/// `out`. Nothing is written when the document is invalid.
pub fn check_policy(path: &Path, out: &mut impl Write) -> Result<PolicyConfig, CheckPolicyError> {
	let policies = PolicyConfig::load(path)?;
	let yaml = policies.to_yaml()?;
	out.write_all(yaml.as_bytes())?;
	out.flush()?;
	Ok(policies)
}
