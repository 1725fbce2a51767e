// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Gatehouse server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`GATEHOUSE_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use gatehouse_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub policy: PolicySourceConfig,
	pub audit: AuditConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`GATEHOUSE_SERVER_*`)
/// 2. Config file (`/etc/gatehouse/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merges the given sources in precedence order and resolves the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();
	let audit = layer.audit.unwrap_or_default().finalize();

	validate_config(&http, &audit)?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		policy_path = %policy.path.display(),
		log_format = %logging.format,
		audit_enabled = audit.enabled,
		audit_sink = %audit.sink,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		logging,
		policy,
		audit,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(http: &HttpConfig, audit: &AuditConfig) -> Result<(), ConfigError> {
	if http.host.trim().is_empty() {
		return Err(ConfigError::InvalidValue {
			key: "http.host".to_string(),
			message: "host must not be empty".to_string(),
		});
	}

	if let Some(blank) = audit.sensitive_actions.iter().find(|a| a.trim().is_empty()) {
		return Err(ConfigError::InvalidValue {
			key: "audit.sensitive_actions".to_string(),
			message: format!("policy names must not be blank, got '{blank}'"),
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	struct FixedSource(Precedence, ServerConfigLayer);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn port_layer(port: u16) -> ServerConfigLayer {
		ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(port),
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}

	#[test]
	fn higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(FixedSource(Precedence::Environment, port_layer(7000))),
			Box::new(FixedSource(Precedence::ConfigFile, port_layer(6000))),
			Box::new(DefaultsSource),
		])
		.unwrap();
		assert_eq!(config.http.port, 7000);
		assert_eq!(config.http.host, "0.0.0.0");
	}

	#[test]
	fn file_values_survive_when_not_overridden() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:/tmp/gatehouse-test.db"

[audit]
enabled = false
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
			Box::new(FixedSource(Precedence::Environment, port_layer(8181))),
		])
		.unwrap();

		assert_eq!(config.database.url, "sqlite:/tmp/gatehouse-test.db");
		assert!(!config.audit.enabled);
		assert_eq!(config.http.port, 8181);
		assert_eq!(config.audit.sensitive_actions, vec!["delete_product".to_string()]);
	}

	#[test]
	fn blank_sensitive_action_is_rejected() {
		let audit = AuditConfig {
			sensitive_actions: vec!["  ".to_string()],
			..Default::default()
		};
		let err = validate_config(&HttpConfig::default(), &audit).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn defaults_resolve() {
		let config = load_from_sources(vec![Box::new(DefaultsSource)]).unwrap();
		assert_eq!(config.policy.path, std::path::PathBuf::from("config/abac_policies.yaml"));
		assert_eq!(config.logging.format, LogFormat::Pretty);
		assert_eq!(config.audit.sink, AuditSinkKind::Sqlite);
	}
}
