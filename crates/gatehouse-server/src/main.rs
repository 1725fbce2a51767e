// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gatehouse server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gatehouse_policy::{PolicyConfig, PolicyEngine};
use gatehouse_server::{check_policy, create_app_state, create_audit_hook, create_router, Authorizer};
use gatehouse_server_config::{LogFormat, ServerConfig};
use tower_http::trace::TraceLayer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Gatehouse - attribute-based access control for the storefront API.
#[derive(Parser, Debug)]
#[command(name = "gatehouse-server", about = "Gatehouse ABAC server", version)]
struct Args {
	/// Path to the server TOML config (defaults to /etc/gatehouse/server.toml)
	#[arg(long, env = "GATEHOUSE_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Show version and build information
	Version,
	/// Validate a policy document and print it in normalized form
	CheckPolicy {
		/// Policy document to check (defaults to the configured policy path)
		path: Option<PathBuf>,
	},
}

fn load_server_config(args: &Args) -> Result<ServerConfig, gatehouse_server_config::ConfigError> {
	match &args.config {
		Some(path) => gatehouse_server_config::load_config_with_file(path),
		None => gatehouse_server_config::load_config(),
	}
}

/// Installs the global subscriber. Commands whose stdout is data log to
/// stderr instead.
fn init_tracing(config: &ServerConfig, writer: BoxMakeWriter) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json().with_writer(writer))
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(writer))
			.init(),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = load_server_config(&args)?;

	if let Some(Command::CheckPolicy { path }) = &args.command {
		init_tracing(&config, BoxMakeWriter::new(std::io::stderr));
		let path = path.clone().unwrap_or_else(|| config.policy.path.clone());
		check_policy(&path, &mut std::io::stdout().lock())?;
		return Ok(());
	}

	init_tracing(&config, BoxMakeWriter::new(std::io::stdout));

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		policy_path = %config.policy.path.display(),
		"starting gatehouse-server"
	);

	// An invalid policy document is fatal.
	let policies = PolicyConfig::load(&config.policy.path)?;
	let engine = PolicyEngine::new(policies);

	let pool = gatehouse_server::db::create_pool(&config.database.url).await?;
	gatehouse_server::db::run_migrations(&pool).await?;

	let audit = create_audit_hook(&config.audit, pool.clone());
	let authorizer = Authorizer::new(engine, pool.clone()).with_audit(audit);
	let state = create_app_state(pool, authorizer);

	let app = create_router(state).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
