// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per resource type loaders used by the authorization guard.
//!
//! Every loader has the same shape: given the guarded request, a storage
//! connection and the optional path id, it returns the entity or `None` when it
//! does not exist. Resource types without a loader are not resolved at all.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use sqlx::sqlite::SqliteConnection;

use crate::auth::Subject;
use crate::context::Resource;
use crate::db::{ProductRepository, Result, UserRepository};

/// What a loader may know about the request being guarded.
#[derive(Debug, Clone)]
pub struct GuardRequest {
	pub subject: Subject,
	pub path_params: HashMap<String, String>,
	pub actor_ip: Option<String>,
	pub actor_agent: Option<String>,
}

impl GuardRequest {
	/// Captures the subject, path parameters and caller metadata.
	///
	/// The caller address is the first `X-Forwarded-For` hop when present,
	/// otherwise the peer address of the connection.
	pub fn from_parts(parts: &Parts, subject: Subject, path_params: HashMap<String, String>) -> Self {
		let forwarded = parts
			.headers
			.get("x-forwarded-for")
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.split(',').next())
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.map(str::to_string);

		let peer = parts
			.extensions
			.get::<ConnectInfo<SocketAddr>>()
			.map(|ConnectInfo(addr)| addr.ip().to_string());

		let actor_agent = parts
			.headers
			.get(axum::http::header::USER_AGENT)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string);

		Self {
			subject,
			path_params,
			actor_ip: forwarded.or(peer),
			actor_agent,
		}
	}

	pub fn path_param(&self, key: &str) -> Option<&str> {
		self.path_params.get(key).map(String::as_str)
	}
}

#[async_trait]
pub trait ResourceLoader: Send + Sync {
	async fn load(
		&self,
		request: &GuardRequest,
		conn: &mut SqliteConnection,
		resource_id: Option<&str>,
	) -> Result<Option<Box<dyn Resource>>>;
}

/// Products require an id; a missing or non-numeric id finds nothing.
pub struct ProductLoader;

#[async_trait]
impl ResourceLoader for ProductLoader {
	async fn load(
		&self,
		_request: &GuardRequest,
		conn: &mut SqliteConnection,
		resource_id: Option<&str>,
	) -> Result<Option<Box<dyn Resource>>> {
		let Some(id) = resource_id.and_then(|id| id.parse::<i64>().ok()) else {
			return Ok(None);
		};
		let product = ProductRepository::find_on(conn, id).await?;
		Ok(product.map(|p| Box::new(p) as Box<dyn Resource>))
	}
}

/// Loads the addressed account, or the acting subject's own account when the
/// path carries no id.
pub struct UserLoader;

#[async_trait]
impl ResourceLoader for UserLoader {
	async fn load(
		&self,
		request: &GuardRequest,
		conn: &mut SqliteConnection,
		resource_id: Option<&str>,
	) -> Result<Option<Box<dyn Resource>>> {
		let id = match resource_id {
			Some(raw) => match raw.parse::<i64>() {
				Ok(id) => id,
				Err(_) => return Ok(None),
			},
			None => request.subject.id,
		};
		let user = UserRepository::find_on(conn, id).await?;
		Ok(user.map(|u| Box::new(u) as Box<dyn Resource>))
	}
}

/// Maps resource types to their loaders.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
	loaders: HashMap<String, Arc<dyn ResourceLoader>>,
}

impl LoaderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loaders for `product` and `user`.
	pub fn with_defaults() -> Self {
		Self::new()
			.register("product", Arc::new(ProductLoader))
			.register("user", Arc::new(UserLoader))
	}

	pub fn register(mut self, resource_type: impl Into<String>, loader: Arc<dyn ResourceLoader>) -> Self {
		self.loaders.insert(resource_type.into(), loader);
		self
	}

	pub fn get(&self, resource_type: &str) -> Option<&Arc<dyn ResourceLoader>> {
		self.loaders.get(resource_type)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::Request;

	fn subject() -> Subject {
		Subject {
			id: 1,
			username: "ana".to_string(),
			roles: Vec::new(),
		}
	}

	fn parts(builder: axum::http::request::Builder) -> Parts {
		builder.body(()).unwrap().into_parts().0
	}

	#[test]
	fn forwarded_for_wins_over_peer_address() {
		let mut parts = parts(
			Request::get("/")
				.header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
				.header("user-agent", "curl/8.0"),
		);
		parts
			.extensions
			.insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

		let req = GuardRequest::from_parts(&parts, subject(), HashMap::new());
		assert_eq!(req.actor_ip.as_deref(), Some("203.0.113.9"));
		assert_eq!(req.actor_agent.as_deref(), Some("curl/8.0"));
	}

	#[test]
	fn peer_address_is_the_fallback() {
		let mut parts = parts(Request::get("/"));
		parts
			.extensions
			.insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

		let req = GuardRequest::from_parts(&parts, subject(), HashMap::new());
		assert_eq!(req.actor_ip.as_deref(), Some("127.0.0.1"));
		assert!(req.actor_agent.is_none());
	}

	#[test]
	fn defaults_cover_products_and_users() {
		let registry = LoaderRegistry::with_defaults();
		assert!(registry.get("product").is_some());
		assert!(registry.get("user").is_some());
		assert!(registry.get("catalog").is_none());
	}
}
