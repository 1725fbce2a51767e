// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject resolution.
//!
//! Credentials are verified by the gateway in front of this server, which
//! forwards the authenticated account id in [`USER_ID_HEADER`]. This layer turns
//! that id into a [`Subject`] and attaches an [`AuthContext`] to the request.
//! It never rejects: the authorization guard answers 401 when no subject is
//! present.

use axum::{
	extract::{Request, State},
	middleware::Next,
	response::Response,
};
use gatehouse_policy::{AttrValue, Attributes};
use serde::Serialize;
use serde_json::json;

use crate::api::AppState;
use crate::db::User;

/// Header carrying the authenticated account id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting account as the policy engine sees it.
///
/// Roles are exposed as records with a `title`, the shape role-based rules
/// read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
	pub id: i64,
	pub username: String,
	pub roles: Vec<String>,
}

impl From<User> for Subject {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			username: user.username,
			roles: user.roles,
		}
	}
}

impl Attributes for Subject {
	fn attr(&self, name: &str) -> Option<AttrValue> {
		match name {
			"id" => Some(json!(self.id)),
			"username" => Some(json!(self.username)),
			"roles" => Some(AttrValue::Array(
				self.roles.iter().map(|title| json!({ "title": title })).collect(),
			)),
			_ => None,
		}
	}
}

/// Authentication state carried in request extensions.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
	pub subject: Option<Subject>,
}

impl AuthContext {
	pub fn unauthenticated() -> Self {
		Self { subject: None }
	}

	pub fn authenticated(subject: Subject) -> Self {
		Self {
			subject: Some(subject),
		}
	}
}

/// Resolves the subject named by [`USER_ID_HEADER`] and stores an
/// [`AuthContext`] in the request extensions.
///
/// Unknown ids, malformed headers and lookup failures all leave the request
/// unauthenticated.
pub async fn auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
	let user_id = req
		.headers()
		.get(USER_ID_HEADER)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.trim().parse::<i64>().ok());

	let ctx = match user_id {
		Some(id) => match state.users.find(id).await {
			Ok(Some(user)) => AuthContext::authenticated(Subject::from(user)),
			Ok(None) => {
				tracing::debug!(user_id = id, "unknown subject");
				AuthContext::unauthenticated()
			}
			Err(e) => {
				tracing::error!(user_id = id, error = %e, "subject lookup failed");
				AuthContext::unauthenticated()
			}
		},
		None => AuthContext::unauthenticated(),
	};

	req.extensions_mut().insert(ctx);
	next.run(req).await
}
