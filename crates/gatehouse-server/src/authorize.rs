// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route-level ABAC guard.
//!
//! [`Authorizer::authorize`] returns a Tower layer bound to an
//! `(action, resource_type)` pair. For each request the guarded route receives,
//! the layer:
//!
//! 1. reads `{resource_type}_id` from the matched path parameters,
//! 2. loads the resource through the registered loader (a missing entity is a
//!    404, an unregistered type skips loading),
//! 3. projects the entity into its resource context,
//! 4. gathers environment facts for the subject,
//! 5. evaluates `{action}_{resource_type}` against the policy document,
//! 6. hands the decision to the audit hook,
//! 7. answers 403 on denial or calls the route handler on allow.
//!
//! # Security Properties
//!
//! - Requests without a resolved subject are rejected with 401 before any
//!   policy work
//! - Storage failures while loading or gathering facts deny with
//!   `context_unavailable`; they never let the request through
//! - Audit failures never affect the outcome
//! - The storage connection is released before the audit write and before
//!   the handler runs
//!
//! # Example
//!
//! ```ignore
//! let authz = Arc::new(Authorizer::new(engine, pool));
//! Router::new().route(
//!     "/api/v1/products/{product_id}",
//!     delete(delete_product).route_layer(authz.authorize("delete", "product")),
//! );
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
	body::Body,
	extract::{FromRequestParts, RawPathParams},
	http::{Request, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use futures::future::BoxFuture;
use gatehouse_audit::{AuditHook, AuditRecord};
use gatehouse_policy::{AttrValue, Decision, EvaluationContext, PolicyEngine};
use sqlx::SqlitePool;
use tower::{Layer, Service};
use tracing::{debug, error, instrument};

use crate::auth::AuthContext;
use crate::context::build_resource_context;
use crate::environment::{EnvironmentProvider, OrderHistoryEnvironment};
use crate::error::ErrorResponse;
use crate::loaders::{GuardRequest, LoaderRegistry};

/// Reason reported when the decision could not be computed.
pub const CONTEXT_UNAVAILABLE: &str = "context_unavailable";

/// Outcome of a guard that did not let the request through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
	#[error("authentication required")]
	Unauthenticated,

	#[error("{resource_type} not found")]
	ResourceNotFound {
		resource_type: String,
		resource_id: Option<String>,
	},

	#[error("Access denied for '{action}' on '{resource_type}': {reason}")]
	Denied {
		action: String,
		resource_type: String,
		reason: String,
	},

	#[error("Access denied for '{action}' on '{resource_type}': context_unavailable")]
	ContextUnavailable { action: String, resource_type: String },
}

impl AuthzError {
	pub fn status(&self) -> StatusCode {
		match self {
			AuthzError::Unauthenticated => StatusCode::UNAUTHORIZED,
			AuthzError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
			AuthzError::Denied { .. } | AuthzError::ContextUnavailable { .. } => StatusCode::FORBIDDEN,
		}
	}

	fn forbidden_body(&self, action: &str, resource_type: &str, reason: &str) -> ErrorResponse {
		ErrorResponse {
			error: "forbidden".to_string(),
			message: self.to_string(),
			action: Some(action.to_string()),
			resource_type: Some(resource_type.to_string()),
			reason: Some(reason.to_string()),
		}
	}
}

impl IntoResponse for AuthzError {
	fn into_response(self) -> Response {
		let body = match &self {
			AuthzError::Unauthenticated => {
				ErrorResponse::new("unauthorized", "Authentication required")
			}
			AuthzError::ResourceNotFound { resource_type, .. } => {
				ErrorResponse::new("not_found", format!("{} not found.", capitalize(resource_type)))
			}
			AuthzError::Denied {
				action,
				resource_type,
				reason,
			} => self.forbidden_body(action, resource_type, reason),
			AuthzError::ContextUnavailable {
				action,
				resource_type,
			} => self.forbidden_body(action, resource_type, CONTEXT_UNAVAILABLE),
		};
		(self.status(), Json(body)).into_response()
	}
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

fn attr_to_id(value: &AttrValue) -> Option<String> {
	match value {
		AttrValue::Null => None,
		AttrValue::String(s) => Some(s.clone()),
		other => Some(other.to_string()),
	}
}

/// Everything a guard needs to reach a decision. Immutable once built and
/// shared by all guarded routes.
pub struct Authorizer {
	engine: PolicyEngine,
	loaders: LoaderRegistry,
	environment: Arc<dyn EnvironmentProvider>,
	audit: AuditHook,
	pool: SqlitePool,
}

impl Authorizer {
	/// Default loaders, order-history environment and no audit persistence.
	pub fn new(engine: PolicyEngine, pool: SqlitePool) -> Self {
		Self {
			engine,
			loaders: LoaderRegistry::with_defaults(),
			environment: Arc::new(OrderHistoryEnvironment::new()),
			audit: AuditHook::disabled(),
			pool,
		}
	}

	pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
		self.loaders = loaders;
		self
	}

	pub fn with_environment(mut self, environment: Arc<dyn EnvironmentProvider>) -> Self {
		self.environment = environment;
		self
	}

	pub fn with_audit(mut self, audit: AuditHook) -> Self {
		self.audit = audit;
		self
	}

	pub fn engine(&self) -> &PolicyEngine {
		&self.engine
	}

	/// Guard layer for `action` on `resource_type`.
	pub fn authorize(
		self: &Arc<Self>,
		action: impl Into<String>,
		resource_type: impl Into<String>,
	) -> RequireAccess {
		RequireAccess {
			authorizer: Arc::clone(self),
			action: action.into(),
			resource_type: resource_type.into(),
		}
	}

	/// Runs the full guard sequence for one request.
	///
	/// Returns the allowing decision, or the error the request must be
	/// answered with.
	#[instrument(
		skip(self, request),
		fields(subject_id = request.subject.id)
	)]
	pub async fn check(
		&self,
		action: &str,
		resource_type: &str,
		request: &GuardRequest,
	) -> Result<Decision, AuthzError> {
		let unavailable = || AuthzError::ContextUnavailable {
			action: action.to_string(),
			resource_type: resource_type.to_string(),
		};

		let id_key = format!("{resource_type}_id");
		let resource_id = request.path_param(&id_key);

		let mut conn = self.pool.acquire().await.map_err(|e| {
			error!(error = %e, "failed to acquire storage connection");
			unavailable()
		})?;

		let resource = match self.loaders.get(resource_type) {
			Some(loader) => match loader.load(request, &mut conn, resource_id).await {
				Ok(Some(resource)) => Some(resource),
				Ok(None) => {
					debug!(resource_id, "resource not found");
					return Err(AuthzError::ResourceNotFound {
						resource_type: resource_type.to_string(),
						resource_id: resource_id.map(str::to_string),
					});
				}
				Err(e) => {
					error!(error = %e, "resource load failed");
					return Err(unavailable());
				}
			},
			None => None,
		};

		let resource_context = build_resource_context(resource_type, resource.as_deref());

		let environment = self
			.environment
			.gather(&mut conn, &request.subject)
			.await
			.map_err(|e| {
				error!(error = %e, "environment facts unavailable");
				unavailable()
			})?;

		drop(conn);

		let context = EvaluationContext {
			subject: &request.subject,
			resource: &resource_context,
			action,
			environment: &environment,
		};
		let decision = self.engine.check_access(&context);

		let mut record = AuditRecord::builder(action, resource_type)
			.subject(request.subject.id.to_string())
			.policy(context.policy_name())
			.decision(&decision)
			.actor_ip(request.actor_ip.clone())
			.actor_agent(request.actor_agent.clone());
		let audited_id = resource_context
			.get("id")
			.and_then(attr_to_id)
			.or_else(|| resource_id.map(str::to_string));
		if let Some(id) = audited_id {
			record = record.resource_id(id);
		}
		self.audit.record(record.build()).await;

		if decision.allowed {
			Ok(decision)
		} else {
			Err(AuthzError::Denied {
				action: action.to_string(),
				resource_type: resource_type.to_string(),
				reason: decision.reason,
			})
		}
	}
}

/// Route layer produced by [`Authorizer::authorize`].
#[derive(Clone)]
pub struct RequireAccess {
	authorizer: Arc<Authorizer>,
	action: String,
	resource_type: String,
}

impl<S> Layer<S> for RequireAccess {
	type Service = RequireAccessService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RequireAccessService {
			inner,
			authorizer: Arc::clone(&self.authorizer),
			action: self.action.clone(),
			resource_type: self.resource_type.clone(),
		}
	}
}

/// Service wrapper for [`RequireAccess`].
#[derive(Clone)]
pub struct RequireAccessService<S> {
	inner: S,
	authorizer: Arc<Authorizer>,
	action: String,
	resource_type: String,
}

impl<S> Service<Request<Body>> for RequireAccessService<S>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send,
{
	type Response = Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Response, S::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		// The ready service is taken; the clone stays behind for the next call.
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);
		let authorizer = Arc::clone(&self.authorizer);
		let action = self.action.clone();
		let resource_type = self.resource_type.clone();

		Box::pin(async move {
			let (mut parts, body) = req.into_parts();

			let subject = parts
				.extensions
				.get::<AuthContext>()
				.and_then(|ctx| ctx.subject.clone());
			let Some(subject) = subject else {
				debug!(action = %action, resource_type = %resource_type, "ABAC denied: not authenticated");
				return Ok(AuthzError::Unauthenticated.into_response());
			};

			let path_params: HashMap<String, String> =
				match RawPathParams::from_request_parts(&mut parts, &()).await {
					Ok(params) => params
						.iter()
						.map(|(k, v)| (k.to_string(), v.to_string()))
						.collect(),
					Err(_) => HashMap::new(),
				};

			let request = GuardRequest::from_parts(&parts, subject, path_params);
			if let Err(e) = authorizer.check(&action, &resource_type, &request).await {
				return Ok(e.into_response());
			}

			inner.call(Request::from_parts(parts, body)).await
		})
	}
}
