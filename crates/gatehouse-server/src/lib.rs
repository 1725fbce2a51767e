// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gatehouse HTTP server.
//!
//! Wires the policy engine into axum: subject resolution, per-route
//! authorization guards, resource loaders backed by SQLite, the order-history
//! environment provider and the audit hook.

pub mod api;
pub mod auth;
pub mod authorize;
pub mod cli;
pub mod context;
pub mod db;
pub mod environment;
pub mod error;
pub mod loaders;
pub mod routes;

pub use api::{create_app_state, create_audit_hook, create_router, AppState};
pub use auth::{AuthContext, Subject, USER_ID_HEADER};
pub use authorize::{AuthzError, Authorizer, RequireAccess, CONTEXT_UNAVAILABLE};
pub use cli::{check_policy, CheckPolicyError};
pub use context::{build_resource_context, Resource};
pub use environment::{EnvironmentProvider, OrderHistoryEnvironment};
pub use error::{ErrorResponse, ServerError};
pub use gatehouse_server_config::ServerConfig;
pub use loaders::{GuardRequest, LoaderRegistry, ProductLoader, ResourceLoader, UserLoader};
