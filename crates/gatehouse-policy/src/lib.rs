// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute-Based Access Control policy engine for Gatehouse.
//!
//! Decisions are computed from four inputs: the subject performing a request,
//! the resource it targets, the action it attempts, and environmental facts
//! such as the current hour or the subject's purchase history.
//!
//! # Architecture
//!
//! ```text
//! policy document (YAML)
//!        │  PolicyConfig::load      rules: logical name → RuleId
//!        ▼                          policies: name → [Condition] (OR of ANDs)
//! ┌──────────────┐
//! │ PolicyEngine │──► RuleId::evaluate(subject, resource, environment)
//! └──────┬───────┘            │
//!        │                    └──► attributes::get (map or record, uniformly)
//!        ▼
//!    Decision { allowed, reason }
//! ```
//!
//! The engine is pure: it performs no I/O, holds no mutable state after
//! construction, and always returns a [`Decision`]. Anything it cannot
//! resolve denies.
//!
//! # Example
//!
//! ```
//! use gatehouse_policy::{Environment, PolicyConfig, PolicyEngine};
//! use serde_json::json;
//!
//! let config = PolicyConfig::from_yaml_str(
//! 	r#"
//! rules:
//!   admin: is_admin
//!   owner: is_owner
//! policies:
//!   delete_product: [admin, [owner]]
//! "#,
//! )
//! .unwrap();
//! let engine = PolicyEngine::new(config);
//!
//! let subject = json!({ "id": 2, "roles": [] });
//! let resource = json!({ "id": 1, "owner_id": 2, "type": "product" });
//! let decision = engine.evaluate("delete_product", &subject, &resource, &Environment::new());
//! assert!(decision.allowed);
//! ```

pub mod attributes;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;

pub use attributes::{get, truthy, AttrMap, AttrValue, Attributes, Environment};
pub use config::{Condition, PolicyConfig, PolicyDocument};
pub use engine::{reason, Decision, EvaluationContext, PolicyEngine};
pub use error::PolicyLoadError;
pub use rules::{can_assign_roles, RuleFn, RuleId, UnknownRuleId};
