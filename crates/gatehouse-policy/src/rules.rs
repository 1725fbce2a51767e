// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The rule registry.
//!
//! Every predicate a policy document may reference is a variant of [`RuleId`].
//! Documents name rules by their snake_case identifier; identifiers are
//! resolved once when the document is loaded, so an unknown identifier is a
//! configuration error rather than a request-time surprise.
//!
//! | identifier         | true when                                             |
//! |--------------------|-------------------------------------------------------|
//! | `is_admin`         | the subject holds a role named `admin`                |
//! | `is_owner`         | `subject.id == resource.owner_id`                     |
//! | `in_working_hours` | `8 <= environment.hour < 23`                          |
//! | `is_public`        | `resource.is_public`                                  |
//! | `has_purchased`    | `resource.id` is in `environment.purchased_ids`       |
//! | `is_self`          | `subject.id == resource.id`                           |
//! | `is_admin_or_self` | `is_admin` or `is_self`                               |
//! | `anyone`           | always                                                |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{get, get_present, truthy, Attributes, Environment};

/// Signature shared by every rule predicate.
pub type RuleFn = fn(&dyn Attributes, &dyn Attributes, &Environment) -> bool;

const ADMIN_ROLE: &str = "admin";
const WORKING_HOURS_START: i64 = 8;
const WORKING_HOURS_END: i64 = 23;

/// Identifier of a registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
	IsAdmin,
	IsOwner,
	InWorkingHours,
	IsPublic,
	HasPurchased,
	IsSelf,
	IsAdminOrSelf,
	/// Intentionally open; reserve for actions anybody may perform.
	Anyone,
}

impl RuleId {
	pub const ALL: [RuleId; 8] = [
		RuleId::IsAdmin,
		RuleId::IsOwner,
		RuleId::InWorkingHours,
		RuleId::IsPublic,
		RuleId::HasPurchased,
		RuleId::IsSelf,
		RuleId::IsAdminOrSelf,
		RuleId::Anyone,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			RuleId::IsAdmin => "is_admin",
			RuleId::IsOwner => "is_owner",
			RuleId::InWorkingHours => "in_working_hours",
			RuleId::IsPublic => "is_public",
			RuleId::HasPurchased => "has_purchased",
			RuleId::IsSelf => "is_self",
			RuleId::IsAdminOrSelf => "is_admin_or_self",
			RuleId::Anyone => "anyone",
		}
	}

	/// Looks up a registered rule by identifier.
	pub fn lookup(id: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|rule| rule.as_str() == id)
	}

	/// The predicate implementing this rule.
	pub fn predicate(self) -> RuleFn {
		match self {
			RuleId::IsAdmin => is_admin,
			RuleId::IsOwner => is_owner,
			RuleId::InWorkingHours => in_working_hours,
			RuleId::IsPublic => is_public,
			RuleId::HasPurchased => has_purchased,
			RuleId::IsSelf => is_self,
			RuleId::IsAdminOrSelf => is_admin_or_self,
			RuleId::Anyone => anyone,
		}
	}

	pub fn evaluate(
		self,
		subject: &dyn Attributes,
		resource: &dyn Attributes,
		environment: &Environment,
	) -> bool {
		(self.predicate())(subject, resource, environment)
	}
}

impl fmt::Display for RuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule '{0}' is not registered")]
pub struct UnknownRuleId(pub String);

impl FromStr for RuleId {
	type Err = UnknownRuleId;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::lookup(s).ok_or_else(|| UnknownRuleId(s.to_string()))
	}
}

/// Roles may be plain names or role records exposing a `title`.
fn role_title(role: &Value) -> Option<&str> {
	match role {
		Value::String(name) => Some(name),
		Value::Object(record) => record.get("title").and_then(Value::as_str),
		_ => None,
	}
}

fn is_admin(subject: &dyn Attributes, _resource: &dyn Attributes, _env: &Environment) -> bool {
	match subject.attr("roles") {
		Some(Value::Array(roles)) => roles
			.iter()
			.any(|role| role_title(role) == Some(ADMIN_ROLE)),
		_ => false,
	}
}

/// Both sides must carry a non-null id; two missing ids are not a match.
fn same_id(left: &dyn Attributes, left_key: &str, right: &dyn Attributes, right_key: &str) -> bool {
	match (get_present(left, left_key), get_present(right, right_key)) {
		(Some(a), Some(b)) => a == b,
		_ => false,
	}
}

fn is_owner(subject: &dyn Attributes, resource: &dyn Attributes, _env: &Environment) -> bool {
	same_id(subject, "id", resource, "owner_id")
}

fn in_working_hours(_subject: &dyn Attributes, _resource: &dyn Attributes, env: &Environment) -> bool {
	(WORKING_HOURS_START..WORKING_HOURS_END).contains(&env.hour())
}

fn is_public(_subject: &dyn Attributes, resource: &dyn Attributes, _env: &Environment) -> bool {
	truthy(&get(resource, "is_public", Value::Bool(false)))
}

fn has_purchased(_subject: &dyn Attributes, resource: &dyn Attributes, env: &Environment) -> bool {
	get_present(resource, "id")
		.map(|id| env.has_purchased(&id))
		.unwrap_or(false)
}

fn is_self(subject: &dyn Attributes, resource: &dyn Attributes, _env: &Environment) -> bool {
	same_id(subject, "id", resource, "id")
}

fn is_admin_or_self(subject: &dyn Attributes, resource: &dyn Attributes, env: &Environment) -> bool {
	is_admin(subject, resource, env) || is_self(subject, resource, env)
}

fn anyone(_subject: &dyn Attributes, _resource: &dyn Attributes, _env: &Environment) -> bool {
	true
}

const ASSIGNABLE_ROLES: [&str; 2] = ["user", "seller"];

/// Checks the roles a request intends to grant, read from `intended_roles`.
///
/// No intended roles means no constraint. `admin` is never assignable through
/// this path; any other role must be one of the self-service roles.
pub fn can_assign_roles(resource: &dyn Attributes) -> bool {
	let intended: Vec<String> = match resource.attr("intended_roles") {
		Some(Value::Array(roles)) => roles
			.iter()
			.filter_map(role_title)
			.map(str::to_lowercase)
			.collect(),
		_ => Vec::new(),
	};

	if intended.is_empty() {
		return true;
	}
	if intended.iter().any(|role| role == ADMIN_ROLE) {
		return false;
	}
	intended
		.iter()
		.all(|role| ASSIGNABLE_ROLES.contains(&role.as_str()))
}
