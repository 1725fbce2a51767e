// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Projection of loaded entities into the resource attributes rules read.

use gatehouse_policy::{AttrMap, AttrValue};
use serde_json::json;

use crate::db::{Product, User};

/// A loaded entity that can describe itself to the policy engine.
///
/// Implementations contribute the smallest attribute set their rules need.
/// The `type` attribute is added by [`build_resource_context`].
pub trait Resource: Send + Sync {
	fn id(&self) -> AttrValue;

	fn attributes(&self) -> AttrMap {
		let mut attrs = AttrMap::new();
		attrs.insert("id".to_string(), self.id());
		attrs
	}
}

impl Resource for Product {
	fn id(&self) -> AttrValue {
		json!(self.id)
	}

	fn attributes(&self) -> AttrMap {
		let mut attrs = AttrMap::new();
		attrs.insert("id".to_string(), json!(self.id));
		attrs.insert("owner_id".to_string(), json!(self.owner_id));
		attrs.insert("is_public".to_string(), json!(self.is_public));
		attrs
	}
}

impl Resource for User {
	fn id(&self) -> AttrValue {
		json!(self.id)
	}

	fn attributes(&self) -> AttrMap {
		let mut attrs = AttrMap::new();
		attrs.insert("id".to_string(), json!(self.id));
		attrs.insert("username".to_string(), json!(self.username));
		attrs
	}
}

/// Builds the resource context handed to the evaluator.
///
/// Without a loaded entity the context is `{id: null, type}`.
pub fn build_resource_context(resource_type: &str, resource: Option<&dyn Resource>) -> AttrMap {
	let mut attrs = match resource {
		Some(resource) => resource.attributes(),
		None => {
			let mut attrs = AttrMap::new();
			attrs.insert("id".to_string(), AttrValue::Null);
			attrs
		}
	};
	attrs.insert("type".to_string(), json!(resource_type));
	attrs
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::Value;

	struct Invoice(i64);

	impl Resource for Invoice {
		fn id(&self) -> AttrValue {
			json!(self.0)
		}
	}

	#[test]
	fn product_context_carries_ownership() {
		let product = Product {
			id: 1,
			name: "Atlas".to_string(),
			description: None,
			price: 12.5,
			owner_id: 2,
			is_public: false,
		};
		let ctx = build_resource_context("product", Some(&product));
		assert_eq!(
			Value::Object(ctx),
			json!({ "id": 1, "owner_id": 2, "is_public": false, "type": "product" })
		);
	}

	#[test]
	fn user_context_carries_username_only() {
		let user = User {
			id: 3,
			username: "sam".to_string(),
			email: "sam@example.com".to_string(),
			roles: vec!["admin".to_string()],
		};
		let ctx = build_resource_context("user", Some(&user));
		assert_eq!(
			Value::Object(ctx),
			json!({ "id": 3, "username": "sam", "type": "user" })
		);
	}

	#[test]
	fn other_types_fall_back_to_id_and_type() {
		let ctx = build_resource_context("invoice", Some(&Invoice(9)));
		assert_eq!(Value::Object(ctx), json!({ "id": 9, "type": "invoice" }));
	}

	#[test]
	fn missing_entity_has_null_id() {
		let ctx = build_resource_context("catalog", None);
		assert_eq!(Value::Object(ctx), json!({ "id": null, "type": "catalog" }));
	}

	proptest! {
		#[test]
		fn type_always_names_the_resource_type(resource_type in "[a-z]{1,12}", id in any::<i64>()) {
			let with = build_resource_context(&resource_type, Some(&Invoice(id)));
			let without = build_resource_context(&resource_type, None);
			prop_assert_eq!(with.get("type"), Some(&json!(resource_type)));
			prop_assert_eq!(without.get("type"), Some(&json!(resource_type)));
			prop_assert_eq!(with.get("id"), Some(&json!(id)));
		}
	}
}
