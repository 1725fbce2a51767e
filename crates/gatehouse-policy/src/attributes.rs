// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Uniform attribute access for subjects, resources and environments.
//!
//! Subjects and resources reach the engine in two shapes: loosely typed maps
//! (request-built contexts, fixtures) and structured records (persisted
//! entities). Both implement [`Attributes`], so rule code reads them the same
//! way through [`get`] and never inspects which shape it was handed.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single attribute value.
pub type AttrValue = Value;

/// A loosely typed attribute map.
pub type AttrMap = serde_json::Map<String, AttrValue>;

/// Read access to named attributes.
///
/// Implementations return `None` for attributes they do not carry; they never
/// fail.
pub trait Attributes: Send + Sync {
	fn attr(&self, name: &str) -> Option<AttrValue>;
}

impl Attributes for AttrMap {
	fn attr(&self, name: &str) -> Option<AttrValue> {
		self.get(name).cloned()
	}
}

impl Attributes for HashMap<String, AttrValue> {
	fn attr(&self, name: &str) -> Option<AttrValue> {
		self.get(name).cloned()
	}
}

/// Only JSON objects carry attributes; any other value reads as empty.
impl Attributes for Value {
	fn attr(&self, name: &str) -> Option<AttrValue> {
		self.as_object().and_then(|map| map.get(name).cloned())
	}
}

impl<T: Attributes + ?Sized> Attributes for &T {
	fn attr(&self, name: &str) -> Option<AttrValue> {
		(**self).attr(name)
	}
}

/// Returns the named attribute, or `default` when the entity does not carry it.
pub fn get(entity: &dyn Attributes, name: &str, default: AttrValue) -> AttrValue {
	entity.attr(name).unwrap_or(default)
}

/// Returns the named attribute only when it is present and not null.
pub fn get_present(entity: &dyn Attributes, name: &str) -> Option<AttrValue> {
	entity.attr(name).filter(|value| !value.is_null())
}

/// Boolean interpretation of an attribute value.
///
/// Null, `false`, zero and empty strings or collections are false; everything
/// else is true.
pub fn truthy(value: &AttrValue) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
		Value::String(s) => !s.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

/// Environmental facts gathered for a single authorization check.
///
/// The engine relies on two facts: `hour` (hour of day, UTC) and
/// `purchased_ids` (ids of resources the subject has acquired). Absent facts
/// read as `0` and the empty set respectively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
	facts: AttrMap,
}

impl Environment {
	pub const HOUR: &'static str = "hour";
	pub const PURCHASED_IDS: &'static str = "purchased_ids";

	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: set the hour-of-day fact.
	pub fn with_hour(self, hour: u32) -> Self {
		self.with_fact(Self::HOUR, hour)
	}

	/// Builder: set the purchased resource ids fact.
	///
	/// Ids are stored deduplicated and in ascending order.
	pub fn with_purchased_ids<I>(self, ids: I) -> Self
	where
		I: IntoIterator<Item = i64>,
	{
		let ids: BTreeSet<i64> = ids.into_iter().collect();
		self.with_fact(
			Self::PURCHASED_IDS,
			Value::Array(ids.into_iter().map(Value::from).collect()),
		)
	}

	/// Builder: set an arbitrary fact.
	pub fn with_fact(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.facts.insert(name.into(), value.into());
		self
	}

	/// Hour of day, or `0` when the fact is absent or not an integer.
	pub fn hour(&self) -> i64 {
		self
			.facts
			.get(Self::HOUR)
			.and_then(Value::as_i64)
			.unwrap_or(0)
	}

	/// Returns true if `id` is among the purchased resource ids.
	pub fn has_purchased(&self, id: &AttrValue) -> bool {
		match self.facts.get(Self::PURCHASED_IDS) {
			Some(Value::Array(ids)) => ids.contains(id),
			_ => false,
		}
	}
}

impl Attributes for Environment {
	fn attr(&self, name: &str) -> Option<AttrValue> {
		self.facts.get(name).cloned()
	}
}
