// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a partial `*ConfigLayer` for merging and a
//! resolved `*Config`.

mod audit;
mod database;
mod http;
mod logging;
mod policy;

pub use audit::{AuditConfig, AuditConfigLayer, AuditSinkKind};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use policy::{PolicySourceConfig, PolicySourceConfigLayer};
