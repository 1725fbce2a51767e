// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail for authorization decisions.
//!
//! Every evaluated decision becomes an [`AuditRecord`]. The [`AuditHook`]
//! decides which records are persisted (every denial, plus allowed decisions
//! for sensitive policies) and hands them to an [`AuditSink`]. Writing is
//! best-effort: a failing sink is logged and never changes the decision.

pub mod error;
pub mod filter;
pub mod hook;
pub mod record;
pub mod sink;

pub use error::AuditSinkError;
pub use filter::SensitiveActions;
pub use hook::AuditHook;
pub use record::{AuditRecord, AuditRecordBuilder};
pub use sink::{AuditSink, NoopAuditSink};

#[cfg(feature = "sink-sqlite")]
pub use sink::sqlite::SqliteAuditSink;

#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingAuditSink;
