// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the entities the guard consults.

mod error;
mod migrations;
mod orders;
mod pool;
mod products;
mod users;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use orders::OrderRepository;
pub use pool::create_pool;
pub use products::{Product, ProductRepository};
pub use users::{User, UserRepository};
