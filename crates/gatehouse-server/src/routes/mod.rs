// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route handlers. Authorization happens in the guard layers attached in
//! [`crate::api::create_router`]; handlers only run for allowed requests.

pub mod health;
pub mod products;
pub mod users;
