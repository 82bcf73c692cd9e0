// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod identity;
pub mod user;

pub use identity::{Identity, ProviderInfo};
pub use user::{ProfileMerge, Role, UserProfile, PROFILE_MERGE_FIELDS};
