// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore profile documents).

pub mod cache;
pub mod firestore;
pub mod memory;

pub use cache::{CacheError, CachedProfileStore, OfflineCache};
pub use firestore::FirestoreDb;
pub use memory::MemoryProfileStore;

use crate::error::AppError;
use crate::models::{ProfileMerge, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Read/merge access to profile documents keyed by uid.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile; `Ok(None)` when no document exists yet.
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;

    /// Merge-write the given fields, creating the document if needed.
    async fn merge_profile(&self, uid: &str, merge: &ProfileMerge) -> Result<(), AppError>;
}
