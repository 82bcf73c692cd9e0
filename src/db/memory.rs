// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process profile store with document merge semantics.
//!
//! Documents are kept as JSON objects so that fields a merge does not
//! mention survive untouched, the same way they would in Firestore.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{ProfileMerge, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

#[derive(Default)]
pub struct MemoryProfileStore {
    docs: DashMap<String, Map<String, Value>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, replacing any existing one.
    pub fn put_raw(&self, uid: &str, doc: Value) -> Result<(), AppError> {
        let Value::Object(map) = doc else {
            return Err(AppError::BadRequest("document must be an object".into()));
        };
        self.docs.insert(uid.to_string(), map);
        Ok(())
    }

    /// Raw document as stored, including fields unknown to [`UserProfile`].
    pub fn raw(&self, uid: &str) -> Option<Value> {
        self.docs.get(uid).map(|doc| Value::Object(doc.clone()))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.raw(uid)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppError::Database(format!("Malformed profile {}: {}", uid, e)))
    }

    async fn merge_profile(&self, uid: &str, merge: &ProfileMerge) -> Result<(), AppError> {
        let Value::Object(fields) = serde_json::to_value(merge)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Serialize merge: {}", e)))?
        else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "merge payload is not an object"
            )));
        };

        let mut doc = self.docs.entry(uid.to_string()).or_default();
        doc.extend(fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn merge_for(uid: &str, department: &str) -> ProfileMerge {
        ProfileMerge {
            uid: uid.to_string(),
            email: Some("a@example.edu".to_string()),
            display_name: None,
            photo_url: None,
            role: Role::Student,
            department: department.to_string(),
            courses: vec!["CS101".to_string()],
            auth_providers: vec!["google".to_string()],
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
            profile_complete: true,
        }
    }

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let store = MemoryProfileStore::new();
        assert_eq!(store.get_profile("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_merge_creates_document() {
        let store = MemoryProfileStore::new();
        store.merge_profile("u1", &merge_for("u1", "CS")).await.unwrap();

        let profile = store.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.role(), Some(Role::Student));
        assert_eq!(profile.department.as_deref(), Some("CS"));
        assert!(profile.profile_complete);
    }

    #[tokio::test]
    async fn test_merge_preserves_unmentioned_fields() {
        let store = MemoryProfileStore::new();
        store
            .put_raw(
                "u1",
                serde_json::json!({ "uid": "u1", "nickname": "ada", "department": "Old" }),
            )
            .unwrap();

        store.merge_profile("u1", &merge_for("u1", "New")).await.unwrap();

        let raw = store.raw("u1").unwrap();
        assert_eq!(raw["nickname"], "ada");
        assert_eq!(raw["department"], "New");
        assert_eq!(store.len(), 1);
    }
}
