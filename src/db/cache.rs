// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline profile cache.
//!
//! Profiles read from the backing store are remembered locally and served
//! when the store cannot be reached. With a cache directory the entries are
//! also snapshotted to disk; the directory is claimed through an OS lock on
//! `profiles.lock` so only one process uses it at a time. The OS drops the
//! lock when the process exits, however it exits.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{ProfileMerge, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const LOCK_FILE: &str = "profiles.lock";
const SNAPSHOT_FILE: &str = "profiles.json";

/// Reasons the cache could not be enabled.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache directory is locked by another process: {0}")]
    Locked(PathBuf),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Locked lock file plus snapshot location. Closing the file releases the
/// lock; the file itself stays on disk.
struct Persistence {
    _lock_file: File,
    snapshot_path: PathBuf,
    write_lock: Mutex<()>,
}

pub struct OfflineCache {
    entries: DashMap<String, UserProfile>,
    persistence: Option<Persistence>,
}

impl OfflineCache {
    /// Cache without disk persistence.
    pub fn in_memory() -> Self {
        Self {
            entries: DashMap::new(),
            persistence: None,
        }
    }

    /// Claim `dir` and load any previous snapshot from it.
    pub fn enable(dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir)?;

        let lock_path = dir.join(LOCK_FILE);
        let mut lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        // A lock file left by a process that died is not locked by anyone.
        match lock.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(CacheError::Locked(lock_path)),
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }

        // Diagnostic only; ownership is the OS lock.
        lock.set_len(0)?;
        writeln!(lock, "{}", std::process::id())?;

        // From here on, an early return drops `persistence` and frees the lock.
        let persistence = Persistence {
            _lock_file: lock,
            snapshot_path: dir.join(SNAPSHOT_FILE),
            write_lock: Mutex::new(()),
        };

        let stored: HashMap<String, UserProfile> = match std::fs::read(&persistence.snapshot_path)
        {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            dir = %dir.display(),
            entries = stored.len(),
            "Offline profile cache enabled"
        );

        Ok(Self {
            entries: stored.into_iter().collect(),
            persistence: Some(persistence),
        })
    }

    pub fn get(&self, uid: &str) -> Option<UserProfile> {
        self.entries.get(uid).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn record(&self, uid: &str, profile: UserProfile) {
        if self.entries.get(uid).is_some_and(|cached| *cached == profile) {
            return;
        }
        self.entries.insert(uid.to_string(), profile);
        self.persist().await;
    }

    async fn forget(&self, uid: &str) {
        if self.entries.remove(uid).is_some() {
            self.persist().await;
        }
    }

    async fn apply_merge(&self, uid: &str, merge: &ProfileMerge) {
        {
            let mut profile = self.entries.entry(uid.to_string()).or_default();
            profile.uid = merge.uid.clone();
            profile.email = merge.email.clone();
            profile.display_name = merge.display_name.clone();
            profile.photo_url = merge.photo_url.clone();
            profile.role = Some(merge.role.as_str().to_string());
            profile.department = Some(merge.department.clone());
            profile.courses = merge.courses.clone();
            profile.auth_providers = merge.auth_providers.clone();
            profile.created_at = Some(merge.created_at.clone());
            profile.updated_at = Some(merge.updated_at.clone());
            profile.profile_complete = merge.profile_complete;
        }
        self.persist().await;
    }

    /// Write the snapshot. Failures only cost durability, so they are logged.
    async fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let _guard = persistence.write_lock.lock().await;

        let snapshot: HashMap<String, UserProfile> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let bytes = match serde_json::to_vec(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cache snapshot");
                return;
            }
        };

        let tmp_path = persistence.snapshot_path.with_extension("json.tmp");
        let result = async {
            tokio::fs::write(&tmp_path, &bytes).await?;
            tokio::fs::rename(&tmp_path, &persistence.snapshot_path).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write cache snapshot");
        }
    }
}

/// [`ProfileStore`] wrapper that falls back to the offline cache on reads.
pub struct CachedProfileStore<S> {
    inner: S,
    cache: OfflineCache,
}

impl<S: ProfileStore> CachedProfileStore<S> {
    pub fn new(inner: S, cache: OfflineCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &OfflineCache {
        &self.cache
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileStore for CachedProfileStore<S> {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        match self.inner.get_profile(uid).await {
            Ok(Some(profile)) => {
                self.cache.record(uid, profile.clone()).await;
                Ok(Some(profile))
            }
            Ok(None) => {
                self.cache.forget(uid).await;
                Ok(None)
            }
            Err(e) => match self.cache.get(uid) {
                Some(profile) => {
                    tracing::warn!(uid, error = %e, "Profile read failed, serving cached copy");
                    Ok(Some(profile))
                }
                None => Err(e),
            },
        }
    }

    async fn merge_profile(&self, uid: &str, merge: &ProfileMerge) -> Result<(), AppError> {
        self.inner.merge_profile(uid, merge).await?;
        self.cache.apply_merge(uid, merge).await;
        Ok(())
    }
}
