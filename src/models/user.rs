// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Role a user picks during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    /// Normalize a role string read back from a profile document.
    ///
    /// Empty or absent means no role. `"teacher"` is the only value that
    /// maps to [`Role::Teacher`]; every other non-empty value is treated as
    /// a student.
    pub fn from_stored(raw: Option<&str>) -> Option<Role> {
        match raw {
            None | Some("") => None,
            Some("teacher") => Some(Role::Teacher),
            Some(_) => Some(Role::Student),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse, used for user input.
impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

/// User profile stored in Firestore (`users/{uid}`).
///
/// Every field is optional on read: documents may be partially written by
/// other tools, and a profile without a role is a valid (if stuck) state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity key (also used as document ID)
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Raw stored role; use [`UserProfile::role`] for the normalized value
    pub role: Option<String>,
    pub department: Option<String>,
    pub courses: Vec<String>,
    /// Provider ids with the `.com` suffix stripped (e.g. `google`)
    pub auth_providers: Vec<String>,
    pub profile_complete: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Normalized role, `None` when the stored role is empty or missing.
    pub fn role(&self) -> Option<Role> {
        Role::from_stored(self.role.as_deref())
    }
}

/// Field paths written by an onboarding save. Anything else already in the
/// document is left untouched.
pub const PROFILE_MERGE_FIELDS: [&str; 11] = [
    "uid",
    "email",
    "displayName",
    "photoURL",
    "role",
    "department",
    "courses",
    "authProviders",
    "createdAt",
    "updatedAt",
    "profileComplete",
];

/// Payload of one onboarding merge write.
///
/// `created_at` is stamped on every save, not only the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMerge {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: Role,
    pub department: String,
    pub courses: Vec<String>,
    pub auth_providers: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub profile_complete: bool,
}
