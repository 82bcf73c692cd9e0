// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding form state and the profile save.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{ProfileMerge, Role};
use crate::services::routing::Route;
use crate::services::session::Session;
use crate::time_utils::now_rfc3339;

/// Prompt shown when role or department is missing.
pub const VALIDATION_PROMPT: &str = "Please choose a role and department.";
/// Notice shown when the profile write fails.
pub const SAVE_FAILED_NOTICE: &str = "Failed to save profile. Try again.";

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("{}", VALIDATION_PROMPT)]
    MissingFields,

    #[error("{}", SAVE_FAILED_NOTICE)]
    SaveFailed(#[source] AppError),
}

impl From<OnboardingError> for AppError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::MissingFields => AppError::BadRequest(VALIDATION_PROMPT.to_string()),
            OnboardingError::SaveFailed(source) => {
                tracing::error!(error = %source, "Failed saving profile");
                AppError::SaveFailed(SAVE_FAILED_NOTICE.to_string())
            }
        }
    }
}

/// Editable onboarding state for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingForm {
    role: Option<Role>,
    department: String,
    courses: Vec<String>,
    course_input: String,
    saving: bool,
}

impl Default for OnboardingForm {
    fn default() -> Self {
        Self {
            role: Some(Role::Student),
            department: String::new(),
            courses: Vec::new(),
            course_input: String::new(),
            saving: false,
        }
    }
}

impl OnboardingForm {
    /// Form prefilled from the session's cached profile, if any.
    pub fn from_session(session: &Session) -> Self {
        let mut form = Self::default();
        if let Some(profile) = session.profile() {
            form.department = profile.department.clone().unwrap_or_default();
            form.courses = profile.courses.clone();
            if let Some(role) = profile.role() {
                form.role = Some(role);
            }
        }
        form
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    pub fn course_input(&self) -> &str {
        &self.course_input
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn set_role(&mut self, role: Option<Role>) {
        self.role = role;
    }

    pub fn set_department(&mut self, department: impl Into<String>) {
        self.department = department.into();
    }

    pub fn set_course_input(&mut self, input: impl Into<String>) {
        self.course_input = input.into();
    }

    /// Add the trimmed course input. The input is cleared only when a new
    /// course was actually added.
    pub fn add_course_from_input(&mut self) -> bool {
        let course = self.course_input.trim().to_string();
        if self.add_course(&course) {
            self.course_input.clear();
            true
        } else {
            false
        }
    }

    /// Add a course unless it is empty or already listed (exact match).
    pub fn add_course(&mut self, course: &str) -> bool {
        if course.is_empty() || self.courses.iter().any(|c| c == course) {
            return false;
        }
        self.courses.push(course.to_string());
        true
    }

    /// Remove a course; no-op when it is not listed.
    pub fn remove_course(&mut self, course: &str) -> bool {
        let before = self.courses.len();
        self.courses.retain(|c| c != course);
        self.courses.len() != before
    }

    /// Build the merge payload for `session`'s identity.
    pub fn build_merge(&self, session: &Session) -> Result<ProfileMerge, OnboardingError> {
        let role = self.role.ok_or(OnboardingError::MissingFields)?;
        if self.department.is_empty() {
            return Err(OnboardingError::MissingFields);
        }

        let identity = session.identity();
        let now = now_rfc3339();
        Ok(ProfileMerge {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            role,
            department: self.department.clone(),
            courses: self.courses.clone(),
            auth_providers: identity.auth_providers(),
            created_at: now.clone(),
            updated_at: now,
            profile_complete: true,
        })
    }

    /// Validate, merge-write the profile, reload the session and return the
    /// role's landing route.
    ///
    /// A missing role or department never reaches the store. Form fields are
    /// never modified, and `saving` is cleared on every exit path.
    pub async fn save(
        &mut self,
        session: &mut Session,
        store: &dyn ProfileStore,
    ) -> Result<Route, OnboardingError> {
        let merge = self.build_merge(session)?;
        let role = merge.role;

        let _saving = SavingFlag::raise(&mut self.saving);

        store
            .merge_profile(&merge.uid, &merge)
            .await
            .map_err(OnboardingError::SaveFailed)?;

        tracing::info!(
            uid = %merge.uid,
            role = %role,
            courses = merge.courses.len(),
            "Onboarding profile saved"
        );

        if let Err(e) = session.refresh(store).await {
            tracing::warn!(error = %e, "Profile refresh failed after onboarding save");
        }

        Ok(role.into())
    }
}

/// Holds `saving` high until dropped.
struct SavingFlag<'a>(&'a mut bool);

impl<'a> SavingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for SavingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
