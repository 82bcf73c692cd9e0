// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Identity, Role, UserProfile};
use crate::services::{resolve_post_auth_destination, OnboardingForm, Session};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Longest course name accepted, in characters.
const MAX_COURSE_LEN: usize = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/onboarding", get(get_onboarding).post(save_onboarding))
        .route("/api/student", get(student_landing))
        .route("/api/teacher", get(teacher_landing))
}

/// Session reloaded from the profile store.
async fn load_session(state: &AppState, identity: Identity) -> Result<Session> {
    let mut session = Session::new(identity);
    session.refresh(state.backend.profiles.as_ref()).await?;
    Ok(session)
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub profile: Option<UserProfile>,
    pub onboarding_required: bool,
    /// Where the frontend should go; `None` means stay on the current page
    pub destination: Option<String>,
}

/// Reload and return the current user's profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let session = load_session(&state, user.identity).await?;
    let destination = resolve_post_auth_destination(session.profile())
        .route()
        .map(|route| route.path().to_string());

    Ok(Json(ProfileResponse {
        onboarding_required: session.onboarding_required(),
        destination,
        profile: session.into_parts().1,
    }))
}

// ─── Onboarding ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingFormResponse {
    pub role: Option<Role>,
    pub department: String,
    pub courses: Vec<String>,
}

/// Onboarding form prefilled from any stored profile.
async fn get_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<OnboardingFormResponse> {
    let mut session = Session::new(user.identity);
    if let Err(e) = session.refresh(state.backend.profiles.as_ref()).await {
        tracing::warn!(error = %e, "Profile reload failed, serving empty onboarding form");
    }

    let form = OnboardingForm::from_session(&session);
    Json(OnboardingFormResponse {
        role: form.role(),
        department: form.department().to_string(),
        courses: form.courses().to_vec(),
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct OnboardingRequest {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub department: String,
    #[serde(default)]
    #[validate(length(max = 100), custom(function = "validate_course_names"))]
    pub courses: Vec<String>,
}

fn validate_course_names(courses: &[String]) -> std::result::Result<(), ValidationError> {
    if courses
        .iter()
        .any(|course| course.trim().chars().count() > MAX_COURSE_LEN)
    {
        let mut err = ValidationError::new("course_too_long");
        err.message = Some(format!("course names are limited to {MAX_COURSE_LEN} characters").into());
        return Err(err);
    }
    Ok(())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingResponse {
    pub destination: String,
    pub profile: Option<UserProfile>,
}

/// Save onboarding selections and return the landing route.
async fn save_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<OnboardingResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let role = match request.role.trim() {
        "" => None,
        raw => Some(
            raw.parse::<Role>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
    };

    let mut session = Session::new(user.identity);
    let mut form = OnboardingForm::default();
    form.set_role(role);
    form.set_department(request.department);
    for course in &request.courses {
        form.add_course(course.trim());
    }

    let route = form
        .save(&mut session, state.backend.profiles.as_ref())
        .await?;

    Ok(Json(OnboardingResponse {
        destination: route.path().to_string(),
        profile: session.into_parts().1,
    }))
}

// ─── Role Landing ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LandingResponse {
    pub role: Role,
    pub display_name: Option<String>,
    pub department: String,
    pub courses: Vec<String>,
}

/// Landing data for users whose profile declares `expected`.
async fn landing_for(state: &AppState, identity: Identity, expected: Role) -> Result<LandingResponse> {
    let session = load_session(state, identity).await?;
    let profile = session.profile().ok_or(AppError::OnboardingRequired)?;
    let role = profile.role().ok_or(AppError::OnboardingRequired)?;

    let department = profile
        .department
        .clone()
        .filter(|d| !d.is_empty())
        .ok_or(AppError::OnboardingRequired)?;

    if role != expected {
        return Err(AppError::Forbidden(format!(
            "{} pages require the {} role",
            expected, expected
        )));
    }

    Ok(LandingResponse {
        role,
        display_name: profile.display_name.clone(),
        department,
        courses: profile.courses.clone(),
    })
}

async fn student_landing(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LandingResponse>> {
    landing_for(&state, user.identity, Role::Student).await.map(Json)
}

async fn teacher_landing(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LandingResponse>> {
    landing_for(&state, user.identity, Role::Teacher).await.map(Json)
}
