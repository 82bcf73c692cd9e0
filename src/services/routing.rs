// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post-authentication routing decision.

use crate::models::{Role, UserProfile};
use serde::Serialize;

/// Frontend routes this service redirects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Onboarding,
    Student,
    Teacher,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Onboarding => "/onboarding",
            Route::Student => "/student",
            Route::Teacher => "/teacher",
        }
    }
}

impl From<Role> for Route {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => Route::Student,
            Role::Teacher => Route::Teacher,
        }
    }
}

/// Where a freshly authenticated user should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Navigate(Route),
    /// No navigation: the user stays on the current page.
    Stay,
}

impl Destination {
    pub fn route(&self) -> Option<Route> {
        match self {
            Destination::Navigate(route) => Some(*route),
            Destination::Stay => None,
        }
    }
}

/// Decide where to send a user given their freshly reloaded profile.
///
/// - no profile document: onboarding
/// - a non-empty role: `/teacher` for `teacher`, `/student` for anything else
/// - a profile with an empty role: stay put
///
/// The last case strands users whose document was written without a role;
/// they are not sent back to onboarding.
pub fn resolve_post_auth_destination(profile: Option<&UserProfile>) -> Destination {
    let Some(profile) = profile else {
        return Destination::Navigate(Route::Onboarding);
    };

    match profile.role() {
        Some(role) => Destination::Navigate(role.into()),
        None => Destination::Stay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_role(role: Option<&str>) -> UserProfile {
        UserProfile {
            uid: "google:1".to_string(),
            role: role.map(str::to_string),
            department: Some("CS".to_string()),
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_no_profile_goes_to_onboarding() {
        assert_eq!(
            resolve_post_auth_destination(None),
            Destination::Navigate(Route::Onboarding)
        );
    }

    #[test]
    fn test_teacher_role() {
        let profile = profile_with_role(Some("teacher"));
        assert_eq!(
            resolve_post_auth_destination(Some(&profile)),
            Destination::Navigate(Route::Teacher)
        );
    }

    #[test]
    fn test_other_roles_fall_back_to_student() {
        for role in ["student", "admin", "TEACHER", " teacher"] {
            let profile = profile_with_role(Some(role));
            assert_eq!(
                resolve_post_auth_destination(Some(&profile)),
                Destination::Navigate(Route::Student),
                "role {role:?}"
            );
        }
    }

    #[test]
    fn test_empty_role_stays() {
        for role in [None, Some("")] {
            let profile = profile_with_role(role);
            let first = resolve_post_auth_destination(Some(&profile));
            assert_eq!(first, Destination::Stay);
            assert_eq!(resolve_post_auth_destination(Some(&profile)), first);
        }
    }

    #[test]
    fn test_profile_complete_flag_is_ignored() {
        let mut profile = profile_with_role(None);
        profile.profile_complete = true;
        assert_eq!(resolve_post_auth_destination(Some(&profile)), Destination::Stay);

        let mut profile = profile_with_role(Some("teacher"));
        profile.profile_complete = false;
        assert_eq!(
            resolve_post_auth_destination(Some(&profile)),
            Destination::Navigate(Route::Teacher)
        );
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Onboarding.path(), "/onboarding");
        assert_eq!(Route::Student.path(), "/student");
        assert_eq!(Route::Teacher.path(), "/teacher");
    }
}
