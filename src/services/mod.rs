// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod identity;
pub mod oauth_state;
pub mod onboarding;
pub mod routing;
pub mod session;
pub mod sign_in;

pub use identity::{IdentityProvider, OAuthIdentityClient, OAuthProvider, ProviderDescriptor};
pub use onboarding::{OnboardingError, OnboardingForm};
pub use routing::{resolve_post_auth_destination, Destination, Route};
pub use session::Session;
pub use sign_in::{complete_sign_in, SignInError, SignInOutcome};
