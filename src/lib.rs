// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Campus-Auth: sign-in, onboarding and role routing for the campus portal
//!
//! This crate provides the backend API that signs users in with Google or
//! GitHub, keeps their profile documents in Firestore and sends them to the
//! student or teacher pages once onboarding is done.

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use backend::Backend;
use config::Config;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: Backend,
}
