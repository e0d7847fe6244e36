// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Eco-Tracker: scoring and engagement core for a sustainability tracker
//!
//! Participants log sustainability actions; this crate turns them into
//! environmental impact, points, badges and a leaderboard, and runs the
//! daily check-in streak. Transport is left to the embedding application.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::{EngagementStore, FirestoreDb};
use services::{EngagementService, GoogleIdTokenVerifier, IdentityResolver};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engagement: EngagementService,
    pub identity: IdentityResolver,
}

impl AppState {
    /// Wire services over an existing store.
    pub fn with_store(config: Config, store: Arc<dyn EngagementStore>) -> anyhow::Result<Self> {
        let verifier = Arc::new(GoogleIdTokenVerifier::new(&config)?);
        Ok(Self::with_store_and_verifier(config, store, verifier))
    }

    pub fn with_store_and_verifier(
        config: Config,
        store: Arc<dyn EngagementStore>,
        verifier: Arc<GoogleIdTokenVerifier>,
    ) -> Self {
        let engagement = EngagementService::new(store.clone(), config.leaderboard_limit);
        let identity =
            IdentityResolver::new(config.session_signing_key.clone(), verifier, store);

        Self {
            config,
            engagement,
            identity,
        }
    }

    /// Connect to Firestore and wire the production services.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let db = FirestoreDb::new(&config.gcp_project_id).await?;
        tracing::info!(
            project = %config.gcp_project_id,
            leaderboard_limit = config.leaderboard_limit,
            "Eco-Tracker state initialized"
        );
        Self::with_store(config, Arc::new(db))
    }
}
