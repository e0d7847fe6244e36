// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are expected to be injected as environment variables by the
//! deployment (Cloud Run secret bindings), so there is no Secret Manager call.

use std::env;

/// Leaderboard size used when `LEADERBOARD_LIMIT` is not set.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
/// Largest leaderboard any caller may request.
pub const MAX_LEADERBOARD_LIMIT: usize = 50;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// OAuth client ID that federated ID tokens must be issued for
    pub google_client_id: String,
    /// Default number of leaderboard entries
    pub leaderboard_limit: usize,

    // --- Secrets ---
    /// HS256 key for local session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            google_client_id: "test-client.apps.googleusercontent.com".to_string(),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let leaderboard_limit = match env::var("LEADERBOARD_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid("LEADERBOARD_LIMIT", raw.clone()))?
                .clamp(1, MAX_LEADERBOARD_LIMIT),
            Err(_) => DEFAULT_LEADERBOARD_LIMIT,
        };

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .trim()
            .to_string()
            .into_bytes();

        if session_signing_key.len() < 32 {
            return Err(ConfigError::Invalid(
                "SESSION_SIGNING_KEY",
                "must be at least 32 bytes".to_string(),
            ));
        }

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            leaderboard_limit,
            session_signing_key,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
