// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential classification and resolution to a participant id.
//!
//! Two kinds of bearer token are accepted:
//!
//! - **Local sessions**: HS256 JWTs minted by [`IdentityResolver::issue_session_token`]
//! - **Federated tokens**: RS256 Google ID tokens, verified against Google's keys
//!
//! The kind is decided once from the JWT header, then exactly one verifier runs.

use chrono::Utc;
use jsonwebtoken::{decode_header, Algorithm};
use std::sync::Arc;

use crate::db::EngagementStore;
use crate::error::{AppError, Result};
use crate::models::{AuthProvider, Participant};
use crate::services::google_oidc::{FederatedPrincipal, GoogleIdTokenVerifier, OidcError};
use crate::services::session;

/// A bearer credential, tagged by who issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    LocalSession(String),
    FederatedToken(String),
}

impl Credential {
    /// Classify a raw token by its JWT header algorithm.
    pub fn classify(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let header =
            decode_header(token).map_err(|e| AppError::InvalidToken(format!("bad header: {e}")))?;

        match header.alg {
            Algorithm::HS256 => Ok(Credential::LocalSession(token.to_string())),
            Algorithm::RS256 => Ok(Credential::FederatedToken(token.to_string())),
            other => Err(AppError::InvalidToken(format!(
                "unsupported token algorithm: {other:?}"
            ))),
        }
    }

    /// Classify the value of an `Authorization` header.
    pub fn from_authorization_header(value: &str) -> Result<Self> {
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;
        Self::classify(token)
    }
}

impl From<OidcError> for AppError {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::Rejected(msg) => AppError::InvalidToken(msg),
            OidcError::Transient(msg) => AppError::IdentityProvider(msg),
        }
    }
}

/// Turns credentials into verified participant ids.
pub struct IdentityResolver {
    session_signing_key: Vec<u8>,
    federated: Arc<GoogleIdTokenVerifier>,
    store: Arc<dyn EngagementStore>,
}

impl IdentityResolver {
    pub fn new(
        session_signing_key: Vec<u8>,
        federated: Arc<GoogleIdTokenVerifier>,
        store: Arc<dyn EngagementStore>,
    ) -> Self {
        Self {
            session_signing_key,
            federated,
            store,
        }
    }

    /// Verify a credential and return the participant it belongs to.
    ///
    /// Federated sign-ins for an unknown email provision a new participant.
    pub async fn resolve(&self, credential: &Credential) -> Result<String> {
        match credential {
            Credential::LocalSession(token) => {
                let participant_id =
                    session::verify_session_token(token, &self.session_signing_key)?;

                if self.store.get_participant(&participant_id).await?.is_none() {
                    tracing::warn!(participant_id = %participant_id, "Session for unknown participant");
                    return Err(AppError::InvalidToken("unknown participant".to_string()));
                }
                Ok(participant_id)
            }
            Credential::FederatedToken(token) => {
                let principal = self.federated.verify_id_token(token).await?;
                let participant = self.find_or_provision(&principal).await?;
                Ok(participant.id)
            }
        }
    }

    /// Mint a local session token for a participant.
    pub fn issue_session_token(&self, participant_id: &str) -> Result<String> {
        session::issue_session_token(participant_id, &self.session_signing_key)
    }

    async fn find_or_provision(&self, principal: &FederatedPrincipal) -> Result<Participant> {
        if let Some(existing) = self.store.get_participant_by_email(&principal.email).await? {
            return Ok(existing);
        }

        let display_name = principal
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email_local_part(&principal.email));

        let participant = Participant::new(
            display_name,
            &principal.email,
            AuthProvider::Google,
            Utc::now(),
        );

        match self.store.insert_participant(&participant).await {
            Ok(()) => {
                tracing::info!(
                    participant_id = %participant.id,
                    subject = %principal.subject,
                    "Provisioned participant from federated sign-in"
                );
                Ok(participant)
            }
            // Lost a race with a concurrent first sign-in for the same email.
            Err(AppError::Conflict(_)) => self
                .store
                .get_participant_by_email(&principal.email)
                .await?
                .ok_or_else(|| AppError::Conflict("email registration in flight".to_string())),
            Err(e) => Err(e),
        }
    }
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
