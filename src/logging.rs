// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured JSON logging (GCP-compliant).

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global JSON subscriber.
///
/// `RUST_LOG` is honoured on top of the crate defaults. Fails if a global
/// subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::from_default_env()
        .add_directive("eco_tracker=debug".parse()?)
        .add_directive("info".parse()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init()
        .context("global tracing subscriber already installed")
}
