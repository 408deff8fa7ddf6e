//! Cheatsmith library
//!
//! Core of the cheatsheet builder: local-first persistence, optional
//! cloud sync behind the same storage interface, entry ordering, and
//! AI-assisted entry generation.

pub mod config;
pub mod database;
pub mod error;
pub mod ordering;
pub mod remote;
pub mod services;
pub mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for an embedding application.
///
/// Honors `RUST_LOG` when set; call once at startup.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cheatsmith=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
