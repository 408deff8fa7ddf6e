//! Mode and configuration manager
//!
//! Owns the singleton AppConfig and the lifecycle of the cloud adapter.
//! Configuration always lives in the local store, whatever the active
//! mode, so mode selection bootstraps from local state. Every mutation is
//! persisted write-through before the in-memory state changes.

use crate::database::models::{AppConfig, Mode};
use crate::database::LocalStore;
use crate::error::{AppError, Result};
use crate::remote::{RemoteStore, Session};
use std::sync::{Arc, RwLock};

struct State {
    config: AppConfig,
    remote: Option<Arc<RemoteStore>>,
}

/// Process-wide mode/config state
pub struct ModeManager {
    local: Arc<LocalStore>,
    state: RwLock<State>,
}

impl ModeManager {
    /// Read AppConfig from the local store and derive the initial mode.
    ///
    /// Callers must not serve data before this completes; it is the
    /// startup gate for the whole storage layer.
    pub async fn load(local: Arc<LocalStore>) -> Result<Self> {
        let config = local.load_config().await?;
        let state = Self::build_state(config)?;

        tracing::info!(
            "Config loaded, starting in {} mode",
            match state.remote {
                Some(_) => "cloud",
                None => "guest",
            }
        );

        Ok(Self {
            local,
            state: RwLock::new(state),
        })
    }

    fn build_state(config: AppConfig) -> Result<State> {
        let remote = match config.mode() {
            Mode::Cloud(credentials) => Some(Arc::new(RemoteStore::new(&credentials)?)),
            Mode::Guest => None,
        };
        Ok(State { config, remote })
    }

    pub fn config(&self) -> AppConfig {
        self.state.read().unwrap().config.clone()
    }

    pub fn mode(&self) -> Mode {
        self.state.read().unwrap().config.mode()
    }

    /// The cloud adapter, constructed or not per the current credentials
    pub fn remote(&self) -> Option<Arc<RemoteStore>> {
        self.state.read().unwrap().remote.clone()
    }

    /// The cloud adapter, only when a signed-in identity is present.
    ///
    /// This is the facade's dispatch predicate: cloud mode without a
    /// session still routes to the local store.
    pub fn active_remote(&self) -> Option<Arc<RemoteStore>> {
        self.remote().filter(|r| r.current_user_id().is_some())
    }

    /// Replace the configuration.
    ///
    /// Persists to the local store first; the in-memory state (and the
    /// cloud adapter) only changes once the write has committed. The
    /// adapter is kept, with its session, when the remote credentials are
    /// unchanged; otherwise it is rebuilt or torn down.
    pub async fn update_config(&self, config: AppConfig) -> Result<()> {
        self.local.save_config(&config).await?;

        let mut state = self.state.write().unwrap();

        if state.config.mode() == config.mode() {
            state.config = config;
            return Ok(());
        }

        let new_state = Self::build_state(config)?;
        let was_cloud = state.remote.is_some();
        *state = new_state;

        match (&state.remote, was_cloud) {
            (Some(_), false) => tracing::info!("Switched to cloud mode"),
            (None, true) => tracing::info!("Switched to guest mode"),
            _ => tracing::info!("Cloud credentials replaced"),
        }

        Ok(())
    }

    /// Reset to guest mode with an empty AppConfig
    pub async fn clear_config(&self) -> Result<()> {
        self.update_config(AppConfig::default()).await
    }

    /// Sign in against the cloud backend; fails in guest mode
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let remote = self
            .remote()
            .ok_or_else(|| AppError::Auth("cloud mode is not configured".to_string()))?;
        remote.auth().sign_in(email, password).await
    }

    /// Sign out of the cloud backend, if signed in
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(remote) = self.remote() {
            remote.auth().sign_out().await?;
        }
        Ok(())
    }
}
