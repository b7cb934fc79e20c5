//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BanyanConfig;
use crate::services::assets::AssetStore;
use crate::services::email::EmailService;
use crate::services::tokens::TokenService;

/// Error constructing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("mailer setup failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and the long-lived services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BanyanConfig,
    pool: PgPool,
    tokens: TokenService,
    assets: AssetStore,
    mailer: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The mailer is only constructed when SMTP is configured; the
    /// contact and reset flows check for its presence and degrade.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured SMTP relay is invalid.
    pub fn new(config: BanyanConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
        let assets = AssetStore::new(&config);
        let mailer = match &config.email {
            Some(email_config) => Some(EmailService::new(email_config)?),
            None => {
                tracing::warn!("SMTP not configured; outbound mail is disabled");
                None
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                assets,
                mailer,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BanyanConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the asset store.
    #[must_use]
    pub fn assets(&self) -> &AssetStore {
        &self.inner.assets
    }

    /// Get the mailer, when SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }
}
