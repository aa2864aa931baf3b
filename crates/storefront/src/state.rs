//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::catalog::CatalogCache;
use crate::services::offers::{OfferResolver, OfferScheduler, OfferService, offer_engine};
use crate::services::telegram::{Notifier, TelegramClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    notifier: Notifier,
    offer_resolver: Arc<OfferResolver>,
    offer_scheduler: OfferScheduler,
    catalog: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Telegram notifications are enabled when the config carries bot
    /// credentials.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let notifier = Notifier::new(config.telegram.as_ref().map(TelegramClient::new));
        Self::with_notifier(config, pool, notifier)
    }

    /// Create application state with an explicit notifier.
    #[must_use]
    pub fn with_notifier(config: StorefrontConfig, pool: PgPool, notifier: Notifier) -> Self {
        let (offer_resolver, offer_scheduler) =
            offer_engine(pool.clone(), notifier.clone(), config.offers);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                notifier,
                offer_resolver,
                offer_scheduler,
                catalog: CatalogCache::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Telegram notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    #[must_use]
    pub fn offer_resolver(&self) -> &OfferResolver {
        &self.inner.offer_resolver
    }

    #[must_use]
    pub fn offer_scheduler(&self) -> &OfferScheduler {
        &self.inner.offer_scheduler
    }

    /// Offer workflow bound to this state's pool, notifier and timers.
    #[must_use]
    pub fn offers(&self) -> OfferService<'_> {
        OfferService::new(
            &self.inner.pool,
            &self.inner.notifier,
            &self.inner.offer_resolver,
            &self.inner.offer_scheduler,
        )
    }

    /// Get a reference to the catalogue cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }
}
