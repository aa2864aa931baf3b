//! Cached catalogue reads.
//!
//! Facet counts back the filter sidebar on every listing page, so they are
//! cached for 5 minutes and dropped whenever stock changes.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{RepositoryError, StockRepository};
use crate::models::StockFacets;

const FACETS_KEY: &str = "facets";

/// In-memory cache in front of [`StockRepository::facets`].
#[derive(Clone)]
pub struct CatalogCache {
    facets: Cache<&'static str, StockFacets>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            facets: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Grade and location counts, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the counts must be reloaded
    /// and the query fails.
    pub async fn facets(&self, pool: &PgPool) -> Result<StockFacets, RepositoryError> {
        if let Some(facets) = self.facets.get(FACETS_KEY).await {
            debug!("Cache hit for stock facets");
            return Ok(facets);
        }

        let facets = StockRepository::new(pool).facets().await?;
        self.facets.insert(FACETS_KEY, facets.clone()).await;
        Ok(facets)
    }

    /// Drop cached counts after a stock write.
    pub async fn invalidate(&self) {
        self.facets.invalidate(FACETS_KEY).await;
    }
}
