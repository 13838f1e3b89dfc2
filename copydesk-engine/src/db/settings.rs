//! Settings database operations
//!
//! Flat key→value (string) settings table with typed accessors. Missing or
//! malformed keys fall back to documented defaults; configuration problems
//! must never stop the pipeline where a safe default exists.

use anyhow::Result;
use sqlx::SqlitePool;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::services::similarity::DEFAULT_DUPLICATE_THRESHOLD;
use crate::validators::QualityThresholds;

/// Generic setting getter
pub async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((value,)) => match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                tracing::warn!(key, value, error = %e, "Malformed setting, using default");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Idea-intake duplicate threshold
///
/// **Default:** 0.70
pub async fn get_dedup_similarity_threshold(pool: &SqlitePool) -> Result<f64> {
    get_setting(pool, "dedup_similarity_threshold")
        .await
        .map(|opt| opt.unwrap_or(DEFAULT_DUPLICATE_THRESHOLD))
}

/// Load quality thresholds from settings, defaulting every unset field
pub async fn load_quality_thresholds(pool: &SqlitePool) -> Result<QualityThresholds> {
    let defaults = QualityThresholds::default();

    Ok(QualityThresholds {
        min_word_count: get_setting(pool, "quality_min_word_count")
            .await?
            .unwrap_or(defaults.min_word_count),
        max_word_count: get_setting(pool, "quality_max_word_count")
            .await?
            .unwrap_or(defaults.max_word_count),
        word_count_critical: get_setting(pool, "quality_word_count_critical")
            .await?
            .unwrap_or(defaults.word_count_critical),
        min_internal_links: get_setting(pool, "quality_min_internal_links")
            .await?
            .unwrap_or(defaults.min_internal_links),
        min_external_links: get_setting(pool, "quality_min_external_links")
            .await?
            .unwrap_or(defaults.min_external_links),
        require_faq: get_setting(pool, "quality_require_faq")
            .await?
            .unwrap_or(defaults.require_faq),
        require_bls_citation: get_setting(pool, "quality_require_bls_citation")
            .await?
            .unwrap_or(defaults.require_bls_citation),
        require_headings: get_setting(pool, "quality_require_headings")
            .await?
            .unwrap_or(defaults.require_headings),
        min_heading_count: get_setting(pool, "quality_min_heading_count")
            .await?
            .unwrap_or(defaults.min_heading_count),
        require_images: get_setting(pool, "quality_require_images")
            .await?
            .unwrap_or(defaults.require_images),
        min_images: get_setting(pool, "quality_min_images")
            .await?
            .unwrap_or(defaults.min_images),
        require_alt_text: get_setting(pool, "quality_require_alt_text")
            .await?
            .unwrap_or(defaults.require_alt_text),
        min_keyword_density: get_setting(pool, "quality_min_keyword_density")
            .await?
            .unwrap_or(defaults.min_keyword_density),
        max_keyword_density: get_setting(pool, "quality_max_keyword_density")
            .await?
            .unwrap_or(defaults.max_keyword_density),
        min_readability: get_setting(pool, "quality_min_readability")
            .await?
            .unwrap_or(defaults.min_readability),
        max_readability: get_setting(pool, "quality_max_readability")
            .await?
            .unwrap_or(defaults.max_readability),
        site_host: get_setting(pool, "quality_site_host").await?,
    })
}

/// Short-lived threshold cache (~60 s TTL)
///
/// Avoids a settings read per scoring call without introducing ambient global
/// state: the cache is owned by whoever scores, and expiry is the explicit
/// reload point.
pub struct ThresholdsCache {
    ttl: Duration,
    inner: RwLock<Option<(Instant, QualityThresholds)>>,
}

impl ThresholdsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(None),
        }
    }

    /// Default 60-second cache
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(60))
    }

    /// Current thresholds, reloading from settings when the cache expired
    pub async fn get(&self, pool: &SqlitePool) -> Result<QualityThresholds> {
        {
            let guard = self.inner.read().await;
            if let Some((loaded_at, thresholds)) = guard.as_ref() {
                if loaded_at.elapsed() < self.ttl {
                    return Ok(thresholds.clone());
                }
            }
        }

        let thresholds = load_quality_thresholds(pool).await?;
        let mut guard = self.inner.write().await;
        *guard = Some((Instant::now(), thresholds.clone()));
        Ok(thresholds)
    }

    /// Drop the cached snapshot; the next `get` reloads
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_missing_keys_yield_defaults() {
        let pool = test_pool().await;
        let thresholds = load_quality_thresholds(&pool).await.unwrap();
        assert_eq!(thresholds.min_word_count, 800);
        assert_eq!(thresholds.max_word_count, 2500);
        assert_eq!(thresholds.min_internal_links, 3);
        assert_eq!(thresholds.min_external_links, 1);
        assert_eq!(thresholds.min_readability, 60.0);
        assert!(!thresholds.require_faq);
    }

    #[tokio::test]
    async fn test_overrides_apply() {
        let pool = test_pool().await;
        set_setting(&pool, "quality_min_internal_links", 5).await.unwrap();
        set_setting(&pool, "quality_require_faq", true).await.unwrap();
        set_setting(&pool, "quality_site_host", "site.example").await.unwrap();

        let thresholds = load_quality_thresholds(&pool).await.unwrap();
        assert_eq!(thresholds.min_internal_links, 5);
        assert!(thresholds.require_faq);
        assert_eq!(thresholds.site_host.as_deref(), Some("site.example"));
        // Untouched fields keep their defaults
        assert_eq!(thresholds.min_word_count, 800);
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back() {
        let pool = test_pool().await;
        set_setting(&pool, "quality_min_internal_links", "not-a-number").await.unwrap();

        let thresholds = load_quality_thresholds(&pool).await.unwrap();
        assert_eq!(thresholds.min_internal_links, 3);
    }

    #[tokio::test]
    async fn test_cache_serves_stale_until_invalidated() {
        let pool = test_pool().await;
        let cache = ThresholdsCache::new(Duration::from_secs(3600));

        let first = cache.get(&pool).await.unwrap();
        assert_eq!(first.min_internal_links, 3);

        set_setting(&pool, "quality_min_internal_links", 7).await.unwrap();
        // Within TTL the cached snapshot is served
        let cached = cache.get(&pool).await.unwrap();
        assert_eq!(cached.min_internal_links, 3);

        cache.invalidate().await;
        let reloaded = cache.get(&pool).await.unwrap();
        assert_eq!(reloaded.min_internal_links, 7);
    }

    #[tokio::test]
    async fn test_dedup_threshold_default_and_override() {
        let pool = test_pool().await;
        assert_eq!(get_dedup_similarity_threshold(&pool).await.unwrap(), 0.70);

        set_setting(&pool, "dedup_similarity_threshold", 0.85).await.unwrap();
        assert_eq!(get_dedup_similarity_threshold(&pool).await.unwrap(), 0.85);
    }
}
