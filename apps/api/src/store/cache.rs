use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::warn;

use crate::errors::AppError;
use crate::models::analysis::CachedAnalysis;

pub const KEY_PREFIX: &str = "resume:";
/// Fixed lifetime of every cached analysis. Entries are never refreshed.
pub const ANALYSIS_TTL: Duration = Duration::from_secs(60 * 60 * 24);
const SCAN_BATCH: usize = 200;

pub fn cache_key(analysis_id: &str) -> String {
    format!("{KEY_PREFIX}{analysis_id}")
}

/// Recovers the analysis id from a cache key (the part after the last `:`).
pub fn analysis_id_from_key(key: &str) -> &str {
    key.rsplit(':').next().unwrap_or(key)
}

/// Short-lived store of analyses, the only lookup path by analysis id.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    /// Writes the entry with the fixed [`ANALYSIS_TTL`].
    async fn put(&self, analysis_id: &str, entry: &CachedAnalysis) -> Result<(), AppError>;

    async fn get(&self, analysis_id: &str) -> Result<Option<CachedAnalysis>, AppError>;

    /// Every live entry under [`KEY_PREFIX`], as `(analysis id, entry)`.
    /// Linear in the number of cached analyses across all users.
    async fn scan_all(&self) -> Result<Vec<(String, CachedAnalysis)>, AppError>;
}

/// Redis-backed cache sharing one multiplexed connection opened at startup.
pub struct RedisAnalysisCache {
    conn: MultiplexedConnection,
}

impl RedisAnalysisCache {
    pub async fn connect(client: &redis::Client) -> Result<Self, redis::RedisError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl AnalysisCache for RedisAnalysisCache {
    async fn put(&self, analysis_id: &str, entry: &CachedAnalysis) -> Result<(), AppError> {
        let payload = serde_json::to_string(entry)
            .map_err(|e| AppError::Cache(format!("Failed to encode cache entry: {e}")))?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(cache_key(analysis_id))
            .arg(payload)
            .arg("EX")
            .arg(ANALYSIS_TTL.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, analysis_id: &str) -> Result<Option<CachedAnalysis>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(cache_key(analysis_id))
            .query_async(&mut conn)
            .await?;

        raw.map(|s| {
            serde_json::from_str(&s)
                .map_err(|e| AppError::Cache(format!("Corrupt cache entry {analysis_id}: {e}")))
        })
        .transpose()
    }

    async fn scan_all(&self) -> Result<Vec<(String, CachedAnalysis)>, AppError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{KEY_PREFIX}*");
        let mut cursor: u64 = 0;
        let mut entries = Vec::new();

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let values: Vec<Option<String>> = redis::cmd("MGET")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await?;

                for (key, value) in keys.iter().zip(values) {
                    // expired between SCAN and MGET
                    let Some(raw) = value else { continue };
                    match serde_json::from_str::<CachedAnalysis>(&raw) {
                        Ok(entry) => entries.push((analysis_id_from_key(key).to_string(), entry)),
                        Err(e) => warn!("Skipping undecodable cache entry {key}: {e}"),
                    }
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_round_trip() {
        let key = cache_key("3f1c");
        assert_eq!(key, "resume:3f1c");
        assert_eq!(analysis_id_from_key(&key), "3f1c");
    }

    #[test]
    fn test_ttl_is_one_day() {
        assert_eq!(ANALYSIS_TTL.as_secs(), 86_400);
    }
}
