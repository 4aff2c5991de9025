//! In-memory cache store implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::cache::{
    trigram_similarity, AnswerId, CachedAnswer, CacheStats, CacheStore, EvictionPolicy,
    EvictionReport, FuzzyMatch,
};
use crate::domain::query::{Fingerprint, Query};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct CacheInner {
    by_fingerprint: HashMap<Fingerprint, CachedAnswer>,
    by_id: HashMap<AnswerId, Fingerprint>,
}

/// In-memory answer cache using linear fuzzy scan over a bounded
/// working set.
///
/// Suitable for development and single-node deployments; a persistent
/// store implementation satisfies the same trait for production.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    inner: RwLock<CacheInner>,
    /// Bound on how many recent entries a fuzzy lookup scans
    working_set_size: usize,
    /// Minimum originating-query token count for fuzzy eligibility
    min_fuzzy_tokens: usize,
    exact_hits: AtomicU64,
    fuzzy_hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryCacheStore {
    pub fn new(working_set_size: usize, min_fuzzy_tokens: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            working_set_size,
            min_fuzzy_tokens,
            exact_hits: AtomicU64::new(0),
            fuzzy_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn read_inner(&self) -> Result<std::sync::RwLockReadGuard<'_, CacheInner>, DomainError> {
        self.inner
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_inner(&self) -> Result<std::sync::RwLockWriteGuard<'_, CacheInner>, DomainError> {
        self.inner
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn lookup_exact(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<CachedAnswer>, DomainError> {
        let inner = self.read_inner()?;
        let found = inner.by_fingerprint.get(fingerprint).cloned();

        if found.is_some() {
            self.exact_hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = fingerprint.short(), "exact cache hit");
        }

        Ok(found)
    }

    async fn lookup_fuzzy(
        &self,
        normalized_text: &str,
        token_count: usize,
        threshold: f32,
    ) -> Result<Option<FuzzyMatch>, DomainError> {
        // Short incoming queries skip fuzzy matching entirely; the same
        // minimum gates cached candidates below
        if token_count < self.min_fuzzy_tokens {
            return Ok(None);
        }

        let inner = self.read_inner()?;

        // Working set: the most recently served eligible entries.
        // Short originating queries are excluded outright, they produce
        // unreliable false positives.
        let mut working_set: Vec<&CachedAnswer> = inner
            .by_fingerprint
            .values()
            .filter(|a| a.query_token_count >= self.min_fuzzy_tokens)
            .collect();

        working_set.sort_by(|a, b| b.last_served.cmp(&a.last_served));
        working_set.truncate(self.working_set_size);

        let best = working_set
            .into_iter()
            .map(|a| (a, trigram_similarity(normalized_text, &a.query_text)))
            .filter(|(_, similarity)| *similarity > threshold)
            .max_by(|(a, sa), (b, sb)| {
                sa.partial_cmp(sb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.last_served.cmp(&b.last_served))
            });

        match best {
            Some((answer, similarity)) => {
                self.fuzzy_hits.fetch_add(1, Ordering::Relaxed);
                debug!(similarity, answer_id = %answer.id, "fuzzy cache hit");
                Ok(Some(FuzzyMatch::new(answer.clone(), similarity)))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, query: &Query, answer: CachedAnswer) -> Result<(), DomainError> {
        let mut inner = self.write_inner()?;

        // Compare-and-set on fingerprint: a concurrent regeneration that
        // lost the race surfaces here and recovers as a no-op upstream.
        if inner.by_fingerprint.contains_key(&query.fingerprint) {
            return Err(DomainError::conflict(format!(
                "answer already cached for fingerprint {}",
                query.fingerprint.short()
            )));
        }

        inner.by_id.insert(answer.id.clone(), query.fingerprint.clone());
        inner.by_fingerprint.insert(query.fingerprint.clone(), answer);

        Ok(())
    }

    async fn touch(&self, id: &AnswerId) -> Result<(), DomainError> {
        let mut inner = self.write_inner()?;

        let fingerprint = inner
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("answer '{}' not cached", id)))?;

        if let Some(answer) = inner.by_fingerprint.get_mut(&fingerprint) {
            answer.touch();
        }

        Ok(())
    }

    async fn evict(&self, policy: &EvictionPolicy) -> Result<EvictionReport, DomainError> {
        let mut inner = self.write_inner()?;
        let now = Utc::now();

        let mut report = EvictionReport::default();
        let mut stale_keys = Vec::new();

        for (fingerprint, answer) in &inner.by_fingerprint {
            report.examined += 1;

            if answer.last_served_age(now).num_days() <= policy.retention_days {
                continue;
            }

            if answer.is_protected(policy.promotion_threshold) {
                report.promoted += 1;
                continue;
            }

            if stale_keys.len() < policy.batch_size {
                stale_keys.push((fingerprint.clone(), answer.id.clone()));
            }
        }

        for (fingerprint, id) in stale_keys {
            inner.by_fingerprint.remove(&fingerprint);
            inner.by_id.remove(&id);
            report.evicted += 1;
        }

        self.evictions
            .fetch_add(report.evicted as u64, Ordering::Relaxed);

        Ok(report)
    }

    async fn record_miss(&self) -> Result<(), DomainError> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, DomainError> {
        let inner = self.read_inner()?;

        Ok(CacheStats {
            total_entries: inner.by_fingerprint.len(),
            exact_hits: self.exact_hits.load(Ordering::Relaxed),
            fuzzy_hits: self.fuzzy_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }

    async fn size(&self) -> Result<usize, DomainError> {
        Ok(self.read_inner()?.by_fingerprint.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalizer::TermNormalizer;
    use chrono::Duration;

    fn store() -> InMemoryCacheStore {
        InMemoryCacheStore::new(256, 8)
    }

    fn query_and_answer(raw: &str) -> (Query, CachedAnswer) {
        let normalizer = TermNormalizer::with_defaults();
        let normalized = normalizer.normalize(raw);
        let query = Query::from_normalized(&normalized);
        let answer = CachedAnswer::new(
            query.fingerprint.clone(),
            &normalized.text,
            normalized.token_count(),
            format!("Answer to: {raw}"),
        );

        (query, answer)
    }

    /// A long query whose normalized form keeps >= 8 tokens
    const LONG_QUERY: &str = "daily protein grams intake timing distribution leucine threshold \
                              hypertrophy resistance training older adults";

    #[tokio::test]
    async fn test_insert_then_lookup_exact() {
        let store = store();
        let (query, answer) = query_and_answer("benefits of creatine");
        let id = answer.id.clone();

        store.insert(&query, answer).await.unwrap();

        let found = store.lookup_exact(&query.fingerprint).await.unwrap();
        assert_eq!(found.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_lookup_exact_miss() {
        let store = store();
        let found = store
            .lookup_exact(&Fingerprint::of("nothing here"))
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = store();
        let (query, answer) = query_and_answer("benefits of creatine");
        let (_, duplicate) = query_and_answer("benefits of creatine");

        store.insert(&query, answer).await.unwrap();
        let err = store.insert(&query, duplicate).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_increments_times_served() {
        let store = store();
        let (query, answer) = query_and_answer("benefits of creatine");
        let id = answer.id.clone();

        store.insert(&query, answer).await.unwrap();
        store.touch(&id).await.unwrap();
        store.touch(&id).await.unwrap();

        // Creation counted as the first serve, so two touches make three
        let found = store.lookup_exact(&query.fingerprint).await.unwrap().unwrap();
        assert_eq!(found.times_served, 3);
    }

    #[tokio::test]
    async fn test_touch_unknown_answer_is_not_found() {
        let store = store();
        let err = store.touch(&AnswerId::new("ans-missing")).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fuzzy_hit_above_threshold() {
        let store = store();
        let (query, answer) = query_and_answer(LONG_QUERY);
        store.insert(&query, answer).await.unwrap();

        // Same long query with one token changed stays well above 0.70
        let variant = LONG_QUERY.replace("older adults", "young adults");
        let normalizer = TermNormalizer::with_defaults();
        let normalized = normalizer.normalize(&variant);

        let found = store
            .lookup_fuzzy(&normalized.text, normalized.token_count(), 0.70)
            .await
            .unwrap();

        let m = found.expect("fuzzy match expected");
        assert!(m.similarity > 0.70);
    }

    #[tokio::test]
    async fn test_fuzzy_never_returns_below_threshold() {
        let store = store();
        let (query, answer) = query_and_answer(LONG_QUERY);
        store.insert(&query, answer).await.unwrap();

        let found = store
            .lookup_fuzzy(
                "marathon carbohydrate gel pacing fluid strategy heat acclimation plan",
                9,
                0.70,
            )
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_short_queries_excluded_from_fuzzy() {
        let store = store();
        // Normalizes to far fewer than 8 tokens
        let (query, answer) = query_and_answer("benefits of creatine");
        store.insert(&query, answer).await.unwrap();

        // Identical text would score 1.0, but the token gate excludes it
        let found = store
            .lookup_fuzzy(&query.normalized_text, query.token_count, 0.70)
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_fuzzy_gate_follows_configured_minimum() {
        // One knob governs both the incoming query and cached candidates
        let store = InMemoryCacheStore::new(256, 2);
        let (query, answer) = query_and_answer("benefits of creatine");
        store.insert(&query, answer).await.unwrap();

        let found = store
            .lookup_fuzzy(&query.normalized_text, query.token_count, 0.70)
            .await
            .unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_fuzzy_tie_breaks_by_most_recently_served() {
        let store = store();

        let (query_a, answer_a) = query_and_answer(LONG_QUERY);
        store.insert(&query_a, answer_a).await.unwrap();

        // Insert an identical-text answer under a synthetic fingerprint
        let (mut query_b, mut answer_b) = query_and_answer(LONG_QUERY);
        query_b.fingerprint = Fingerprint::of("synthetic second fingerprint");
        answer_b.fingerprint = query_b.fingerprint.clone();
        answer_b.last_served = Utc::now() + Duration::seconds(60);
        let recent_id = answer_b.id.clone();
        store.insert(&query_b, answer_b).await.unwrap();

        let found = store
            .lookup_fuzzy(&query_a.normalized_text, query_a.token_count, 0.70)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.answer.id, recent_id);
    }

    #[tokio::test]
    async fn test_eviction_removes_stale_unprotected() {
        let store = store();
        let (query, mut answer) = query_and_answer("benefits of creatine");
        answer.last_served = Utc::now() - Duration::days(90);
        store.insert(&query, answer).await.unwrap();

        let report = store.evict(&EvictionPolicy::default()).await.unwrap();

        assert_eq!(report.evicted, 1);
        assert_eq!(store.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_eviction_spares_promoted_entries() {
        let store = store();
        let (query, mut answer) = query_and_answer("benefits of creatine");
        answer.last_served = Utc::now() - Duration::days(365);
        answer.times_served = 20;
        store.insert(&query, answer).await.unwrap();

        let report = store.evict(&EvictionPolicy::default()).await.unwrap();

        assert_eq!(report.evicted, 0);
        assert_eq!(report.promoted, 1);
        assert_eq!(store.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_eviction_spares_fresh_entries() {
        let store = store();
        let (query, answer) = query_and_answer("benefits of creatine");
        store.insert(&query, answer).await.unwrap();

        let report = store.evict(&EvictionPolicy::default()).await.unwrap();

        assert_eq!(report.evicted, 0);
        assert_eq!(store.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_eviction_respects_batch_size() {
        let store = store();

        for i in 0..5 {
            let (mut query, mut answer) = query_and_answer(&format!("unique question {i} tokens"));
            query.fingerprint = Fingerprint::of(&format!("fp-{i}"));
            answer.fingerprint = query.fingerprint.clone();
            answer.last_served = Utc::now() - Duration::days(90);
            store.insert(&query, answer).await.unwrap();
        }

        let policy = EvictionPolicy {
            batch_size: 2,
            ..EvictionPolicy::default()
        };

        let report = store.evict(&policy).await.unwrap();

        assert_eq!(report.evicted, 2);
        assert_eq!(store.size().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let store = store();
        let (query, answer) = query_and_answer("benefits of creatine");
        store.insert(&query, answer).await.unwrap();

        let _ = store.lookup_exact(&query.fingerprint).await.unwrap();
        let _ = store.lookup_exact(&query.fingerprint).await.unwrap();
        store.record_miss().await.unwrap();

        let stats = store.stats().await.unwrap();

        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.exact_hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_and_inserts() {
        let store = std::sync::Arc::new(store());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let (mut query, mut answer) =
                    query_and_answer(&format!("concurrent question number {i}"));
                query.fingerprint = Fingerprint::of(&format!("concurrent-{i}"));
                answer.fingerprint = query.fingerprint.clone();

                store.insert(&query, answer).await.unwrap();
                store.lookup_exact(&query.fingerprint).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.size().await.unwrap(), 16);
    }
}
