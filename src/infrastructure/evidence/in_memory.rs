//! In-memory evidence store implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::domain::evidence::{EvidenceId, EvidenceItem, EvidenceRecord, EvidenceStore};
use crate::domain::DomainError;

/// In-memory evidence retention, grown organically from corpus results.
///
/// Upserts mirror the persistent store's on-conflict semantics: a
/// record already present bumps usage instead of duplicating.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceStore {
    items: RwLock<HashMap<EvidenceId, EvidenceItem>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing items (tests, warm start)
    pub fn with_items(items: Vec<EvidenceItem>) -> Self {
        let map = items.into_iter().map(|i| (i.id.clone(), i)).collect();
        Self {
            items: RwLock::new(map),
        }
    }

    fn read_items(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<EvidenceId, EvidenceItem>>, DomainError>
    {
        self.items
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_items(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<EvidenceId, EvidenceItem>>, DomainError>
    {
        self.items
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn upsert(&self, record: &EvidenceRecord) -> Result<EvidenceItem, DomainError> {
        let mut items = self.write_items()?;
        let id = EvidenceId::new(&record.external_id);

        let item = match items.get_mut(&id) {
            Some(existing) => {
                existing.touch();
                existing.clone()
            }
            None => {
                let item = EvidenceItem::from_record(record);
                items.insert(id, item.clone());
                item
            }
        };

        Ok(item)
    }

    async fn search_terms(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<EvidenceItem>, DomainError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let items = self.read_items()?;

        // Rank by how many terms match title or snippet, most first
        let mut matches: Vec<(usize, &EvidenceItem)> = items
            .values()
            .filter_map(|item| {
                let haystack = format!("{} {}", item.title, item.snippet).to_lowercase();
                let matched = terms.iter().filter(|t| haystack.contains(t.as_str())).count();

                (matched > 0).then_some((matched, item))
            })
            .collect();

        matches.sort_by(|(a, ia), (b, ib)| {
            b.cmp(a)
                .then_with(|| ib.publication_date.cmp(&ia.publication_date))
        });

        Ok(matches
            .into_iter()
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceItem>, DomainError> {
        Ok(self.read_items()?.get(id).cloned())
    }

    async fn increment_usage(&self, id: &EvidenceId) -> Result<(), DomainError> {
        let mut items = self.write_items()?;

        let item = items
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("evidence '{}' not retained", id)))?;

        item.touch();
        Ok(())
    }

    async fn promote_frequent(&self, threshold: u64) -> Result<usize, DomainError> {
        let mut items = self.write_items()?;
        let mut promoted = 0;

        for item in items.values_mut() {
            if !item.pinned && item.usage_count >= threshold {
                item.pinned = true;
                promoted += 1;
                debug!(id = %item.id, usage = item.usage_count, "evidence pinned");
            }
        }

        Ok(promoted)
    }

    async fn evict_stale(
        &self,
        retention_days: i64,
        min_usage: u64,
    ) -> Result<usize, DomainError> {
        let mut items = self.write_items()?;
        let cutoff = Utc::now() - Duration::days(retention_days);

        let stale: Vec<EvidenceId> = items
            .values()
            .filter(|i| !i.pinned && i.last_accessed < cutoff && i.usage_count < min_usage)
            .map(|i| i.id.clone())
            .collect();

        for id in &stale {
            items.remove(id);
        }

        Ok(stale.len())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        Ok(self.read_items()?.len())
    }
}
