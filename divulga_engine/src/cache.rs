//! Session-scoped result cache.
//!
//! Iterating many entities against the same year's dataset is the common
//! access pattern, so the outcome of a full fetch is memoized per scope
//! for the life of the process. No TTL and no eviction by design; a
//! long-lived host that cares about memory growth calls [`ResultCache::clear`]
//! itself.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::EngineError;
use crate::parse::digits_only;
use crate::record::NormalizedRecord;
use crate::schema::RecordKind;

/// The unit at which results are filtered and cached: one dataset, one
/// year, an optional state restriction, one target CPF, and an optional
/// record kind restriction. Equal scopes always denote the same query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterScope {
    /// Catalog package id or name, e.g. "prestacao-de-contas-eleitorais-2022".
    pub dataset: String,
    pub year: u16,
    /// Two-letter state code, lower-cased; `None` means nationwide.
    pub state: Option<String>,
    /// Target CPF, digits only, 11 long.
    pub target_cpf: String,
    /// Restrict results to one record kind; `None` accepts every kind.
    pub kind: Option<RecordKind>,
}

impl FilterScope {
    /// Builds a scope, normalizing the target CPF to its digits and
    /// rejecting anything that is not 11 of them.
    pub fn new(
        dataset: impl Into<String>,
        year: u16,
        state: Option<&str>,
        target_cpf: &str,
    ) -> Result<Self, EngineError> {
        let digits = digits_only(target_cpf);
        if digits.len() != 11 {
            return Err(EngineError::InvalidScope(format!(
                "target CPF must have 11 digits, got {}",
                digits.len()
            )));
        }
        let dataset = dataset.into();
        if dataset.trim().is_empty() {
            return Err(EngineError::InvalidScope(
                "dataset must not be empty".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            year,
            state: state.map(|s| s.to_lowercase()),
            target_cpf: digits,
            kind: None,
        })
    }

    /// Restricts the scope to a single record kind.
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Memoizes fully-materialized fetch outcomes, keyed by scope.
///
/// Safe under concurrent access: independent scopes may be fetched from
/// separate tasks, and one scope's failure never touches a sibling's
/// entry.
pub struct ResultCache {
    store: DashMap<FilterScope, Arc<Vec<NormalizedRecord>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Returns the cached records for `scope`, running `producer` to
    /// build them on first use. A failed producer stores nothing, so a
    /// later call retries.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        scope: &FilterScope,
        producer: F,
    ) -> Result<Arc<Vec<NormalizedRecord>>, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<NormalizedRecord>, EngineError>>,
    {
        if let Some(hit) = self.store.get(scope) {
            return Ok(Arc::clone(&hit));
        }
        let records = Arc::new(producer().await?);
        self.store.insert(scope.clone(), Arc::clone(&records));
        Ok(records)
    }

    /// Number of cached scopes.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drops every cached scope.
    pub fn clear(&self) {
        self.store.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn scope() -> FilterScope {
        FilterScope::new("prestacao-de-contas-eleitorais-2022", 2022, None, "11111111111")
            .unwrap()
    }

    #[tokio::test]
    async fn second_call_skips_the_producer() {
        let cache = ResultCache::new();
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let records = cache
                .get_or_fetch(&scope(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Vec::new())
                })
                .await
                .unwrap();
            assert!(records.is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_scopes_cache_separately() {
        let cache = ResultCache::new();
        let other = FilterScope::new("prestacao-de-contas-eleitorais-2022", 2022, None, "22222222222")
            .unwrap();
        let kinded = scope().with_kind(RecordKind::Revenue);

        for s in [scope(), other, kinded] {
            cache
                .get_or_fetch(&s, || async { Ok(Vec::new()) })
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = ResultCache::new();
        let calls = AtomicU32::new(0);

        let err = cache
            .get_or_fetch(&scope(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(EngineError::InvalidScope("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidScope(_)));
        assert!(cache.is_empty());

        cache
            .get_or_fetch(&scope(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let cache = ResultCache::new();
        cache
            .get_or_fetch(&scope(), || async { Ok(Vec::new()) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn scope_normalizes_cpf_and_state() {
        let scope =
            FilterScope::new("ds", 2022, Some("SP"), "111.111.111-11").unwrap();
        assert_eq!(scope.target_cpf, "11111111111");
        assert_eq!(scope.state.as_deref(), Some("sp"));
    }

    #[test]
    fn scope_rejects_short_cpf() {
        let err = FilterScope::new("ds", 2022, None, "123").unwrap_err();
        assert!(matches!(err, EngineError::InvalidScope(_)));
    }

    #[test]
    fn scope_rejects_empty_dataset() {
        let err = FilterScope::new("  ", 2022, None, "11111111111").unwrap_err();
        assert!(matches!(err, EngineError::InvalidScope(_)));
    }
}
