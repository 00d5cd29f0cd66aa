//! The engine facade: catalog → download → extract → normalize → filter,
//! wrapped in the session cache.

use std::sync::Arc;

use divulga_api::CatalogClient;

use crate::archive;
use crate::cache::{FilterScope, ResultCache};
use crate::download::Downloader;
use crate::error::{EngineError, SkipReason};
use crate::filter;
use crate::observer::{FetchObserver, TracingObserver};
use crate::parse::digits_only;
use crate::record::NormalizedRecord;
use crate::retry::RetryPolicy;
use crate::schema::{detect_kind, RecordKind};

/// Brazilian state codes plus the nationwide bundle markers, as they
/// appear as trailing tokens in resource and entry names.
const UF_TOKENS: &[&str] = &[
    "ac", "al", "ap", "am", "ba", "ce", "df", "es", "go", "ma", "mt", "ms", "mg", "pa", "pb",
    "pr", "pe", "pi", "rj", "rn", "rs", "ro", "rr", "sc", "sp", "se", "to", "br", "brasil",
];

/// Acquisition engine for one open-data catalog.
///
/// The single entry point is [`Engine::fetch_records`]. Fetches are
/// best-effort by contract: the only hard failures are catalog
/// unavailability and a malformed scope; everything else shrinks the
/// result and surfaces through the observer. Callers must therefore
/// treat results as best-effort coverage, never as completeness.
pub struct Engine {
    catalog: CatalogClient,
    downloader: Downloader,
    cache: ResultCache,
    observer: Arc<dyn FetchObserver>,
}

impl Engine {
    /// Engine against the production catalog with the default retry
    /// policy and tracing-backed observations.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_parts(
            CatalogClient::new()?,
            RetryPolicy::default(),
            Arc::new(TracingObserver),
        )
    }

    /// Engine against a custom catalog base URL. Tests point this at a
    /// wiremock server.
    pub fn with_base_url(base_url: &str) -> Result<Self, EngineError> {
        Self::with_parts(
            CatalogClient::with_base_url(base_url)?,
            RetryPolicy::default(),
            Arc::new(TracingObserver),
        )
    }

    /// Full control over the catalog client, retry policy, and observer.
    pub fn with_parts(
        catalog: CatalogClient,
        policy: RetryPolicy,
        observer: Arc<dyn FetchObserver>,
    ) -> Result<Self, EngineError> {
        let downloader =
            Downloader::new(policy).map_err(|e| EngineError::Init(e.to_string()))?;
        Ok(Self {
            catalog,
            downloader,
            cache: ResultCache::new(),
            observer,
        })
    }

    /// The underlying catalog client, for package discovery.
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Number of scopes currently cached.
    pub fn cached_scopes(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached scope.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Fetches every normalized record in the scope's dataset whose key
    /// matches the scope's target CPF, restricted to the scope's record
    /// kind when one is set.
    ///
    /// The outcome is cached per scope for the life of the process: a
    /// second call with an equal scope costs no network or CPU work.
    pub async fn fetch_records(
        &self,
        scope: &FilterScope,
    ) -> Result<Arc<Vec<NormalizedRecord>>, EngineError> {
        validate_scope(scope)?;
        self.cache
            .get_or_fetch(scope, || self.fetch_uncached(scope))
            .await
    }

    async fn fetch_uncached(
        &self,
        scope: &FilterScope,
    ) -> Result<Vec<NormalizedRecord>, EngineError> {
        let package = self.catalog.package_info(&scope.dataset).await?;
        tracing::debug!(
            "package {} has {} resources",
            package.name,
            package.resources.len()
        );

        let mut records = Vec::new();
        for resource in &package.resources {
            if let Some(state) = &scope.state {
                if excluded_by_state(&resource.name, state)
                    || excluded_by_state(&resource.url, state)
                {
                    continue;
                }
            }

            let payload = match self
                .downloader
                .download(&resource.url, self.observer.as_ref())
                .await
            {
                Ok(payload) => payload,
                Err(error) => {
                    self.observer.on_skip(&SkipReason::ResourceDownloadFailed {
                        resource: resource.name.clone(),
                        error,
                    });
                    continue;
                }
            };

            archive::for_each_entry(
                &payload,
                &resource.name,
                self.observer.as_ref(),
                |entry_name, reader| {
                    let kind = detect_kind(entry_name);
                    if kind == RecordKind::Unknown {
                        return;
                    }
                    if scope.kind.is_some() && scope.kind != Some(kind) {
                        return;
                    }
                    if let Some(state) = &scope.state {
                        if excluded_by_state(entry_name, state) {
                            return;
                        }
                    }
                    let matches = filter::filter_entry(
                        reader,
                        entry_name,
                        kind,
                        &scope.target_cpf,
                        self.observer.as_ref(),
                    );
                    records.extend(matches);
                },
            );
        }
        Ok(records)
    }
}

fn validate_scope(scope: &FilterScope) -> Result<(), EngineError> {
    if scope.dataset.trim().is_empty() {
        return Err(EngineError::InvalidScope(
            "dataset must not be empty".to_string(),
        ));
    }
    let digits = digits_only(&scope.target_cpf);
    if digits.len() != 11 || digits != scope.target_cpf {
        return Err(EngineError::InvalidScope(
            "target CPF must be exactly 11 digits".to_string(),
        ));
    }
    Ok(())
}

/// The trailing UF token of a file or resource name, when it has one
/// ("receitas_candidatos_2022_SP.csv" → "sp").
fn state_token(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    let stem = lower.rsplit('/').next().unwrap_or(&lower);
    let stem = stem.split('.').next().unwrap_or(stem);
    let last = stem.rsplit('_').next()?;
    UF_TOKENS.contains(&last).then(|| last.to_string())
}

/// A name is excluded only when it explicitly carries a different state's
/// token. Names with no state token, and nationwide bundles, always pass.
fn excluded_by_state(name: &str, state: &str) -> bool {
    match state_token(name) {
        Some(token) => token != state.to_lowercase() && token != "br" && token != "brasil",
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_token_parses_suffixes() {
        assert_eq!(
            state_token("receitas_candidatos_2022_SP.csv").as_deref(),
            Some("sp")
        );
        assert_eq!(
            state_token("http://host/path/despesas_2020_rj.zip").as_deref(),
            Some("rj")
        );
        assert_eq!(
            state_token("prestacao_de_contas_2022_BRASIL.zip").as_deref(),
            Some("brasil")
        );
        assert_eq!(state_token("receitas_candidatos_2022.zip"), None);
        assert_eq!(state_token("leiame.pdf"), None);
    }

    #[test]
    fn state_exclusion_only_hits_other_states() {
        assert!(excluded_by_state("receitas_2022_RJ.csv", "sp"));
        assert!(!excluded_by_state("receitas_2022_SP.csv", "sp"));
        assert!(!excluded_by_state("receitas_2022_BRASIL.zip", "sp"));
        assert!(!excluded_by_state("receitas_2022.zip", "sp"));
    }

    #[test]
    fn validate_scope_requires_digit_cpf() {
        let mut scope = FilterScope::new("ds", 2022, None, "11111111111").unwrap();
        assert!(validate_scope(&scope).is_ok());
        scope.target_cpf = "111.111.111-11".to_string();
        assert!(validate_scope(&scope).is_err());
        scope.target_cpf = "123".to_string();
        assert!(validate_scope(&scope).is_err());
    }
}
