//! HTTP client for the CKAN action API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::CatalogError;
use crate::types::{repair_url, DatasetPackage, Envelope};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_BASE_URL: &str = "https://dadosabertos.tse.jus.br";

/// Client for the CKAN action API of an open-data portal.
///
/// Each operation performs exactly one catalog request. Any failure here
/// is a [`CatalogError`] and is meant to propagate: resource-level
/// problems are the downstream stages' concern, catalog-level ones are
/// nobody else's.
pub struct CatalogClient {
    base_url: Url,
    client: reqwest::Client,
}

impl CatalogClient {
    /// Creates a client pointing at the production electoral-data portal.
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::Rejected(format!("invalid base url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("failed to build HTTP client: {e}");
                CatalogError::Unavailable
            })?;
        Ok(Self { base_url, client })
    }

    /// The catalog base URL, used to resolve relative resource links.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn action<T>(&self, action: &str, query: &[(&str, &str)]) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(&format!("/api/3/action/{action}"))
            .map_err(|e| CatalogError::Rejected(format!("invalid action url: {e}")))?;
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("catalog request {action} failed: {e}");
                CatalogError::Unavailable
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("failed to read catalog response body: {e}");
            CatalogError::Unavailable
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("catalog {action} failed with status {status}: {snippet}");
            return Err(CatalogError::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let envelope = serde_json::from_str::<Envelope<T>>(&body).map_err(|e| {
            tracing::error!("malformed catalog envelope: {e} | body: {}", truncate_body(&body));
            CatalogError::Rejected(format!("malformed envelope: {e}"))
        })?;
        if !envelope.success {
            return Err(CatalogError::Rejected(
                "catalog reported success=false".to_string(),
            ));
        }
        envelope
            .result
            .ok_or_else(|| CatalogError::Rejected("envelope missing result".to_string()))
    }

    /// Lists every package name the catalog knows about.
    pub async fn list_packages(&self) -> Result<Vec<String>, CatalogError> {
        self.action("package_list", &[]).await
    }

    /// Fetches one package with its resources. Resource URLs are repaired
    /// (stray `"URL: "` prefixes stripped, relative paths resolved against
    /// the catalog base) before being returned.
    pub async fn package_info(&self, id: &str) -> Result<DatasetPackage, CatalogError> {
        let mut package: DatasetPackage = self.action("package_show", &[("id", id)]).await?;
        for resource in &mut package.resources {
            resource.url = repair_url(&resource.url, &self.base_url);
        }
        Ok(package)
    }

    /// Finds package names containing every query term, and the year when
    /// one is given. One `package_list` call, filtered client-side.
    pub async fn search_packages(
        &self,
        terms: &[&str],
        year_hint: Option<u16>,
    ) -> Result<Vec<String>, CatalogError> {
        let names = self.list_packages().await?;
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let year = year_hint.map(|y| y.to_string());
        Ok(names
            .into_iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                terms.iter().all(|t| lower.contains(t))
                    && year.as_deref().map_or(true, |y| lower.contains(y))
            })
            .collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    // MAX may land inside a multi-byte character; back off to a boundary.
    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...[truncated]", &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::truncate_body;

    #[test]
    fn truncate_body_leaves_short_bodies_alone() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_cuts_long_bodies() {
        let body = "x".repeat(5000);
        let snippet = truncate_body(&body);
        assert_eq!(snippet.len(), 2000 + "...[truncated]".len());
        assert!(snippet.ends_with("...[truncated]"));
    }

    #[test]
    fn truncate_body_respects_multibyte_boundaries() {
        // 1000 three-byte characters: byte 2000 falls mid-character.
        let body = "€".repeat(1000);
        let snippet = truncate_body(&body);
        assert!(snippet.ends_with("...[truncated]"));
        assert_eq!(snippet.trim_end_matches("...[truncated]"), "€".repeat(666));
    }
}
