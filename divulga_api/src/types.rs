//! Catalog types: the CKAN action envelope, dataset packages, and their
//! downloadable resources.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// CKAN action-API envelope: `{"success": bool, "result": ...}`.
#[derive(Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub result: Option<T>,
}

/// One logical dataset with its downloadable files. Immutable within a
/// session once fetched from the catalog.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatasetPackage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// One downloadable file belonging to a package.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Resource {
    #[serde(default)]
    pub name: String,
    /// Declared format as the catalog reports it. Advisory only; the
    /// extractor sniffs the actual payload.
    #[serde(default, deserialize_with = "format_from_string")]
    pub format: ResourceFormat,
    pub url: String,
    /// Declared byte size, when the catalog knows it.
    #[serde(default)]
    pub size: Option<u64>,
}

/// Declared resource format, parsed case-insensitively.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResourceFormat {
    Csv,
    Txt,
    Zip,
    #[default]
    Other,
}

impl From<&str> for ResourceFormat {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "csv" => Self::Csv,
            "txt" => Self::Txt,
            "zip" => Self::Zip,
            _ => Self::Other,
        }
    }
}

fn format_from_string<'de, D>(deserializer: D) -> Result<ResourceFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(ResourceFormat::from).unwrap_or_default())
}

/// Repairs a resource URL as published by the catalog.
///
/// Some vintages prefix the URL field with a literal `"URL: "`, and some
/// publish paths relative to the portal root; both are corrected here.
/// A URL that cannot be repaired is returned as-is and left for the
/// downloader to fail on, so one bad entry never blocks its siblings.
pub fn repair_url(raw: &str, base: &Url) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("URL: ").unwrap_or(trimmed).trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    match base.join(trimmed) {
        Ok(joined) => joined.to_string(),
        Err(_) => trimmed.to_string(),
    }
}
