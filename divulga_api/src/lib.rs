//! Client for CKAN-style open-data catalogs (dadosabertos.tse.jus.br and
//! friends): package discovery, package metadata, and resource URL repair.

mod client;
mod errors;
pub mod types;

pub use self::client::CatalogClient;
pub use self::errors::CatalogError;
pub use self::types::{repair_url, DatasetPackage, Resource, ResourceFormat};
