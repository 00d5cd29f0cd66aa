//! Acquisition and streaming-normalization engine for bulk election and
//! campaign-finance open data.
//!
//! The pipeline is catalog → download → extract → normalize → filter,
//! with a session-scoped result cache wrapped around the whole chain at
//! the (dataset, scope) granularity. Every stage past the catalog is
//! best-effort: one unreachable resource, corrupt archive entry, or
//! malformed row never aborts a batch. [`Engine::fetch_records`] is the
//! single call orchestration layers consume; they map the yielded
//! records into their own persistence schema, the engine itself writes
//! nothing.

pub mod archive;
pub mod cache;
pub mod download;
pub mod error;
pub mod filter;
pub mod observer;
pub mod parse;
pub mod record;
pub mod retry;
pub mod schema;

mod engine;

pub use divulga_api;
pub use divulga_api::{CatalogClient, CatalogError, DatasetPackage, Resource, ResourceFormat};

pub use self::cache::{FilterScope, ResultCache};
pub use self::download::Downloader;
pub use self::engine::Engine;
pub use self::error::{DownloadError, EngineError, SkipReason};
pub use self::observer::{FetchObserver, NoopObserver, TracingObserver};
pub use self::record::{
    AssetRecord, CandidateRecord, DonorRecord, ExpenseRecord, NormalizedRecord, RawRow,
    RevenueRecord,
};
pub use self::retry::RetryPolicy;
pub use self::schema::{detect_kind, RecordKind};
