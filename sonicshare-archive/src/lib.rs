//! SonicShare archive library
//!
//! Durable, schema-tolerant storage for audio sample submissions:
//! - [`writer`]: append with header bootstrap
//! - [`reader`]: strict then lenient load, schema drift reporting
//! - [`query`]: free-text search and tag frequency
//! - [`lifecycle`]: reset, clean, export
//! - [`classifier`]: external zero-shot genre classification

pub mod archive;
pub mod classifier;
pub mod lifecycle;
pub mod prompt;
pub mod query;
pub mod reader;
pub mod record;
pub mod render;
pub mod schema;
pub mod store;
pub mod writer;

pub use archive::Archive;
pub use reader::{LoadOutcome, LoadReport};
pub use record::{License, Record, Submission};
pub use schema::{SchemaCheck, SchemaVersion};
pub use store::ArchiveStore;
