//! # VectorDB In-Memory
//!
//! An in-memory vector store organised as named collections.
//!
//! This library provides:
//! - A registry of named collections
//! - Record storage (id, embedding, metadata) with add / upsert / delete
//! - Exact nearest-neighbor queries ranked by cosine distance
//! - Equality filters over record metadata
//!
//! ## Example
//!
//! ```rust
//! use vectordb_in_memory::{CollectionRegistry, Metadata, MetadataFilter, QueryRequest};
//!
//! let registry = CollectionRegistry::new();
//! let products = registry.get_or_create_collection("products").unwrap();
//!
//! products
//!     .add(
//!         ["tv", "shirt"],
//!         [[0.9, 0.1], [0.1, 0.9]],
//!         Some(vec![
//!             Metadata::new().with("category", "electronics"),
//!             Metadata::new().with("category", "apparel"),
//!         ]),
//!     )
//!     .unwrap();
//!
//! let request = QueryRequest::new([1.0, 0.0])
//!     .n_results(5)
//!     .filter(MetadataFilter::new().eq("category", "electronics"));
//! let result = products.query(&request).unwrap();
//! assert_eq!(result.ids, vec!["tv"]);
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod import;
pub mod metadata;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod server;
pub mod similarity;
pub mod vector;

pub use collection::{Collection, Include, PeekResult, QueryRequest, QueryResult};
pub use config::{StoreConfig, DEFAULT_N_RESULTS, DEFAULT_PEEK_LIMIT};
pub use error::{Result, VectorDbError};
pub use metadata::{Metadata, MetadataFilter, MetadataValue};
pub use metrics::MetricsCollector;
pub use record::VectorRecord;
pub use registry::{CollectionInfo, CollectionRegistry};
pub use vector::Vector;
