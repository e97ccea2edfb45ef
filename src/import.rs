//! Loading records from JSON files.
//!
//! The file holds an array of records:
//!
//! ```json
//! [
//!   {"id": "sku-1", "embedding": [0.1, 0.9], "metadata": {"category": "shoes"}},
//!   {"id": "sku-2", "embedding": [0.8, 0.2]}
//! ]
//! ```

use crate::collection::Collection;
use crate::error::{Result, VectorDbError};
use crate::record::VectorRecord;
use std::path::Path;

/// Read and parse a records file.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<VectorRecord>> {
    let bytes = std::fs::read(path.as_ref())?;
    serde_json::from_slice(&bytes).map_err(|e| VectorDbError::SerializationError(e.to_string()))
}

/// Upsert the records of a file into `collection`, returning how many were
/// loaded.
pub fn import_into(collection: &Collection, path: impl AsRef<Path>) -> Result<usize> {
    let records = load_records(path)?;
    let count = records.len();

    let mut ids = Vec::with_capacity(count);
    let mut vectors = Vec::with_capacity(count);
    let mut metadatas = Vec::with_capacity(count);
    for record in records {
        ids.push(record.id);
        vectors.push(record.vector);
        metadatas.push(record.metadata);
    }

    collection.upsert(ids, vectors, Some(metadatas))?;
    Ok(count)
}
