//! The stored unit of a collection and batch assembly

use crate::error::{Result, VectorDbError};
use crate::metadata::Metadata;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// One logical record: identifier, embedding, metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    #[serde(rename = "embedding")]
    pub vector: Vector,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, vector: impl Into<Vector>) -> Self {
        Self {
            id: id.into(),
            vector: vector.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Zip parallel `ids` / `vectors` / `metadatas` into records.
///
/// `vectors` and `metadatas` (when given) must have one entry per id. Missing
/// metadata defaults to an empty map. Ids must be non-empty and vectors finite.
pub fn zip_records(
    ids: Vec<String>,
    vectors: Vec<Vector>,
    metadatas: Option<Vec<Metadata>>,
) -> Result<Vec<VectorRecord>> {
    if vectors.len() != ids.len() {
        return Err(VectorDbError::LengthMismatch {
            field: "vectors",
            expected: ids.len(),
            actual: vectors.len(),
        });
    }
    if let Some(metadatas) = &metadatas {
        if metadatas.len() != ids.len() {
            return Err(VectorDbError::LengthMismatch {
                field: "metadatas",
                expected: ids.len(),
                actual: metadatas.len(),
            });
        }
    }

    let metadatas = metadatas.unwrap_or_else(|| vec![Metadata::new(); ids.len()]);

    ids.into_iter()
        .zip(vectors)
        .zip(metadatas)
        .map(|((id, vector), metadata)| {
            if id.is_empty() {
                return Err(VectorDbError::InvalidArgument {
                    reason: "record id must not be empty".to_string(),
                });
            }
            vector.validate()?;
            Ok(VectorRecord {
                id,
                vector,
                metadata,
            })
        })
        .collect()
}
