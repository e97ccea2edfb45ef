//! Named collections.
//!
//! The registry owns every collection. Its name map has its own lock,
//! independent of the per-collection record locks, so creating or dropping a
//! collection never waits on a running query and vice versa.

use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::error::{Result, VectorDbError};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Summary entry returned by [`CollectionRegistry::list_collections`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    /// Collections carry no metadata of their own; always `None`.
    pub metadata: Option<()>,
}

/// The set of collections reachable by name.
///
/// Handles returned by `create_collection` / `get_collection` are shared
/// references. Once a name is deleted (or the registry reset) no lookup
/// returns that collection again; a caller still holding the handle works
/// on a detached collection.
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    config: StoreConfig,
    collections: RwLock<IndexMap<String, Arc<Collection>>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            collections: RwLock::new(IndexMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create an empty collection.
    ///
    /// # Errors
    /// - `CollectionAlreadyExists` if the name is registered
    /// - `InvalidCollectionName` if the name is empty
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        validate_collection_name(name)?;

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(VectorDbError::CollectionAlreadyExists {
                name: name.to_string(),
            });
        }

        let collection = Arc::new(Collection::with_config(name, self.config));
        collections.insert(name.to_string(), Arc::clone(&collection));
        info!(collection = name, "Collection created");
        Ok(collection)
    }

    /// Look up a collection by name.
    ///
    /// # Errors
    /// - `CollectionNotFound` if the name is not registered
    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| VectorDbError::CollectionNotFound {
                name: name.to_string(),
            })
    }

    /// Return the named collection, creating it if absent.
    pub fn get_or_create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        validate_collection_name(name)?;

        let mut collections = self.collections.write();
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let collection = Arc::new(Collection::with_config(name, self.config));
        collections.insert(name.to_string(), Arc::clone(&collection));
        info!(collection = name, "Collection created");
        Ok(collection)
    }

    /// Every registered collection, in creation order.
    pub fn list_collections(&self) -> Vec<CollectionInfo> {
        self.collections
            .read()
            .keys()
            .map(|name| CollectionInfo {
                name: name.clone(),
                metadata: None,
            })
            .collect()
    }

    /// Remove a collection.
    ///
    /// # Errors
    /// - `CollectionNotFound` if the name is not registered
    pub fn delete_collection(&self, name: &str) -> Result<()> {
        // shift_remove keeps the remaining creation order
        self.collections
            .write()
            .shift_remove(name)
            .ok_or_else(|| VectorDbError::CollectionNotFound {
                name: name.to_string(),
            })?;
        info!(collection = name, "Collection deleted");
        Ok(())
    }

    /// Remove every collection.
    pub fn reset(&self) {
        let mut collections = self.collections.write();
        let dropped = collections.len();
        collections.clear();
        info!(dropped, "Registry reset");
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }
}

fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VectorDbError::InvalidCollectionName {
            reason: "name must not be empty".to_string(),
        });
    }
    Ok(())
}
