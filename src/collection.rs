//! A named collection of vector records with exact cosine search.
//!
//! Records live in a single ordered `Vec<VectorRecord>` behind a
//! `parking_lot::RwLock`. Mutations hold the write lock for the whole batch,
//! so a query issued after a mutation returns never observes the state
//! before it. Reads share the lock and see a consistent snapshot.

use crate::config::{StoreConfig, DEFAULT_N_RESULTS};
use crate::error::{Result, VectorDbError};
use crate::metadata::{Metadata, MetadataFilter};
use crate::record::{zip_records, VectorRecord};
use crate::similarity;
use crate::vector::Vector;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Optional fields a query returns in addition to ids and distances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    pub metadatas: bool,
    pub embeddings: bool,
}

impl Include {
    /// Parse field names. Recognizes `"metadatas"` and `"embeddings"`;
    /// anything else is ignored.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut include = Include::default();
        for name in names {
            match name.as_ref() {
                "metadatas" => include.metadatas = true,
                "embeddings" => include.embeddings = true,
                _ => {}
            }
        }
        include
    }

    pub fn all() -> Self {
        Include {
            metadatas: true,
            embeddings: true,
        }
    }
}

/// Parameters of a single-vector similarity query
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub vector: Vector,
    pub n_results: usize,
    pub filter: MetadataFilter,
    pub include: Include,
}

impl QueryRequest {
    pub fn new(vector: impl Into<Vector>) -> Self {
        Self {
            vector: vector.into(),
            n_results: DEFAULT_N_RESULTS,
            filter: MetadataFilter::new(),
            include: Include::default(),
        }
    }

    pub fn n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    pub fn filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }
}

/// Ranked query output, closest first. `metadatas` and `embeddings` are
/// present only when requested through [`Include`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub distances: Vec<f32>,
    pub metadatas: Option<Vec<Metadata>>,
    pub embeddings: Option<Vec<Vector>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The first records of a collection in storage order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeekResult {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vector>,
    pub metadatas: Vec<Metadata>,
}

/// A named set of records.
#[derive(Debug)]
pub struct Collection {
    name: String,
    config: StoreConfig,
    records: RwLock<Vec<VectorRecord>>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, StoreConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: StoreConfig) -> Self {
        Self {
            name: name.into(),
            config,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Append records. Ids are not checked against existing records, so
    /// adding an id twice stores two records; use [`Collection::upsert`] to
    /// replace.
    pub fn add<I, S, V>(&self, ids: I, vectors: V, metadatas: Option<Vec<Metadata>>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        V: IntoIterator,
        V::Item: Into<Vector>,
    {
        let batch = collect_batch(ids, vectors, metadatas)?;
        let mut records = self.records.write();
        self.check_dimensions(&records, &batch, 0)?;

        let added = batch.len();
        records.extend(batch);
        debug!(collection = %self.name, added, total = records.len(), "Records added");
        Ok(())
    }

    /// Insert or fully replace records by id.
    ///
    /// Existing records whose id appears in the input are removed first and
    /// the input is then appended, so a colliding id gets the new vector and
    /// metadata with nothing merged from the old record. An id repeated
    /// within one batch is rejected.
    pub fn upsert<I, S, V>(
        &self,
        ids: I,
        vectors: V,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        V: IntoIterator,
        V::Item: Into<Vector>,
    {
        let batch = collect_batch(ids, vectors, metadatas)?;

        let mut incoming = HashSet::with_capacity(batch.len());
        for record in &batch {
            if !incoming.insert(record.id.clone()) {
                return Err(VectorDbError::InvalidArgument {
                    reason: format!("id {} appears more than once in upsert", record.id),
                });
            }
        }

        let mut records = self.records.write();
        let replaced = records
            .iter()
            .filter(|r| incoming.contains(&r.id))
            .count();
        // Records about to be replaced do not pin the dimension.
        self.check_dimensions(&records, &batch, replaced)?;

        records.retain(|r| !incoming.contains(&r.id));
        let upserted = batch.len();
        records.extend(batch);
        debug!(collection = %self.name, upserted, replaced, total = records.len(), "Records upserted");
        Ok(())
    }

    /// Remove every record whose id is listed. Unknown ids are ignored and
    /// surviving records keep their relative order. Returns how many records
    /// were removed.
    pub fn delete<I, S>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let doomed: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| !doomed.contains(&r.id));
        let removed = before - records.len();
        debug!(collection = %self.name, removed, total = records.len(), "Records deleted");
        removed
    }

    /// Rank the records passing `request.filter` by cosine distance to
    /// `request.vector` and return the `n_results` closest.
    ///
    /// Equal distances keep storage order. Zero vectors rank last.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
        request.vector.validate()?;

        let records = self.records.read();
        if self.config.enforce_dimension {
            if let Some(expected) = records.first().map(|r| r.vector.dimension()) {
                if request.vector.dimension() != expected {
                    return Err(VectorDbError::DimensionMismatch {
                        expected,
                        actual: request.vector.dimension(),
                    });
                }
            }
        }

        let candidates: Vec<(usize, &[f32])> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| request.filter.matches(&r.metadata))
            .map(|(i, r)| (i, r.vector.as_slice()))
            .collect();

        let ranked = similarity::top_k(
            request.vector.as_slice(),
            &candidates,
            request.n_results,
            self.config.parallel_threshold,
        );

        debug!(
            collection = %self.name,
            candidates = candidates.len(),
            returned = ranked.len(),
            "Query evaluated"
        );

        let hits = ranked.iter().map(|r| &records[r.index]);
        Ok(QueryResult {
            ids: hits.clone().map(|r| r.id.clone()).collect(),
            distances: ranked.iter().map(|r| r.distance).collect(),
            metadatas: request
                .include
                .metadatas
                .then(|| hits.clone().map(|r| r.metadata.clone()).collect()),
            embeddings: request
                .include
                .embeddings
                .then(|| hits.clone().map(|r| r.vector.clone()).collect()),
        })
    }

    /// Return the first `limit` records in storage order.
    pub fn peek(&self, limit: usize) -> PeekResult {
        let records = self.records.read();
        let mut result = PeekResult::default();
        for record in records.iter().take(limit) {
            result.ids.push(record.id.clone());
            result.embeddings.push(record.vector.clone());
            result.metadatas.push(record.metadata.clone());
        }
        result
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// First record stored under `id`
    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    /// All ids in storage order
    pub fn ids(&self) -> Vec<String> {
        self.records.read().iter().map(|r| r.id.clone()).collect()
    }

    /// Dimension of the stored vectors, taken from the first record
    pub fn dimension(&self) -> Option<usize> {
        self.records.read().first().map(|r| r.vector.dimension())
    }

    /// Check a batch against the collection dimension. `replaced` records
    /// are about to be removed; when they are all of the current records,
    /// the batch may set a new dimension.
    fn check_dimensions(
        &self,
        records: &[VectorRecord],
        batch: &[VectorRecord],
        replaced: usize,
    ) -> Result<()> {
        if !self.config.enforce_dimension {
            return Ok(());
        }

        let current = (records.len() > replaced).then(|| records[0].vector.dimension());
        let Some(expected) = current.or_else(|| batch.first().map(|r| r.vector.dimension())) else {
            return Ok(());
        };

        for record in batch {
            if record.vector.dimension() != expected {
                return Err(VectorDbError::DimensionMismatch {
                    expected,
                    actual: record.vector.dimension(),
                });
            }
        }
        Ok(())
    }
}

fn collect_batch<I, S, V>(
    ids: I,
    vectors: V,
    metadatas: Option<Vec<Metadata>>,
) -> Result<Vec<VectorRecord>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    V: IntoIterator,
    V::Item: Into<Vector>,
{
    zip_records(
        ids.into_iter().map(Into::into).collect(),
        vectors.into_iter().map(Into::into).collect(),
        metadatas,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn meta(category: &str) -> Metadata {
        Metadata::new().with("category", category)
    }

    #[test]
    fn test_add_appends_in_order() {
        let c = Collection::new("products");
        c.add(["a", "b"], [[1.0, 0.0], [0.0, 1.0]], None).unwrap();
        c.add(["c"], [[0.5, 0.5]], None).unwrap();

        assert_eq!(c.count(), 3);
        assert_eq!(c.ids(), vec!["a", "b", "c"]);
        assert_eq!(c.peek(2).ids, vec!["a", "b"]);
    }

    #[test]
    fn test_add_keeps_duplicate_ids() {
        let c = Collection::new("products");
        c.add(["a"], [[1.0, 0.0]], None).unwrap();
        c.add(["a"], [[0.0, 1.0]], None).unwrap();

        assert_eq!(c.count(), 2);
        assert_eq!(c.get("a").unwrap().vector.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn test_rejected_batch_leaves_collection_untouched() {
        let c = Collection::new("products");
        c.add(["a"], [[1.0, 0.0]], None).unwrap();

        let err = c.add(["b", "c"], [vec![1.0, 0.0], vec![1.0, 0.0, 0.0]], None);
        assert!(matches!(err, Err(VectorDbError::DimensionMismatch { expected: 2, actual: 3 })));
        let err = c.add(["b", "c"], [[1.0, 0.0]], None);
        assert!(matches!(err, Err(VectorDbError::LengthMismatch { .. })));

        assert_eq!(c.ids(), vec!["a"]);
    }

    #[test]
    fn test_dimension_not_enforced_when_disabled() {
        let config = StoreConfig {
            enforce_dimension: false,
            ..StoreConfig::default()
        };
        let c = Collection::with_config("loose", config);
        c.add(["a", "b"], [vec![1.0, 0.0], vec![1.0, 0.0, 0.0]], None).unwrap();

        let result = c.query(&QueryRequest::new([1.0, 0.0])).unwrap();
        assert_eq!(result.ids, vec!["a", "b"]);
        assert_eq!(result.distances[1], f32::INFINITY);
    }

    #[test]
    fn test_upsert_replaces_never_merges() {
        let c = Collection::new("products");
        c.add(
            ["a", "b"],
            [[1.0, 0.0], [0.0, 1.0]],
            Some(vec![Metadata::new().with("x", 1), meta("shoes")]),
        )
        .unwrap();
        c.upsert(["a"], [[0.6, 0.8]], Some(vec![Metadata::new().with("y", 2)]))
            .unwrap();

        assert_eq!(c.count(), 2);
        assert_eq!(c.ids(), vec!["b", "a"]);
        let a = c.get("a").unwrap();
        assert_eq!(a.vector.as_slice(), &[0.6, 0.8]);
        assert_eq!(a.metadata, Metadata::new().with("y", 2));
        assert!(a.metadata.get("x").is_none());
    }

    #[test]
    fn test_upsert_collapses_duplicates_from_add() {
        let c = Collection::new("products");
        c.add(["a", "a"], [[1.0, 0.0], [0.0, 1.0]], None).unwrap();
        c.upsert(["a"], [[0.5, 0.5]], None).unwrap();
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_upsert_rejects_repeated_id_in_batch() {
        let c = Collection::new("products");
        let err = c.upsert(["a", "a"], [[1.0, 0.0], [0.0, 1.0]], None);
        assert!(matches!(err, Err(VectorDbError::InvalidArgument { .. })));
        assert!(c.is_empty());
    }

    #[test]
    fn test_upsert_of_every_record_may_change_dimension() {
        let c = Collection::new("products");
        c.add(["a"], [[1.0, 0.0]], None).unwrap();
        c.upsert(["a"], [[1.0, 0.0, 0.0]], None).unwrap();
        assert_eq!(c.dimension(), Some(3));
    }

    #[test]
    fn test_delete_is_idempotent_and_order_preserving() {
        let c = Collection::new("products");
        c.add(["a", "b", "c", "d"], [[1.0], [2.0], [3.0], [4.0]], None)
            .unwrap();

        assert_eq!(c.delete(["b", "missing"]), 1);
        assert_eq!(c.delete(["b"]), 0);
        assert_eq!(c.ids(), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_query_scenario() {
        let c = Collection::new("products");
        c.add(["A", "B", "C"], [[1.0, 0.0], [0.0, 1.0], [0.9, 0.1]], None)
            .unwrap();

        let result = c.query(&QueryRequest::new([1.0, 0.0]).n_results(2)).unwrap();
        assert_eq!(result.ids, vec!["A", "C"]);
        assert_relative_eq!(result.distances[0], 0.0, epsilon = 1e-6);

        let all = c.query(&QueryRequest::new([1.0, 0.0])).unwrap();
        assert!(all.distances[1] > 0.0 && all.distances[1] < all.distances[2]);
        assert_eq!(result.metadatas, None);
        assert_eq!(result.embeddings, None);
    }

    #[test]
    fn test_query_filter_and_include() {
        let c = Collection::new("products");
        c.add(
            ["tv", "shirt", "phone"],
            [[1.0, 0.0], [1.0, 0.1], [0.0, 1.0]],
            Some(vec![meta("electronics"), meta("apparel"), meta("electronics")]),
        )
        .unwrap();

        let request = QueryRequest::new([1.0, 0.0])
            .filter(MetadataFilter::new().eq("category", "electronics"))
            .include(Include::from_names(&["metadatas", "embeddings", "documents"]));
        let result = c.query(&request).unwrap();

        assert_eq!(result.ids, vec!["tv", "phone"]);
        assert_eq!(
            result.metadatas,
            Some(vec![meta("electronics"), meta("electronics")])
        );
        assert_eq!(
            result.embeddings,
            Some(vec![Vector::from([1.0, 0.0]), Vector::from([0.0, 1.0])])
        );
    }

    #[test]
    fn test_query_no_match_is_empty() {
        let c = Collection::new("products");
        assert!(c.query(&QueryRequest::new([1.0, 0.0])).unwrap().is_empty());

        c.add(["a"], [[1.0, 0.0]], Some(vec![meta("apparel")])).unwrap();
        let request =
            QueryRequest::new([1.0, 0.0]).filter(MetadataFilter::new().eq("category", "toys"));
        assert!(c.query(&request).unwrap().is_empty());
    }

    #[test]
    fn test_query_rejects_bad_vectors() {
        let c = Collection::new("products");
        c.add(["a"], [[1.0, 0.0]], None).unwrap();

        assert!(matches!(
            c.query(&QueryRequest::new([1.0, 0.0, 0.0])),
            Err(VectorDbError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(matches!(
            c.query(&QueryRequest::new([f32::NAN, 0.0])),
            Err(VectorDbError::InvalidVector { .. })
        ));
    }

    #[test]
    fn test_zero_query_vector_ranks_everything_last() {
        let c = Collection::new("products");
        c.add(["a", "b"], [[1.0, 0.0], [0.0, 1.0]], None).unwrap();

        let result = c.query(&QueryRequest::new([0.0, 0.0])).unwrap();
        assert_eq!(result.ids, vec!["a", "b"]);
        assert!(result.distances.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_query_with_extreme_magnitudes() {
        let c = Collection::new("products");
        c.add(["huge_mixed", "exact"], [[1e20, -1e20], [1.0, 1.0]], None)
            .unwrap();

        let result = c.query(&QueryRequest::new([1e20, 1e20])).unwrap();
        assert_eq!(result.ids, vec!["exact", "huge_mixed"]);
        assert_relative_eq!(result.distances[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(result.distances[1], 1.0, epsilon = 1e-6);

        let c = Collection::new("directions");
        c.add(["opposite", "orthogonal"], [[-1e20, 0.0], [0.0, 1.0]], None)
            .unwrap();
        let result = c.query(&QueryRequest::new([1.0, 0.0])).unwrap();
        assert_eq!(result.ids, vec!["orthogonal", "opposite"]);
        assert_relative_eq!(result.distances[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_peek_returns_full_records() {
        let c = Collection::new("products");
        c.add(["a", "b"], [[1.0, 0.0], [0.0, 1.0]], Some(vec![meta("x"), meta("y")]))
            .unwrap();

        let peek = c.peek(10);
        assert_eq!(peek.ids, vec!["a", "b"]);
        assert_eq!(peek.embeddings[1], Vector::from([0.0, 1.0]));
        assert_eq!(peek.metadatas[0], meta("x"));
        assert!(c.peek(0).ids.is_empty());
    }
}
