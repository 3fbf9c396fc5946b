//! Write-once memoization of dataset-wide queries
//!
//! Only the kinds in [`QueryKind::CACHEABLE`] are memoized. Their answers are
//! fixed for the lifetime of a dataset, so there is no eviction and no
//! refresh. Per-event queries always go to the transport.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::trace;

use super::{decode_count, decode_names, Endpoint, Query, QueryKind, Transport};
use crate::error::Result;

/// Caching front of a [`Transport`]
pub struct QueryCache {
    transport: Box<dyn Transport>,
    cache: RwLock<HashMap<QueryKind, Value>>,
}

impl QueryCache {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.transport.endpoint()
    }

    /// Answer a query, from memory for cacheable kinds
    pub fn get(&self, query: &Query) -> Result<Value> {
        if !query.kind.is_cacheable() {
            return self.transport.send(query);
        }

        if let Some(value) = self.cached(query.kind) {
            trace!(query = %query.kind, "Query cache hit");
            return Ok(value);
        }

        let value = self.transport.send(query)?;

        // A concurrent caller may have filled the slot meanwhile; keep theirs.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(query.kind).or_insert(value).clone())
    }

    /// Whether the answer for `kind` is held in memory
    pub fn is_cached(&self, kind: QueryKind) -> bool {
        self.cached(kind).is_some()
    }

    fn cached(&self, kind: QueryKind) -> Option<Value> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    /// Dataset metadata object
    pub fn metadata(&self) -> Result<Value> {
        self.get(&Query::new(QueryKind::Metadata))
    }

    /// Number of events in the dataset
    pub fn size(&self) -> Result<usize> {
        let query = Query::new(QueryKind::Size);
        let value = self.get(&query)?;
        decode_count(&value, &query.target(self.endpoint()))
    }

    /// Features available in the dataset, in remote order
    pub fn feature_list(&self) -> Result<Vec<String>> {
        let query = Query::new(QueryKind::FeatureList);
        let value = self.get(&query)?;
        decode_names(&value, &query.target(self.endpoint()))
    }

    /// Trace channels available in the dataset (never cached here)
    pub fn trace_list(&self) -> Result<Vec<String>> {
        let query = Query::new(QueryKind::TraceList);
        let value = self.get(&query)?;
        decode_names(&value, &query.target(self.endpoint()))
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("endpoint", &self.endpoint().as_str())
            .finish_non_exhaustive()
    }
}
