//! Feature directory of a remote dataset
//!
//! Resolves a feature name to one of three shapes:
//!
//! - scalar features are downloaded as a whole column once and served from
//!   memory afterwards,
//! - the reserved `trace` feature yields a [`TraceDirectory`],
//! - every other feature yields an event-wise [`EventFeature`].
//!
//! Membership and iteration only consult the availability list fetched at
//! construction and never touch the network.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

use super::events::{decode_number, EventFeature, TraceDirectory};
use crate::api::{Endpoint, Query, QueryCache, QueryKind};
use crate::definitions::{self, TRACE};
use crate::error::{DcorError, Result};

/// A resolved feature
#[derive(Debug, Clone)]
pub enum FeatureValue<'a> {
    /// Whole scalar column held in memory
    Scalar(Arc<[f64]>),
    /// Event-wise access to a non-scalar feature
    Events(EventFeature<'a>),
    /// Channels of the `trace` feature
    Traces(TraceDirectory<'a>),
}

impl<'a> FeatureValue<'a> {
    pub fn as_scalar(&self) -> Option<&Arc<[f64]>> {
        match self {
            FeatureValue::Scalar(column) => Some(column),
            _ => None,
        }
    }

    pub fn into_scalar(self) -> Option<Arc<[f64]>> {
        match self {
            FeatureValue::Scalar(column) => Some(column),
            _ => None,
        }
    }

    pub fn into_events(self) -> Option<EventFeature<'a>> {
        match self {
            FeatureValue::Events(events) => Some(events),
            _ => None,
        }
    }

    pub fn into_traces(self) -> Option<TraceDirectory<'a>> {
        match self {
            FeatureValue::Traces(traces) => Some(traces),
            _ => None,
        }
    }
}

/// Mapping from feature name to feature data
pub struct FeatureDirectory {
    api: Arc<QueryCache>,
    features: Vec<String>,
    scalar_cache: RwLock<HashMap<String, Arc<[f64]>>>,
    trace_channels: OnceLock<Vec<String>>,
}

impl FeatureDirectory {
    /// Create the directory, fetching the availability list
    pub fn new(api: Arc<QueryCache>) -> Result<Self> {
        let features = api.feature_list()?;
        debug!(count = features.len(), "Fetched feature list");
        Ok(Self {
            api,
            features,
            scalar_cache: RwLock::new(HashMap::new()),
            trace_channels: OnceLock::new(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.api.endpoint()
    }

    /// Whether the dataset provides `name`
    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    /// Available feature names in remote order
    pub fn keys(&self) -> &[String] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether the column of `name` is already held in memory
    pub fn is_materialized(&self, name: &str) -> bool {
        self.cached_column(name).is_some()
    }

    /// Resolve a feature name
    pub fn get(&self, name: &str) -> Result<FeatureValue<'_>> {
        if !definitions::is_feature(name) {
            return Err(DcorError::UnknownFeature(name.to_string()));
        }
        if !self.contains(name) {
            return Err(DcorError::FeatureNotFound(name.to_string()));
        }

        if let Some(column) = self.cached_column(name) {
            trace!(feature = name, "Scalar cache hit");
            return Ok(FeatureValue::Scalar(column));
        }

        if definitions::is_scalar(name) {
            let column = self.download_column(name)?;
            let mut cache = self
                .scalar_cache
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let column = cache.entry(name.to_string()).or_insert(column).clone();
            return Ok(FeatureValue::Scalar(column));
        }

        if name == TRACE {
            let channels = self.trace_channels()?;
            return Ok(FeatureValue::Traces(TraceDirectory::new(&self.api, channels)));
        }

        Ok(FeatureValue::Events(EventFeature::new(name, &self.api)))
    }

    fn cached_column(&self, name: &str) -> Option<Arc<[f64]>> {
        self.scalar_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn download_column(&self, name: &str) -> Result<Arc<[f64]>> {
        let query = Query::new(QueryKind::Feature).with_feature(name);
        let value = self.api.get(&query)?;
        let malformed =
            |reason: String| DcorError::remote(query.target(self.api.endpoint()), reason);

        let items = match value {
            Value::Array(items) => items,
            other => return Err(malformed(format!("expected a list of numbers, got {}", other))),
        };
        let column = items
            .iter()
            .map(decode_number)
            .collect::<std::result::Result<Vec<f64>, String>>()
            .map_err(malformed)?;

        debug!(feature = name, events = column.len(), "Downloaded scalar feature");
        Ok(column.into())
    }

    /// Trace channel names, fetched on first use
    fn trace_channels(&self) -> Result<&[String]> {
        if let Some(channels) = self.trace_channels.get() {
            return Ok(channels);
        }
        let channels = self.api.trace_list()?;
        Ok(self.trace_channels.get_or_init(|| channels))
    }
}

impl std::fmt::Debug for FeatureDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureDirectory")
            .field("endpoint", &self.endpoint().as_str())
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}
