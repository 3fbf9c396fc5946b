//! In-memory transport for testing
//!
//! Serves canned answers for every query kind and records each request, so
//! tests can assert on exactly how many round trips a code path performs.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Endpoint, Query, QueryKind, Transport};
use crate::error::{DcorError, Result};

#[derive(Debug, Default)]
struct MockState {
    metadata: Option<Value>,
    size: Option<usize>,
    feature_list: Option<Vec<String>>,
    trace_list: Option<Vec<String>>,
    /// Whole scalar columns
    columns: HashMap<String, Vec<Value>>,
    /// Per-event values of features
    events: HashMap<String, Vec<Value>>,
    /// Per-event values of trace channels
    traces: HashMap<String, Vec<Value>>,
    failing: HashSet<QueryKind>,
    requests: Vec<Query>,
}

/// Mock dataset server
///
/// Clones share state, so a test can keep one handle for inspection while the
/// dataset owns another.
///
/// # Example
///
/// ```rust
/// use dcor::api::{MockTransport, Query, QueryKind, Transport};
///
/// let mock = MockTransport::new("abc123");
/// mock.set_size(42);
///
/// let size = mock.send(&Query::new(QueryKind::Size)).unwrap();
/// assert_eq!(size, 42);
/// assert_eq!(mock.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    endpoint: Endpoint,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create an empty mock for the resource `id` on `example.org`
    ///
    /// # Panics
    ///
    /// Panics if `id` cannot be resolved to an endpoint.
    pub fn new(id: &str) -> Self {
        let endpoint = Endpoint::resolve(id, true, "example.org")
            .unwrap_or_else(|e| panic!("invalid mock identifier: {}", e));
        Self::with_endpoint(endpoint)
    }

    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_metadata(&self, metadata: Value) {
        self.state().metadata = Some(metadata);
    }

    pub fn set_size(&self, size: usize) {
        self.state().size = Some(size);
    }

    pub fn set_feature_list(&self, names: &[&str]) {
        self.state().feature_list = Some(names.iter().map(|n| n.to_string()).collect());
    }

    pub fn set_trace_list(&self, names: &[&str]) {
        self.state().trace_list = Some(names.iter().map(|n| n.to_string()).collect());
    }

    /// Serve a scalar feature both as whole column and event-wise
    pub fn set_scalar_feature(&self, name: &str, values: &[f64]) {
        let values: Vec<Value> = values.iter().map(|v| Value::from(*v)).collect();
        let mut state = self.state();
        state.columns.insert(name.to_string(), values.clone());
        state.events.insert(name.to_string(), values);
    }

    /// Serve a non-scalar feature event-wise
    pub fn set_event_feature(&self, name: &str, events: Vec<Value>) {
        self.state().events.insert(name.to_string(), events);
    }

    /// Serve one trace channel event-wise
    pub fn set_trace(&self, channel: &str, events: Vec<Value>) {
        self.state().traces.insert(channel.to_string(), events);
    }

    /// Make every subsequent query of `kind` fail
    pub fn fail_query(&self, kind: QueryKind) {
        self.state().failing.insert(kind);
    }

    /// Total number of `send` calls
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Number of `send` calls for one query kind
    pub fn calls_for(&self, kind: QueryKind) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|q| q.kind == kind)
            .count()
    }

    /// All requests in the order they were sent
    pub fn requests(&self) -> Vec<Query> {
        self.state().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }
}

/// Look up one event of a per-event series, the way the server rejects bad indices
fn event_of(series: Option<&Vec<Value>>, event: Option<usize>, target: &str) -> Result<Value> {
    let series = series.ok_or_else(|| DcorError::remote(target, "404 Not Found"))?;
    let event = event.ok_or_else(|| DcorError::remote(target, "400 Bad Request"))?;
    series
        .get(event)
        .cloned()
        .ok_or_else(|| DcorError::remote(target, "400 Bad Request"))
}

impl Transport for MockTransport {
    fn send(&self, query: &Query) -> Result<Value> {
        let target = query.target(&self.endpoint);
        let mut state = self.state();
        state.requests.push(query.clone());

        if state.failing.contains(&query.kind) {
            return Err(DcorError::remote(target, "500 Internal Server Error"));
        }

        let not_found = || DcorError::remote(&target, "404 Not Found");
        let name = |n: &Option<String>| n.clone().unwrap_or_default();

        match query.kind {
            QueryKind::Metadata => state.metadata.clone().ok_or_else(not_found),
            QueryKind::Size => state.size.map(Value::from).ok_or_else(not_found),
            QueryKind::FeatureList => state
                .feature_list
                .clone()
                .map(Value::from)
                .ok_or_else(not_found),
            QueryKind::TraceList => state
                .trace_list
                .clone()
                .map(Value::from)
                .ok_or_else(not_found),
            QueryKind::Feature => {
                let feature = name(&query.feature);
                if query.event.is_none() {
                    state
                        .columns
                        .get(&feature)
                        .cloned()
                        .map(Value::Array)
                        .ok_or_else(not_found)
                } else {
                    event_of(state.events.get(&feature), query.event, &target)
                }
            }
            QueryKind::Trace => {
                let channel = name(&query.trace);
                event_of(state.traces.get(&channel), query.event, &target)
            }
        }
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
