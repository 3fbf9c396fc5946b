/*!
 * Query layer for the DCOR `dcserv` API
 *
 * - `endpoint`: locator resolution and identity hashing
 * - `transport`: single network round trips (HTTP)
 * - `mock`: in-memory transport for tests
 * - `cache`: write-once memoization of dataset-wide queries
 */

pub mod cache;
pub mod endpoint;
pub mod mock;
pub mod transport;

use serde_json::Value;
use std::fmt;

use crate::error::{DcorError, Result};

pub use cache::QueryCache;
pub use endpoint::Endpoint;
pub use mock::MockTransport;
pub use transport::{HttpTransport, Transport};

/// Kind of query understood by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Dataset configuration (object)
    Metadata,
    /// Number of events (integer)
    Size,
    /// Features present in the dataset (list of names)
    FeatureList,
    /// Whole scalar column, or one event of any feature
    Feature,
    /// Trace channels present in the dataset (list of names)
    TraceList,
    /// One event of one trace channel
    Trace,
}

impl QueryKind {
    /// Dataset-wide queries whose answer never changes
    pub const CACHEABLE: [QueryKind; 3] =
        [QueryKind::Metadata, QueryKind::Size, QueryKind::FeatureList];

    /// Wire name of the query
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Metadata => "metadata",
            QueryKind::Size => "size",
            QueryKind::FeatureList => "feature_list",
            QueryKind::Feature => "feature",
            QueryKind::TraceList => "trace_list",
            QueryKind::Trace => "trace",
        }
    }

    pub fn is_cacheable(&self) -> bool {
        Self::CACHEABLE.contains(self)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against a dataset endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: QueryKind,
    pub feature: Option<String>,
    pub trace: Option<String>,
    pub event: Option<usize>,
}

impl Query {
    pub fn new(kind: QueryKind) -> Self {
        Self {
            kind,
            feature: None,
            trace: None,
            event: None,
        }
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn with_event(mut self, event: usize) -> Self {
        self.event = Some(event);
        self
    }

    /// Query parameters in wire order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.kind.as_str().to_string())];
        if let Some(ref feature) = self.feature {
            params.push(("feature", feature.clone()));
        }
        if let Some(ref trace) = self.trace {
            params.push(("trace", trace.clone()));
        }
        if let Some(event) = self.event {
            params.push(("event", event.to_string()));
        }
        params
    }

    /// Human-readable request target, used in error messages
    pub fn target(&self, endpoint: &Endpoint) -> String {
        let mut target = endpoint.as_str().to_string();
        for (key, value) in self.params() {
            target.push('&');
            target.push_str(key);
            target.push('=');
            target.push_str(&value);
        }
        target
    }
}

/// Take the payload out of a decoded response body
pub(crate) fn take_result(body: Value) -> Option<Value> {
    match body {
        Value::Object(mut map) => map.remove("result"),
        _ => None,
    }
}

/// Largest dataset size accepted from the server
///
/// Every event filter holds one flag per event, so larger sizes are rejected
/// as malformed instead of being allocated.
pub const MAX_EVENTS: usize = u32::MAX as usize;

/// Decode a non-negative integer payload (`size`), bounded by [`MAX_EVENTS`]
pub(crate) fn decode_count(value: &Value, target: &str) -> Result<usize> {
    let count = match value.as_u64() {
        Some(n) => usize::try_from(n).ok(),
        None => value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= MAX_EVENTS as f64)
            .map(|f| f as usize),
    };
    match count {
        Some(n) if n <= MAX_EVENTS => Ok(n),
        Some(n) => Err(DcorError::remote(
            target,
            format!("dataset size {} exceeds the limit of {} events", n, MAX_EVENTS),
        )),
        None => Err(DcorError::remote(
            target,
            format!("expected a non-negative integer up to {}, got {}", MAX_EVENTS, value),
        )),
    }
}

/// Decode a list of names (`feature_list`, `trace_list`)
pub(crate) fn decode_names(value: &Value, target: &str) -> Result<Vec<String>> {
    let malformed = || DcorError::remote(target, format!("expected a list of names, got {}", value));
    value
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        assert_eq!(QueryKind::Metadata.as_str(), "metadata");
        assert_eq!(QueryKind::FeatureList.to_string(), "feature_list");
        assert_eq!(QueryKind::TraceList.as_str(), "trace_list");
    }

    #[test]
    fn test_cacheable_whitelist() {
        assert!(QueryKind::Metadata.is_cacheable());
        assert!(QueryKind::Size.is_cacheable());
        assert!(QueryKind::FeatureList.is_cacheable());
        assert!(!QueryKind::Feature.is_cacheable());
        assert!(!QueryKind::Trace.is_cacheable());
        assert!(!QueryKind::TraceList.is_cacheable());
    }

    #[test]
    fn test_params_order() {
        let query = Query::new(QueryKind::Trace).with_trace("fl1_raw").with_event(3);
        assert_eq!(
            query.params(),
            vec![
                ("query", "trace".to_string()),
                ("trace", "fl1_raw".to_string()),
                ("event", "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_target() {
        let endpoint = Endpoint::resolve("abc123", true, "example.org").unwrap();
        let query = Query::new(QueryKind::Feature).with_feature("image").with_event(0);
        assert_eq!(
            query.target(&endpoint),
            "https://example.org/api/3/action/dcserv?id=abc123&query=feature&feature=image&event=0"
        );
    }

    #[test]
    fn test_take_result() {
        assert_eq!(take_result(json!({"result": 42})), Some(json!(42)));
        assert_eq!(take_result(json!({"error": "nope"})), None);
        assert_eq!(take_result(json!([1, 2])), None);
    }

    #[test]
    fn test_decode_count() {
        assert_eq!(decode_count(&json!(42), "t").unwrap(), 42);
        assert_eq!(decode_count(&json!(42.0), "t").unwrap(), 42);
        assert!(decode_count(&json!(-1), "t").is_err());
        assert!(decode_count(&json!("42"), "t").is_err());
    }

    #[test]
    fn test_decode_count_rejects_huge_sizes() {
        assert_eq!(decode_count(&json!(MAX_EVENTS), "t").unwrap(), MAX_EVENTS);
        assert!(matches!(
            decode_count(&json!(u64::MAX), "t"),
            Err(DcorError::RemoteAccess { .. })
        ));
        assert!(matches!(
            decode_count(&json!(1e30), "t"),
            Err(DcorError::RemoteAccess { .. })
        ));
    }

    #[test]
    fn test_decode_names() {
        let names = decode_names(&json!(["area_um", "trace"]), "t").unwrap();
        assert_eq!(names, vec!["area_um", "trace"]);
        assert!(decode_names(&json!(["area_um", 3]), "t").is_err());
        assert!(decode_names(&json!({"a": 1}), "t").is_err());
    }
}
