//! Event-wise access to non-scalar features
//!
//! Accessors in this module hold no data. Every `get` is one round trip
//! through the owning dataset's [`QueryCache`], which never memoizes
//! per-event queries. Lengths come from the cached dataset size.
//!
//! Accessors borrow the query cache of the dataset that created them and
//! therefore cannot outlive it.

use serde_json::Value;

use crate::api::{Query, QueryCache, QueryKind};
use crate::error::{DcorError, Result};

/// Numeric array holding the data of one event
///
/// Decoded from (possibly nested) JSON lists. `null` decodes as NaN and
/// booleans as 0/1, so masks and images share one representation.
#[derive(Debug, Clone, PartialEq)]
pub struct EventArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl EventArray {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Option<Self> {
        if shape.iter().product::<usize>() == data.len() {
            Some(Self { shape, data })
        } else {
            None
        }
    }

    /// Decode a JSON payload, returning a description of what is wrong otherwise
    pub fn from_json(value: &Value) -> std::result::Result<Self, String> {
        let mut shape = Vec::new();
        let mut probe = value;
        while let Value::Array(items) = probe {
            shape.push(items.len());
            match items.first() {
                Some(first) => probe = first,
                None => break,
            }
        }

        let mut data = Vec::with_capacity(shape.iter().product());
        flatten(value, 0, &shape, &mut data)?;
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Flat row-major data
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The value of a zero-dimensional array
    pub fn as_scalar(&self) -> Option<f64> {
        if self.shape.is_empty() {
            self.data.first().copied()
        } else {
            None
        }
    }

    /// Nested JSON lists, NaN as `null`
    pub fn to_json(&self) -> Value {
        fn nest(shape: &[usize], data: &[f64]) -> Value {
            match shape.split_first() {
                None => data.first().map_or(Value::Null, |&x| Value::from(x)),
                Some((&n, rest)) => {
                    let stride = rest.iter().product::<usize>();
                    Value::Array(
                        (0..n)
                            .map(|i| nest(rest, &data[i * stride..(i + 1) * stride]))
                            .collect(),
                    )
                }
            }
        }
        nest(&self.shape, &self.data)
    }

    /// Element at a multi-dimensional index
    pub fn at(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        self.data.get(offset).copied()
    }
}

fn flatten(
    value: &Value,
    depth: usize,
    shape: &[usize],
    out: &mut Vec<f64>,
) -> std::result::Result<(), String> {
    match value {
        Value::Array(items) => {
            if depth >= shape.len() || items.len() != shape[depth] {
                return Err("ragged array".to_string());
            }
            items
                .iter()
                .try_for_each(|item| flatten(item, depth + 1, shape, out))
        }
        _ if depth != shape.len() => Err("ragged array".to_string()),
        leaf => {
            out.push(decode_number(leaf)?);
            Ok(())
        }
    }
}

/// Decode one numeric JSON value
pub(crate) fn decode_number(value: &Value) -> std::result::Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number out of range: {}", n)),
        Value::Null => Ok(f64::NAN),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(format!("expected a number, got {}", other)),
    }
}

/// Indexable, iterable per-event data source
pub trait EventSource {
    /// Number of events (the dataset size)
    fn len(&self) -> Result<usize>;

    /// Data of one event, fetched from the remote side
    fn get(&self, index: usize) -> Result<EventArray>;

    /// Stable identity of the remote array (endpoint and name)
    fn identifier(&self) -> &str;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Iterate over all events, one round trip each
    fn iter(&self) -> Result<EventIter<'_, Self>>
    where
        Self: Sized,
    {
        Ok(EventIter {
            source: self,
            next: 0,
            len: self.len()?,
        })
    }
}

/// Forward iterator over the events of an [`EventSource`]
#[derive(Debug)]
pub struct EventIter<'s, S> {
    source: &'s S,
    next: usize,
    len: usize,
}

impl<S: EventSource> Iterator for EventIter<'_, S> {
    type Item = Result<EventArray>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let item = self.source.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<S: EventSource> ExactSizeIterator for EventIter<'_, S> {}

fn fetch_event(api: &QueryCache, query: Query) -> Result<EventArray> {
    let value = api.get(&query)?;
    EventArray::from_json(&value)
        .map_err(|reason| DcorError::remote(query.target(api.endpoint()), reason))
}

/// Event-wise access to one feature
#[derive(Debug, Clone)]
pub struct EventFeature<'a> {
    feature: String,
    identifier: String,
    api: &'a QueryCache,
}

impl<'a> EventFeature<'a> {
    pub(crate) fn new(feature: &str, api: &'a QueryCache) -> Self {
        Self {
            feature: feature.to_string(),
            identifier: format!("{}:{}", api.endpoint(), feature),
            api,
        }
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }
}

impl EventSource for EventFeature<'_> {
    fn len(&self) -> Result<usize> {
        self.api.size()
    }

    fn get(&self, index: usize) -> Result<EventArray> {
        let query = Query::new(QueryKind::Feature)
            .with_feature(self.feature.as_str())
            .with_event(index);
        fetch_event(self.api, query)
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Event-wise access to one trace channel
#[derive(Debug, Clone)]
pub struct EventTrace<'a> {
    trace: String,
    identifier: String,
    api: &'a QueryCache,
}

impl<'a> EventTrace<'a> {
    pub(crate) fn new(trace: &str, api: &'a QueryCache) -> Self {
        Self {
            trace: trace.to_string(),
            identifier: format!("{}:{}", api.endpoint(), trace),
            api,
        }
    }

    pub fn channel(&self) -> &str {
        &self.trace
    }
}

impl EventSource for EventTrace<'_> {
    fn len(&self) -> Result<usize> {
        self.api.size()
    }

    fn get(&self, index: usize) -> Result<EventArray> {
        let query = Query::new(QueryKind::Trace)
            .with_trace(self.trace.as_str())
            .with_event(index);
        fetch_event(self.api, query)
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// The channels of the `trace` feature
#[derive(Debug, Clone)]
pub struct TraceDirectory<'a> {
    identifier: String,
    channels: &'a [String],
    api: &'a QueryCache,
}

impl<'a> TraceDirectory<'a> {
    pub(crate) fn new(api: &'a QueryCache, channels: &'a [String]) -> Self {
        Self {
            identifier: format!("{}:traces", api.endpoint()),
            channels,
            api,
        }
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// Event-wise accessor for one channel
    pub fn get(&self, channel: &str) -> Result<EventTrace<'a>> {
        if self.contains(channel) {
            Ok(EventTrace::new(channel, self.api))
        } else {
            Err(DcorError::TraceNotFound(channel.to_string()))
        }
    }

    /// Channel names in remote order
    pub fn keys(&self) -> &'a [String] {
        self.channels
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
