//! Remote dataset behavior against an in-memory server

use dcor::api::{Endpoint, MockTransport, QueryKind};
use dcor::dataset::{EventSource, FeatureValue, RemoteDataset};
use dcor::definitions::TRACE;
use dcor::error::DcorError;
use serde_json::json;
use std::sync::Arc;

fn scenario() -> MockTransport {
    let mock = MockTransport::new("abc123");
    mock.set_metadata(json!({"experiment": {"sample": "S1", "run index": 2}}));
    mock.set_size(42);
    mock.set_feature_list(&["area", "trace"]);
    mock.set_trace_list(&["fl1_raw"]);
    mock.set_trace("fl1_raw", (0..42).map(|i| json!([i, i + 1, i + 2])).collect());
    mock
}

fn full() -> MockTransport {
    let mock = MockTransport::new("abc123");
    fill(&mock);
    mock
}

fn fill(mock: &MockTransport) {
    mock.set_metadata(json!({
        "experiment": {"sample": "blood", "run index": 7},
        "setup": {"medium": "CellCarrier"},
    }));
    mock.set_size(3);
    mock.set_feature_list(&["deform", "area_um", "image", "mask", "trace"]);
    mock.set_scalar_feature("deform", &[0.01, 0.02, 0.03]);
    mock.set_scalar_feature("area_um", &[30.0, 40.0, 50.0]);
    mock.set_event_feature(
        "image",
        vec![json!([[1, 2], [3, 4]]), json!([[5, 6], [7, 8]]), json!([[9, 9], [9, 9]])],
    );
    mock.set_event_feature("mask", vec![json!([[true, false]]); 3]);
    mock.set_trace_list(&["fl1_raw", "fl2_raw"]);
    mock.set_trace("fl1_raw", vec![json!([1, 2]), json!([3, 4]), json!([5, 6])]);
    mock.set_trace("fl2_raw", vec![json!([0, 0]), json!([0, 1]), json!([1, 1])]);
}

fn open(mock: &MockTransport) -> RemoteDataset {
    RemoteDataset::from_transport(Box::new(mock.clone())).unwrap()
}

#[test]
fn test_scenario() {
    let mock = scenario();
    let ds = open(&mock);

    assert_eq!(ds.path(), "https://example.org/api/3/action/dcserv?id=abc123");
    assert_eq!(ds.title(), "S1 - M2");
    assert_eq!(ds.len(), 42);
    assert!(ds.contains("area"));
    assert!(ds.contains("trace"));
    assert!(!ds.contains("deform"));
    // listed by the server but outside the feature vocabulary
    assert!(matches!(ds.get("area"), Err(DcorError::UnknownFeature(_))));

    mock.clear_requests();
    let traces = ds.get(TRACE).unwrap().into_traces().unwrap();
    let fl1 = traces.get("fl1_raw").unwrap();
    let event = fl1.get(0).unwrap();
    assert_eq!(event.data(), &[0.0, 1.0, 2.0]);

    let request = mock.requests().pop().unwrap();
    assert_eq!(request.kind, QueryKind::Trace);
    assert_eq!(request.trace.as_deref(), Some("fl1_raw"));
    assert_eq!(request.event, Some(0));
}

#[test]
fn test_dataset_wide_queries_issued_once() {
    let mock = full();
    let ds = open(&mock);

    for _ in 0..3 {
        assert_eq!(ds.len(), 3);
        let image = ds.get("image").unwrap().into_events().unwrap();
        assert_eq!(image.len().unwrap(), 3);
    }

    assert_eq!(mock.calls_for(QueryKind::Metadata), 1);
    assert_eq!(mock.calls_for(QueryKind::Size), 1);
    assert_eq!(mock.calls_for(QueryKind::FeatureList), 1);
}

#[test]
fn test_membership_without_network() {
    let mock = full();
    let ds = open(&mock);
    mock.clear_requests();

    for name in ["deform", "image", "trace", "bright_avg", "peter"] {
        ds.contains(name);
    }
    let names: Vec<_> = ds.features().iter().collect();
    assert_eq!(names, vec!["deform", "area_um", "image", "mask", "trace"]);
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_scalar_features_idempotent() {
    let mock = full();
    let ds = open(&mock);
    mock.clear_requests();

    let first = ds.get("deform").unwrap().into_scalar().unwrap();
    let second = ds.get("deform").unwrap().into_scalar().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), ds.len());
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_non_scalar_access_is_lazy() {
    let mock = full();
    let ds = open(&mock);
    mock.clear_requests();

    let image = ds.get("image").unwrap().into_events().unwrap();
    assert_eq!(mock.call_count(), 0);

    let event = image.get(1).unwrap();
    assert_eq!(event.shape(), &[2, 2]);
    assert_eq!(event.at(&[1, 1]), Some(8.0));

    // repeated access goes to the server each time
    image.get(1).unwrap();
    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|q| q.event == Some(1)));
}

#[test]
fn test_iteration_matches_dataset_size() {
    let mock = full();
    let ds = open(&mock);

    let mask = ds.get("mask").unwrap().into_events().unwrap();
    let iter = mask.iter().unwrap();
    assert_eq!(iter.len(), ds.len());
    for event in iter {
        assert_eq!(event.unwrap().data(), &[1.0, 0.0]);
    }
}

#[test]
fn test_out_of_range_event() {
    let mock = full();
    let ds = open(&mock);

    let image = ds.get("image").unwrap().into_events().unwrap();
    assert!(matches!(
        image.get(ds.len()),
        Err(DcorError::RemoteAccess { .. })
    ));
}

#[test]
fn test_unknown_versus_absent_feature() {
    let mock = full();
    let ds = open(&mock);

    let unknown = ds.get("peter").unwrap_err();
    assert!(matches!(unknown, DcorError::UnknownFeature(_)));
    assert!(!unknown.is_recoverable());

    let absent = ds.get("bright_avg").unwrap_err();
    assert!(matches!(absent, DcorError::FeatureNotFound(_)));
    assert_eq!(absent.to_string(), "Feature 'bright_avg' not found!");
}

#[test]
fn test_trace_channels() {
    let mock = full();
    let ds = open(&mock);

    let traces = ds.get(TRACE).unwrap().into_traces().unwrap();
    assert_eq!(traces.keys(), &["fl1_raw", "fl2_raw"]);
    assert!(matches!(
        traces.get("fl3_raw"),
        Err(DcorError::TraceNotFound(_))
    ));

    let fl2 = traces.get("fl2_raw").unwrap();
    assert_eq!(fl2.get(2).unwrap().data(), &[1.0, 1.0]);
    assert!(fl2.identifier().ends_with(":fl2_raw"));

    ds.get(TRACE).unwrap();
    assert_eq!(mock.calls_for(QueryKind::TraceList), 1);
}

#[test]
fn test_identity_hash() {
    let a = open(&full());

    let endpoint = Endpoint::resolve(
        "http://example.org/api/3/action/dcserv?id=abc123",
        true,
        "other.org",
    )
    .unwrap();
    let equivalent = MockTransport::with_endpoint(endpoint);
    fill(&equivalent);
    assert_eq!(a.hash(), open(&equivalent).hash());

    let other = MockTransport::new("def456");
    fill(&other);
    assert_ne!(a.hash(), open(&other).hash());
}

#[test]
fn test_empty_dataset() {
    let mock = MockTransport::new("def456");
    mock.set_metadata(json!({"experiment": {"sample": "S1", "run index": 1}}));
    mock.set_size(0);
    mock.set_feature_list(&[]);
    let ds = open(&mock);
    assert!(ds.is_empty());
    assert!(ds.features().is_empty());
}

#[test]
fn test_configuration_and_filter() {
    let mock = full();
    let mut ds = open(&mock);

    assert_eq!(ds.title(), "blood - M7");
    assert_eq!(ds.config().get_lower_str("setup", "medium").unwrap(), "cellcarrier");

    ds.config_mut().set("filtering", "area_um min", 35.0);
    ds.config_mut().set("filtering", "area_um max", 100.0);
    ds.apply_filter().unwrap();
    assert_eq!(ds.filter().all(), &[false, true, true]);

    ds.filter_mut().manual_mut()[2] = false;
    ds.apply_filter().unwrap();
    assert_eq!(ds.filter().included(), 1);
}

#[test]
fn test_feature_values_are_tagged() {
    let mock = full();
    let ds = open(&mock);

    assert!(matches!(ds.get("area_um").unwrap(), FeatureValue::Scalar(_)));
    assert!(matches!(ds.get("image").unwrap(), FeatureValue::Events(_)));
    assert!(matches!(ds.get(TRACE).unwrap(), FeatureValue::Traces(_)));
}
