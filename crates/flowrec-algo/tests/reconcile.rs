//! Reconciliation end-to-end tests
//!
//! Tests cover:
//! - The seven-flow worked example
//! - Idempotence on already balanced data
//! - Unmeasured flows and bound policies
//! - Output serialization

use flowrec_algo::test_utils::{
    seven_flow_network, SEVEN_FLOW_MEASURED_DISBALANCE, SEVEN_FLOW_RECONCILED,
};
use flowrec_algo::{reconcile, reconcile_with, QpBackendKind, QpSettings};
use flowrec_core::{ConstraintPolicy, EngineEvent, Flow, NullReporter, RecordingReporter};

#[test]
fn seven_flow_worked_example() {
    let reporter = RecordingReporter::new();
    let out = reconcile(&seven_flow_network(), ConstraintPolicy::Technological, &reporter)
        .expect("reconciliation should succeed");

    for (flow, expected) in out.flows.iter().zip(SEVEN_FLOW_RECONCILED) {
        assert!(
            (flow.value - expected).abs() < 1e-4,
            "{} = {}, expected {}",
            flow.name,
            flow.value,
            expected
        );
    }
    assert!((out.measured_disbalance - SEVEN_FLOW_MEASURED_DISBALANCE).abs() < 1e-9);
    assert!(out.reconciled_disbalance < 1e-6);
    assert!(out.global_test < 1.0);
    assert!(out.calculation_time_ms >= 0.0);

    let topology = reporter
        .events()
        .into_iter()
        .find(|e| e.name() == "topology_built")
        .expect("topology event");
    assert_eq!(
        topology,
        EngineEvent::TopologyBuilt {
            flows: 7,
            nodes: 3,
            islands: 1
        }
    );
}

#[test]
fn reconciling_balanced_data_changes_nothing() {
    let first = reconcile(&seven_flow_network(), ConstraintPolicy::Technological, &NullReporter)
        .unwrap();

    let rebalanced: Vec<Flow> = seven_flow_network()
        .into_iter()
        .zip(first.values())
        .map(|(mut flow, value)| {
            flow.measured = value;
            flow
        })
        .collect();
    let second = reconcile(&rebalanced, ConstraintPolicy::Technological, &NullReporter).unwrap();

    for (a, b) in first.flows.iter().zip(&second.flows) {
        assert!((a.value - b.value).abs() < 1e-5, "{}: {} vs {}", a.name, a.value, b.value);
        assert!(b.correction.abs() < 1e-5);
    }
}

#[test]
fn unmeasured_flow_closes_the_balance() {
    let flows = vec![
        Flow::new("in", 10.0).with_destination("A").with_tolerance(0.1),
        Flow::new("out", 7.0).with_source("A").with_tolerance(0.1),
        Flow::new("loss", 0.0)
            .with_source("A")
            .unmeasured()
            .with_metrological_bounds(0.0, 1.0),
    ];

    // the unmeasured flow ignores its metrological interval
    let out = reconcile(&flows, ConstraintPolicy::Metrological, &NullReporter).unwrap();
    assert!((out.flows[0].value - 10.0).abs() < 1e-4);
    assert!((out.flows[1].value - 7.0).abs() < 1e-4);
    assert!((out.flows[2].value - 3.0).abs() < 1e-4);
    assert!(out.flows[2].upper_bound.is_infinite());
}

#[test]
fn explicit_backend_matches_default() {
    let backend = QpBackendKind::Clarabel.build(QpSettings::default());
    let flows = seven_flow_network();
    let a = reconcile(&flows, ConstraintPolicy::Technological, &NullReporter).unwrap();
    let b = reconcile_with(&flows, ConstraintPolicy::Technological, backend.as_ref(), &NullReporter)
        .unwrap();
    for (x, y) in a.values().iter().zip(b.values()) {
        assert!((x - y).abs() < 1e-9);
    }
}

#[test]
fn outputs_serialize_in_camel_case() {
    let flows = vec![
        Flow::new("in", 10.0).with_destination("A").with_tolerance(0.2),
        Flow::new("out", 9.0).with_source("A").with_tolerance(0.2),
    ];
    let out = reconcile(&flows, ConstraintPolicy::Technological, &NullReporter).unwrap();
    let json = serde_json::to_value(&out).unwrap();

    assert!(json.get("measuredDisbalance").is_some());
    assert!(json.get("reconciledDisbalance").is_some());
    assert_eq!(json["status"], "Success");
    assert!(json["flows"][0]["upperBound"].is_null());
    assert_eq!(json["flows"][0]["lowerBound"], 0.0);
}
