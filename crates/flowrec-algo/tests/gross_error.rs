//! Gross error detection tests
//!
//! Tests cover:
//! - Detection of a single biased meter
//! - Empty result on statistically normal data
//! - Branching and height limits
//! - Scenario ranking
//! - Leak detection on an open node

use flowrec_algo::ged::{compare_scenarios, detect_and_reconcile, detect_gross_errors, THRESHOLD};
use flowrec_algo::global_test_for_flows;
use flowrec_algo::test_utils::{seven_flow_network, seven_flow_network_with_gross_error};
use flowrec_algo::GedSettings;
use flowrec_core::{
    ConstraintPolicy, EngineEvent, Flow, FlowrecError, GrossErrorType, NullReporter,
    RecordingReporter,
};
use std::cmp::Ordering;

#[test]
fn biased_meter_is_the_top_scenario() {
    let flows = seven_flow_network_with_gross_error();
    let scenarios = detect_gross_errors(&flows, &GedSettings::default(), &NullReporter).unwrap();

    let best = scenarios.first().expect("at least one scenario");
    assert_eq!(best.hypotheses.len(), 1);
    assert_eq!(best.hypotheses[0].flow.id, flows[2].id);
    assert_eq!(best.hypotheses[0].kind, GrossErrorType::Measurement);
    assert!((best.global_test - 0.1082).abs() < 1e-3);
}

#[test]
fn normal_data_yield_no_scenarios() {
    let flows = seven_flow_network();
    assert!(global_test_for_flows(&flows, &NullReporter).unwrap() < THRESHOLD);
    let scenarios = detect_gross_errors(&flows, &GedSettings::default(), &NullReporter).unwrap();
    assert!(scenarios.is_empty());
}

#[test]
fn search_respects_branching_and_height() {
    let reporter = RecordingReporter::new();
    let settings = GedSettings::default()
        .with_branching(2)
        .with_max_tree_height(3)
        .with_max_solutions(100);
    let scenarios =
        detect_gross_errors(&seven_flow_network_with_gross_error(), &settings, &reporter).unwrap();

    for scenario in &scenarios {
        assert!(scenario.hypotheses.len() <= 3);
        assert!(scenario.global_test < THRESHOLD);
    }
    for event in reporter.events() {
        if let EngineEvent::CandidatesScored { kept, height, .. } = event {
            assert!(kept <= 2);
            assert!(height < 3);
        }
    }
}

#[test]
fn scenarios_are_ranked_by_size_then_global_test() {
    let settings = GedSettings::default()
        .with_max_solutions(10)
        .with_max_tree_height(3);
    let scenarios =
        detect_gross_errors(&seven_flow_network_with_gross_error(), &settings, &NullReporter)
            .unwrap();

    assert!(scenarios.len() >= 2);
    for pair in scenarios.windows(2) {
        assert_ne!(compare_scenarios(&pair[0], &pair[1]), Ordering::Greater);
    }
}

#[test]
fn every_hypothesis_chain_lowers_the_statistic() {
    let scenarios = detect_gross_errors(
        &seven_flow_network_with_gross_error(),
        &GedSettings::default(),
        &NullReporter,
    )
    .unwrap();
    for scenario in &scenarios {
        let last = scenario.hypotheses.last().unwrap();
        assert_eq!(last.global_test, scenario.global_test);
        for h in &scenario.hypotheses {
            assert!(h.flow.is_artificial);
            assert!(!h.flow.is_measured);
        }
    }
}

#[test]
fn leak_is_found_when_only_leaks_are_allowed() {
    // A loses 2.0 between a tight inflow and outflow
    let flows = vec![
        Flow::new("in", 10.0)
            .with_destination("A")
            .with_tolerance(0.1)
            .with_technological_bounds(0.0, 100.0),
        Flow::new("out", 8.0)
            .with_source("A")
            .with_destination("B")
            .with_tolerance(0.1)
            .with_technological_bounds(0.0, 100.0),
        Flow::new("export", 8.0)
            .with_source("B")
            .with_tolerance(0.1)
            .with_technological_bounds(0.0, 100.0),
    ];
    let settings = GedSettings::default()
        .with_error_types(vec![GrossErrorType::Leak])
        .with_max_tree_height(1);

    let results = detect_and_reconcile(
        &flows,
        ConstraintPolicy::Technological,
        &settings,
        &NullReporter,
    )
    .unwrap();

    let best = results.first().expect("a leak scenario");
    assert_eq!(best.rank, 1);
    let leak = best
        .outputs
        .flows
        .iter()
        .find(|f| f.classification == Some(GrossErrorType::Leak))
        .expect("classified leak");
    assert_eq!(leak.source.as_ref().map(|n| n.as_str()), Some("A"));
    assert!((leak.value - 2.0).abs() < 1e-3, "leak = {}", leak.value);
}

#[test]
fn invalid_settings_are_input_errors() {
    let err = detect_gross_errors(
        &seven_flow_network(),
        &GedSettings::default().with_max_solutions(0),
        &NullReporter,
    )
    .unwrap_err();
    assert!(matches!(err, FlowrecError::Input(_)));
}
