//! Shared fixtures for unit and integration tests.
//!
//! The seven-flow network:
//!
//! ```text
//!   f1 ──▶ A ──f3──▶ B ──f5──▶ C ──f6──▶
//!          │         │         └──f7──▶
//!          f2        f4
//!          ▼         ▼
//! ```

use flowrec_core::{Flow, FlowId};
use uuid::Uuid;

/// Measured values of f1..f7.
pub const SEVEN_FLOW_MEASURED: [f64; 7] = [10.005, 3.033, 6.831, 1.985, 5.093, 4.057, 0.991];

/// Tolerances of f1..f7.
pub const SEVEN_FLOW_TOLERANCE: [f64; 7] = [0.200, 0.121, 0.683, 0.040, 0.102, 0.081, 0.020];

/// Reconciled values of f1..f7 (closed-form weighted least squares).
pub const SEVEN_FLOW_RECONCILED: [f64; 7] = [
    10.055612418500504,
    3.014474589518353,
    7.041137828982151,
    1.9822547563048076,
    5.058883072677343,
    4.06725769858297,
    0.991625374094374,
];

/// Euclidean norm of the measured node residuals.
pub const SEVEN_FLOW_MEASURED_DISBALANCE: f64 = 0.2879496483762398;

/// Deterministic id for fixture flow `n` (1-based).
pub fn fixture_id(n: u128) -> FlowId {
    FlowId::new(Uuid::from_u128(n))
}

/// The seven-flow network with bounds `[0, 1000]`.
pub fn seven_flow_network() -> Vec<Flow> {
    let endpoints: [(Option<&str>, Option<&str>); 7] = [
        (None, Some("A")),
        (Some("A"), None),
        (Some("A"), Some("B")),
        (Some("B"), None),
        (Some("B"), Some("C")),
        (Some("C"), None),
        (Some("C"), None),
    ];

    endpoints
        .iter()
        .enumerate()
        .map(|(i, (source, destination))| {
            let mut flow = Flow::new(format!("f{}", i + 1), SEVEN_FLOW_MEASURED[i])
                .with_id(fixture_id(i as u128 + 1))
                .with_tolerance(SEVEN_FLOW_TOLERANCE[i])
                .with_metrological_bounds(0.0, 1000.0)
                .with_technological_bounds(0.0, 1000.0);
            if let Some(s) = source {
                flow = flow.with_source(*s);
            }
            if let Some(d) = destination {
                flow = flow.with_destination(*d);
            }
            flow
        })
        .collect()
}

/// Same network with f3's tolerance tightened to 0.068, which makes its
/// 0.21 deviation a statistically significant gross error.
pub fn seven_flow_network_with_gross_error() -> Vec<Flow> {
    let mut flows = seven_flow_network();
    flows[2].tolerance = 0.068;
    flows
}
