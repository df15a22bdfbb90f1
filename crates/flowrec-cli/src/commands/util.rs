use flowrec_algo::QpBackend;
use flowrec_cli::FlowrecConfig;
use rayon::ThreadPoolBuilder;
use tracing::warn;

/// Size the global rayon pool; "auto" (or anything unparsable) uses one
/// thread per core.
pub fn configure_threads(spec: &str) {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| {
            warn!("invalid thread count '{}', using all cores", spec);
            num_cpus::get()
        })
    };
    let _ = ThreadPoolBuilder::new()
        .num_threads(count.max(1))
        .build_global();
}

pub fn backend(config: &FlowrecConfig) -> Box<dyn QpBackend> {
    config.reconcile.backend.build(config.reconcile.solver)
}
