//! Reconciler metrics, registered into the process-wide default registry
//! the way an operator's `/metrics` endpoint expects to scrape them from
//! (SPEC_FULL ambient stack, Kubernetes runtime section).

use prometheus::{HistogramVec, IntCounterVec};

pub struct Metrics {
    pub reconciliations: IntCounterVec,
    pub reconcile_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> Metrics {
        let reconciliations = IntCounterVec::new(
            prometheus::Opts::new("confctl_reconciliations_total", "Reconcile outcomes by result"),
            &["result"],
        )
        .expect("metric names/labels are static and valid");
        let reconcile_duration = HistogramVec::new(
            prometheus::HistogramOpts::new("confctl_reconcile_duration_seconds", "Time spent in one reconcile call"),
            &["result"],
        )
        .expect("metric names/labels are static and valid");

        prometheus::default_registry()
            .register(Box::new(reconciliations.clone()))
            .ok();
        prometheus::default_registry()
            .register(Box::new(reconcile_duration.clone()))
            .ok();

        Metrics { reconciliations, reconcile_duration }
    }

    pub fn record(&self, result: &str, elapsed_secs: f64) {
        self.reconciliations.with_label_values(&[result]).inc();
        self.reconcile_duration.with_label_values(&[result]).observe(elapsed_secs);
    }
}

impl Default for Metrics {
    fn default() -> Metrics {
        Metrics::new()
    }
}
