//! Prometheus metrics for the submission endpoint.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that `/metrics` encodes
//! into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct RpcMetrics {
    pub registry: Registry,
    /// Submissions stored.
    pub submissions_accepted: IntCounter,
    /// Submissions rejected, labelled by reason.
    pub submissions_rejected: IntCounterVec,
}

impl RpcMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions_accepted = register_int_counter_with_registry!(
            Opts::new(
                "oracle_submissions_accepted_total",
                "Signature submissions stored"
            ),
            registry
        )?;

        let submissions_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "oracle_submissions_rejected_total",
                "Signature submissions rejected, by reason"
            ),
            &["reason"],
            registry
        )?;

        Ok(Self {
            registry,
            submissions_accepted,
            submissions_rejected,
        })
    }

    pub fn record_rejection(&self, reason: &str) {
        self.submissions_rejected.with_label_values(&[reason]).inc();
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<(String, Vec<u8>), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok((encoder.format_type().to_string(), buf))
    }
}
