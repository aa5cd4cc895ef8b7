//! Metrics collection and exposition.
//!
//! # Metrics
//! - `distrobaker_ref_probes_total` (counter): polls by outcome
//! - `distrobaker_config_loads_total` (counter): loads by outcome
//! - `distrobaker_messages_total` (counter): bus messages received

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_ref_probe(outcome: &'static str) {
    counter!("distrobaker_ref_probes_total", "outcome" => outcome).increment(1);
}

pub fn record_config_load(ok: bool) {
    let outcome = if ok { "ok" } else { "failed" };
    counter!("distrobaker_config_loads_total", "outcome" => outcome).increment(1);
}

pub fn record_message() {
    counter!("distrobaker_messages_total").increment(1);
}
