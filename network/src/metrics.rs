//! Metrics for [crate::Network].

use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};

/// Prefix applied to every metric registered by [Metrics::register].
pub const METRICS_PREFIX: &str = "network";

/// Metrics for [crate::Network].
#[derive(Clone, Default)]
pub struct Metrics {
    /// Ticks processed.
    pub ticks: Counter,
    /// Letters accepted into the network.
    pub submitted: Counter,
    /// Forwarding hops between neighbors.
    pub hops: Counter,
    /// Letters moved off a removed office.
    pub redirected: Counter,
    /// Letters taken at their destination.
    pub delivered: Counter,
    /// Letters marked undeliverable.
    pub undeliverable: Counter,
    /// Offices currently in the network.
    pub offices: Gauge,
}

impl Metrics {
    /// Register all metrics under [METRICS_PREFIX] in the given registry.
    pub fn register(&self, registry: &mut Registry) {
        let registry = registry.sub_registry_with_prefix(METRICS_PREFIX);
        registry.register("ticks", "Ticks processed", self.ticks.clone());
        registry.register(
            "letters_submitted",
            "Letters accepted into the network",
            self.submitted.clone(),
        );
        registry.register("hops", "Forwarding hops between neighbors", self.hops.clone());
        registry.register(
            "letters_redirected",
            "Letters moved off a removed office",
            self.redirected.clone(),
        );
        registry.register(
            "letters_delivered",
            "Letters taken at their destination",
            self.delivered.clone(),
        );
        registry.register(
            "letters_undeliverable",
            "Letters marked undeliverable",
            self.undeliverable.clone(),
        );
        registry.register("offices", "Offices in the network", self.offices.clone());
    }
}
