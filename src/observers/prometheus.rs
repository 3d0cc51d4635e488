//! Prometheus observer for exporting cardinality metrics as text.
//!
//! This module provides [`PrometheusObserver`], which gathers a collection of
//! [`CardinalityMetric`]s through a Prometheus [`Registry`] and renders them
//! with the official [`TextEncoder`].
//!
//! # Integration with Prometheus
//!
//! 1. Create a `PrometheusObserver`
//! 2. Call `render_and_reset()` from your `/metrics` handler to report the
//!    cardinality seen since the previous scrape (or `render()` to report
//!    without resetting)
//! 3. Configure Prometheus to scrape the endpoint
//!
//! # Examples
//!
//! ```rust
//! use cardinalita::metric::CardinalityMetric;
//! use cardinalita::observers::prometheus::PrometheusObserver;
//!
//! let users = CardinalityMetric::new("distinct_users", "Distinct users")?;
//! users.write_str("alice");
//! users.write_str("bob");
//!
//! let observer = PrometheusObserver::new()
//!     .with_prefix("myapp")
//!     .with_const_label("instance", "localhost:8080");
//!
//! let output = observer.render_and_reset([&users].into_iter())?;
//! assert!(output.contains("myapp_distinct_users{instance=\"localhost:8080\"} 2"));
//! assert_eq!(users.count(), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};

use crate::adapters::Resettable;
use crate::metric::CardinalityMetric;
use crate::observers::Result;

/// Observer that renders cardinality metrics in the Prometheus text format.
///
/// Every render builds a fresh [`Registry`], so the same metrics can be
/// rendered any number of times.
#[derive(Debug, Clone, Default)]
pub struct PrometheusObserver {
    /// Prefix prepended to every metric name.
    prefix: Option<String>,
    /// Constant labels applied to all metrics.
    const_labels: HashMap<String, String>,
}

impl PrometheusObserver {
    /// Creates a new `PrometheusObserver` without prefix or labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix prepended to every metric name with an underscore.
    ///
    /// For example, prefix "myapp" + metric "users" = "myapp_users".
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Adds a constant label to all metrics.
    pub fn with_const_label(mut self, name: &str, value: &str) -> Self {
        self.const_labels
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Renders metrics to Prometheus exposition format without resetting
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if registration (e.g. duplicate names) or encoding
    /// fails.
    pub fn render<'a>(
        &self,
        metrics: impl Iterator<Item = &'a CardinalityMetric>,
    ) -> Result<String> {
        let registry = self.new_registry()?;
        for metric in metrics {
            registry.register(Box::new(metric.clone()))?;
        }
        self.render_registry(&registry)
    }

    /// Renders metrics and resets each of them.
    ///
    /// Every metric reports its cardinality since the previous export and
    /// starts a new interval.
    ///
    /// # Errors
    ///
    /// Returns an error if registration or encoding fails. Registration
    /// errors happen before any metric is reset; an encoding error means the
    /// metrics were already reset.
    pub fn render_and_reset<'a>(
        &self,
        metrics: impl Iterator<Item = &'a CardinalityMetric>,
    ) -> Result<String> {
        let registry = self.new_registry()?;
        for metric in metrics {
            registry.register(Box::new(Resettable::new(metric.clone())))?;
        }
        self.render_registry(&registry)
    }

    /// Renders metrics to bytes (useful for HTTP responses).
    ///
    /// # Errors
    ///
    /// Returns an error if registration or encoding fails.
    pub fn render_bytes<'a>(
        &self,
        metrics: impl Iterator<Item = &'a CardinalityMetric>,
    ) -> Result<Vec<u8>> {
        Ok(self.render(metrics)?.into_bytes())
    }

    /// Gathers and renders an existing registry.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render_registry(&self, registry: &Registry) -> Result<String> {
        Self::encode_families(&registry.gather())
    }

    /// Encodes metric families to a string.
    fn encode_families(families: &[MetricFamily]) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn new_registry(&self) -> Result<Registry> {
        if self.prefix.is_none() && self.const_labels.is_empty() {
            return Ok(Registry::new());
        }
        let labels = (!self.const_labels.is_empty()).then(|| self.const_labels.clone());
        Ok(Registry::new_custom(self.prefix.clone(), labels)?)
    }
}
