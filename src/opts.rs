//! Construction options for cardinality metrics.

use std::collections::HashMap;
use std::sync::Arc;

use prometheus::Opts;

use crate::hash_pool::HashPool;
use crate::sketch::DEFAULT_PRECISION;

/// Options for building a [`CardinalityMetric`](crate::metric::CardinalityMetric).
///
/// Descriptor metadata (name, help, namespace, subsystem, constant labels)
/// is carried as [`prometheus::Opts`]; the sketch precision and the hash
/// pool are specific to cardinality metrics.
///
/// # Examples
///
/// ```rust
/// use cardinalita::opts::CardinalityOpts;
///
/// let opts = CardinalityOpts::new("unique_visitors", "Distinct visitors since last scrape")
///     .namespace("myapp")
///     .subsystem("http")
///     .const_label("instance", "localhost:8080")
///     .precision(16);
///
/// assert_eq!(opts.get_precision(), 16);
/// assert_eq!(opts.gauge_opts().fq_name(), "myapp_http_unique_visitors");
/// ```
#[derive(Debug, Clone)]
pub struct CardinalityOpts {
    gauge: Opts,
    precision: u8,
    hash_pool: Option<Arc<HashPool>>,
}

impl CardinalityOpts {
    /// Creates options with the given name and help text and the default
    /// precision.
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, help: S2) -> Self {
        Self::from(Opts::new(name, help))
    }

    /// Sets the namespace, the first component of the fully-qualified name.
    pub fn namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.gauge = self.gauge.namespace(namespace);
        self
    }

    /// Sets the subsystem, the second component of the fully-qualified name.
    pub fn subsystem<S: Into<String>>(mut self, subsystem: S) -> Self {
        self.gauge = self.gauge.subsystem(subsystem);
        self
    }

    /// Adds a constant label.
    pub fn const_label<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.gauge = self.gauge.const_label(name, value);
        self
    }

    /// Replaces the constant labels.
    pub fn const_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.gauge = self.gauge.const_labels(labels);
        self
    }

    /// Sets the sketch precision. Validated when the metric is built.
    pub fn precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// Shares an existing hash pool instead of creating one per metric.
    pub fn hash_pool(mut self, pool: Arc<HashPool>) -> Self {
        self.hash_pool = Some(pool);
        self
    }

    /// Returns the configured precision.
    pub fn get_precision(&self) -> u8 {
        self.precision
    }

    /// Returns the descriptor options of the exported gauge.
    pub fn gauge_opts(&self) -> &Opts {
        &self.gauge
    }

    pub(crate) fn into_parts(self) -> (Opts, u8, Option<Arc<HashPool>>) {
        (self.gauge, self.precision, self.hash_pool)
    }
}

impl From<Opts> for CardinalityOpts {
    fn from(gauge: Opts) -> Self {
        Self {
            gauge,
            precision: DEFAULT_PRECISION,
            hash_pool: None,
        }
    }
}
