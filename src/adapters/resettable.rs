//! Resettable wrapper for cardinality metrics that reset on collection.
//!
//! A plain [`CardinalityMetric`] registered in a [`prometheus::Registry`]
//! reports the value set by the last write and keeps accumulating across
//! scrapes. Wrapping it in [`Resettable`] turns every
//! [`Collector::collect`] into an export: the registry receives the
//! current estimate and the metric starts a new interval.

use std::fmt::{self, Debug};
use std::ops::Deref;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;

use crate::metric::CardinalityMetric;

/// A collector that resets the wrapped metric each time it is collected.
///
/// Use it to register a metric whose scrapes report cardinality since the
/// previous scrape:
///
/// ```rust
/// use cardinalita::adapters::Resettable;
/// use cardinalita::metric::CardinalityMetric;
/// use prometheus::core::Collector;
///
/// let metric = CardinalityMetric::new("requests_distinct_ips", "Distinct client IPs")?;
/// let periodic = Resettable::new(metric.clone());
///
/// metric.write_str("10.0.0.1");
/// metric.write_str("10.0.0.2");
///
/// let _families = periodic.collect(); // carries 2
/// assert_eq!(metric.count(), 0);
/// # Ok::<(), cardinalita::error::CardinalityError>(())
/// ```
#[derive(Clone)]
pub struct Resettable {
    inner: CardinalityMetric,
}

impl Resettable {
    /// Creates a new resettable wrapper around the given metric.
    pub fn new(inner: CardinalityMetric) -> Self {
        Self { inner }
    }

    /// Returns a reference to the inner metric.
    pub fn inner(&self) -> &CardinalityMetric {
        &self.inner
    }

    /// Consumes the wrapper and returns the inner metric.
    pub fn into_inner(self) -> CardinalityMetric {
        self.inner
    }
}

impl Collector for Resettable {
    fn desc(&self) -> Vec<&Desc> {
        vec![self.inner.desc()]
    }

    /// Returns the current metric family AND resets the estimate.
    fn collect(&self) -> Vec<MetricFamily> {
        self.inner.collect_and_reset()
    }
}

impl Debug for Resettable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resettable")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Allows transparent access to the inner metric's methods.
impl Deref for Resettable {
    type Target = CardinalityMetric;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
