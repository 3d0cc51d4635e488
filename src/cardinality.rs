//! The cardinality-estimation capability.
//!
//! [`Cardinality`] is the ingestion and inspection contract, kept separate
//! from metric export. Export is the `prometheus` crate's
//! [`Collector`](prometheus::core::Collector) and
//! [`Metric`](prometheus::core::Metric) traits; a
//! [`CardinalityMetric`](crate::metric::CardinalityMetric) implements both
//! contracts.
//!
//! # Examples
//!
//! ```rust
//! use cardinalita::cardinality::Cardinality;
//! use cardinalita::metric::CardinalityMetric;
//!
//! fn track_users(estimator: &dyn Cardinality, users: &[&str]) {
//!     for user in users {
//!         estimator.write_str(user);
//!     }
//! }
//!
//! let metric = CardinalityMetric::new("active_users", "Distinct users")?;
//! track_users(&metric, &["alice", "bob", "alice"]);
//! assert_eq!(metric.count(), 2);
//! # Ok::<(), cardinalita::error::CardinalityError>(())
//! ```

use std::hash::Hash;

/// Approximate distinct counting over a stream of values.
///
/// All ingestion methods are total: they never fail and never block longer
/// than it takes to update one register.
pub trait Cardinality: Send + Sync {
    /// Adds a precomputed 64-bit digest.
    fn write_hash(&self, digest: u64);

    /// Hashes and adds a string.
    ///
    /// Produces the same digest as `write_bytes(s.as_bytes())`.
    fn write_str(&self, s: &str);

    /// Hashes and adds a byte slice.
    fn write_bytes(&self, bytes: &[u8]);

    /// Hashes a sequence of byte chunks as one value and adds it.
    ///
    /// The digest is the same as `write_bytes` over the concatenation of
    /// the chunks.
    fn write_stream<'a, I>(&self, chunks: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
        Self: Sized;

    /// Hashes any [`Hash`] value and adds it.
    ///
    /// The digest follows the value's `Hash` implementation, so
    /// `write_value("a")` and `write_str("a")` count as different values.
    fn write_value<T>(&self, value: &T)
    where
        T: Hash + ?Sized,
        Self: Sized;

    /// Returns the current cardinality estimate.
    fn count(&self) -> u64;

    /// Resets the estimate to zero and returns its value just before the
    /// reset.
    fn clear(&self) -> u64;
}
