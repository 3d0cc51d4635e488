//! Cardinality estimator exported as a Prometheus gauge.
//!
//! This module provides [`CardinalityMetric`], which owns a
//! [`HyperLogLog`] sketch and a [`Gauge`] and keeps them consistent under
//! concurrent writers.
//!
//! # Locking
//!
//! One mutex per metric serializes every operation that touches the sketch
//! or the gauge. Hashing of the raw input happens before the lock is taken,
//! with a hasher borrowed from a [`HashPool`], so the critical section is a
//! single register update plus a gauge store:
//!
//! ```text
//!   write_str(s) ──► pool.acquire() ──► hash(s) ──► lock ──► sketch.add(digest)
//!                                                        └─► gauge.set(sketch.count())
//! ```
//!
//! # Export resets the estimate
//!
//! The metric reports cardinality **since the last export**, not a lifetime
//! total. [`CardinalityMetric::write`] (and therefore
//! [`Metric::metric`]) and [`CardinalityMetric::collect_and_reset`] hand
//! out the current sample and reset the sketch and the gauge in the same
//! critical section. Every value added concurrently lands either in the
//! exported sample or in the next interval, never in neither.
//!
//! [`Collector::collect`], the path used by [`prometheus::Registry::gather`],
//! does **not** reset: it reports the value set by the last write.
//!
//! Callers that need cumulative cardinality must accumulate it themselves.
//!
//! # Examples
//!
//! ```rust
//! use cardinalita::metric::CardinalityMetric;
//! use cardinalita::opts::CardinalityOpts;
//! use prometheus::core::Metric;
//!
//! let metric = CardinalityMetric::with_opts(
//!     CardinalityOpts::new("unique_sessions", "Distinct session ids").precision(12),
//! )?;
//!
//! metric.write_str("session-1");
//! metric.write_str("session-2");
//! metric.write_str("session-1");
//! assert_eq!(metric.count(), 2);
//!
//! // Exporting hands out the sample and resets the estimate.
//! let _sample = metric.metric();
//! assert_eq!(metric.count(), 0);
//! # Ok::<(), cardinalita::error::CardinalityError>(())
//! ```

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::{Collector, Desc, Describer, Metric};
use prometheus::proto::{self, MetricFamily};
use prometheus::{Gauge, Opts};

use crate::cardinality::Cardinality;
use crate::error::Result;
use crate::hash_pool::HashPool;
use crate::opts::CardinalityOpts;
use crate::sketch::{HyperLogLog, DEFAULT_PRECISION};

/// A thread-safe cardinality estimator that is also a Prometheus gauge.
///
/// Cloning is cheap and the clone shares the same sketch and gauge, so one
/// clone can be boxed into a [`prometheus::Registry`] while the original
/// keeps ingesting.
///
/// # Invariant
///
/// The gauge value, whenever read, equals [`HyperLogLog::count`] as of the
/// last mutation that held the lock.
#[derive(Clone)]
pub struct CardinalityMetric {
    core: Arc<CardinalityCore>,
}

struct CardinalityCore {
    sketch: Mutex<HyperLogLog>,
    gauge: Gauge,
    desc: Desc,
    pool: Arc<HashPool>,
}

impl CardinalityMetric {
    /// Creates a metric with the given name and help text and the default
    /// precision.
    ///
    /// # Errors
    ///
    /// Fails if the name is not a valid Prometheus metric name.
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, help: S2) -> Result<Self> {
        Self::with_opts(CardinalityOpts::new(name, help).precision(DEFAULT_PRECISION))
    }

    /// Creates a metric from [`CardinalityOpts`].
    ///
    /// # Errors
    ///
    /// Fails with [`InvalidPrecision`](crate::error::CardinalityError::InvalidPrecision)
    /// if the precision is not in `4..=18`, or with
    /// [`Prometheus`](crate::error::CardinalityError::Prometheus) if the
    /// descriptor is rejected. No metric is returned in either case.
    pub fn with_opts(opts: CardinalityOpts) -> Result<Self> {
        let (gauge_opts, precision, pool) = opts.into_parts();
        let sketch = HyperLogLog::new(precision)?;
        let desc = gauge_opts.describe()?;
        let gauge = Gauge::with_opts(gauge_opts)?;
        let pool = pool.unwrap_or_else(|| Arc::new(HashPool::new()));

        tracing::debug!(
            target: "cardinalita::metric",
            name = %desc.fq_name,
            precision,
            registers = sketch.registers(),
            "cardinality_metric_created"
        );

        Ok(Self {
            core: Arc::new(CardinalityCore {
                sketch: Mutex::new(sketch),
                gauge,
                desc,
                pool,
            }),
        })
    }

    /// Creates a metric from plain [`prometheus::Opts`] and a precision.
    pub fn with_gauge_opts(opts: Opts, precision: u8) -> Result<Self> {
        Self::with_opts(CardinalityOpts::from(opts).precision(precision))
    }

    /// Adds a precomputed 64-bit digest.
    ///
    /// This is the only ingestion path that touches the sketch; every other
    /// `write_*` method hashes its input and ends up here.
    #[inline]
    pub fn write_hash(&self, digest: u64) {
        let mut sketch = self.core.sketch.lock();
        sketch.add(digest);
        self.core.gauge.set(sketch.count() as f64);
    }

    /// Hashes and adds a string.
    #[inline]
    pub fn write_str(&self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Hashes and adds a byte slice.
    #[inline]
    pub fn write_bytes(&self, bytes: &[u8]) {
        let digest = self.core.pool.digest(bytes);
        self.write_hash(digest);
    }

    /// Hashes a sequence of byte chunks as one value and adds it.
    ///
    /// Equivalent to `write_bytes` over the concatenation of the chunks.
    pub fn write_stream<'a, I>(&self, chunks: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let digest = {
            let mut hasher = self.core.pool.acquire();
            for chunk in chunks {
                hasher.update(chunk);
            }
            hasher.digest()
        };
        self.write_hash(digest);
    }

    /// Hashes any [`Hash`] value and adds it.
    pub fn write_value<T: Hash + ?Sized>(&self, value: &T) {
        let digest = {
            let mut hasher = self.core.pool.acquire();
            value.hash(&mut hasher);
            std::hash::Hasher::finish(&hasher)
        };
        self.write_hash(digest);
    }

    /// Returns the current cardinality estimate.
    pub fn count(&self) -> u64 {
        self.core.sketch.lock().count()
    }

    /// Resets the sketch and the gauge to zero and returns the estimate as
    /// it was just before the reset.
    pub fn clear(&self) -> u64 {
        let mut sketch = self.core.sketch.lock();
        self.reset_locked(&mut sketch, "clear")
    }

    /// Exports the current sample into `out` and **resets** the estimate.
    ///
    /// The sample written to `out` carries the pre-reset value. Afterwards
    /// [`count`](Self::count) returns 0 until new values are written.
    pub fn write(&self, out: &mut proto::Metric) {
        let mut sketch = self.core.sketch.lock();
        *out = self.core.gauge.metric();
        self.reset_locked(&mut sketch, "export");
    }

    /// Collects the metric family and **resets** the estimate.
    ///
    /// Same semantics as [`write`](Self::write), producing full metric
    /// families instead of a single sample.
    pub fn collect_and_reset(&self) -> Vec<MetricFamily> {
        let mut sketch = self.core.sketch.lock();
        let families = self.core.gauge.collect();
        self.reset_locked(&mut sketch, "export");
        families
    }

    /// Returns the value currently held by the gauge.
    pub fn value(&self) -> f64 {
        self.core.gauge.get()
    }

    /// Returns the sketch precision.
    pub fn precision(&self) -> u8 {
        self.core.sketch.lock().precision()
    }

    /// Returns the metric descriptor.
    pub fn desc(&self) -> &Desc {
        &self.core.desc
    }

    /// Returns the hash pool used by this metric.
    pub fn hash_pool(&self) -> &Arc<HashPool> {
        &self.core.pool
    }

    fn reset_locked(&self, sketch: &mut HyperLogLog, reason: &'static str) -> u64 {
        let previous = sketch.clear();
        self.core.gauge.set(0.0);
        tracing::debug!(
            target: "cardinalita::metric",
            name = %self.core.desc.fq_name,
            previous,
            reason,
            "cardinality_reset"
        );
        previous
    }
}

impl Cardinality for CardinalityMetric {
    #[inline]
    fn write_hash(&self, digest: u64) {
        CardinalityMetric::write_hash(self, digest)
    }

    #[inline]
    fn write_str(&self, s: &str) {
        CardinalityMetric::write_str(self, s)
    }

    #[inline]
    fn write_bytes(&self, bytes: &[u8]) {
        CardinalityMetric::write_bytes(self, bytes)
    }

    fn write_stream<'a, I>(&self, chunks: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        CardinalityMetric::write_stream(self, chunks)
    }

    fn write_value<T>(&self, value: &T)
    where
        T: Hash + ?Sized,
    {
        CardinalityMetric::write_value(self, value)
    }

    fn count(&self) -> u64 {
        CardinalityMetric::count(self)
    }

    fn clear(&self) -> u64 {
        CardinalityMetric::clear(self)
    }
}

impl Collector for CardinalityMetric {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    /// Reports the value set by the last write. Does not reset.
    fn collect(&self) -> Vec<MetricFamily> {
        self.core.gauge.collect()
    }
}

impl Metric for CardinalityMetric {
    /// Exports the current sample and **resets** the estimate, see
    /// [`CardinalityMetric::write`].
    fn metric(&self) -> proto::Metric {
        let mut out = proto::Metric::default();
        self.write(&mut out);
        out
    }
}

impl Debug for CardinalityMetric {
    /// Output format: `name{ p:<precision> value:<gauge> }`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{ p:{} value:{} }}",
            self.core.desc.fq_name,
            self.precision(),
            self.value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CardinalityError;
    use crate::sketch::{MAX_PRECISION, MIN_PRECISION};
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::thread;

    fn encode(families: &[MetricFamily]) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn sample_value(output: &str, name: &str) -> f64 {
        output
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find(|line| line.starts_with(name))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| panic!("no sample for {} in:\n{}", name, output))
    }

    #[test]
    fn test_new() {
        let metric = CardinalityMetric::new("test_metric", "help").unwrap();
        assert_eq!(metric.count(), 0);
        assert_eq!(metric.value(), 0.0);
        assert_eq!(metric.precision(), DEFAULT_PRECISION);
        assert_eq!(metric.desc().fq_name, "test_metric");
    }

    #[test]
    fn test_all_valid_precisions() {
        for precision in MIN_PRECISION..=MAX_PRECISION {
            let metric =
                CardinalityMetric::with_opts(CardinalityOpts::new("m", "h").precision(precision))
                    .unwrap();
            assert_eq!(metric.precision(), precision);
            assert_eq!(metric.count(), 0);
        }
    }

    #[test]
    fn test_invalid_precision() {
        for precision in [0, 3, 19, 255] {
            let err =
                CardinalityMetric::with_opts(CardinalityOpts::new("m", "h").precision(precision))
                    .unwrap_err();
            assert!(matches!(err, CardinalityError::InvalidPrecision { .. }));
        }
    }

    #[test]
    fn test_invalid_name() {
        let err = CardinalityMetric::new("", "help").unwrap_err();
        assert!(matches!(err, CardinalityError::Prometheus(_)));

        let err = CardinalityMetric::new("with-dash", "help").unwrap_err();
        assert!(matches!(err, CardinalityError::Prometheus(_)));
    }

    #[test]
    fn test_write_str_and_duplicates() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_str("a");
        metric.write_str("b");
        metric.write_str("c");
        assert_eq!(metric.count(), 3);

        metric.write_str("a");
        metric.write_str("b");
        assert_eq!(metric.count(), 3);
    }

    #[test]
    fn test_write_str_matches_write_bytes() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_str("hello");
        metric.write_bytes(b"hello");
        assert_eq!(metric.count(), 1);
    }

    #[test]
    fn test_write_stream_matches_concatenation() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_bytes(b"hello world");
        metric.write_stream([&b"hello"[..], &b" "[..], &b"world"[..]]);
        assert_eq!(metric.count(), 1);

        metric.write_stream([&b"hello"[..], &b" there"[..]]);
        assert_eq!(metric.count(), 2);
    }

    #[test]
    fn test_write_hash() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_hash(xxhash_rust::xxh64::xxh64(b"x", 0));
        metric.write_str("x");
        assert_eq!(metric.count(), 1);
    }

    #[test]
    fn test_write_value() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_value(&42u64);
        metric.write_value(&42u64);
        metric.write_value(&(1u32, "tuple"));
        assert_eq!(metric.count(), 2);
    }

    #[test]
    fn test_gauge_tracks_count() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        for i in 0..100u32 {
            metric.write_bytes(&i.to_le_bytes());
            assert_eq!(metric.value(), metric.count() as f64);
        }
        assert!(metric.value() > 0.0);
    }

    #[test]
    fn test_count_is_idempotent() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        for i in 0..1000u32 {
            metric.write_bytes(&i.to_le_bytes());
        }
        let first = metric.count();
        assert_eq!(metric.count(), first);
        assert_eq!(metric.count(), first);
    }

    #[test]
    fn test_clear() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_str("a");
        metric.write_str("b");
        assert_eq!(metric.clear(), 2);
        assert_eq!(metric.count(), 0);
        assert_eq!(metric.value(), 0.0);
        assert_eq!(metric.clear(), 0);
    }

    #[test]
    fn test_write_resets_and_exports_previous_value() {
        let opts = Opts::new("exported", "help").const_label("instance", "a");
        let metric = CardinalityMetric::with_gauge_opts(opts.clone(), 12).unwrap();
        metric.write_str("a");
        metric.write_str("b");
        metric.write_str("c");

        let mut out = proto::Metric::default();
        metric.write(&mut out);

        let expected = Gauge::with_opts(opts).unwrap();
        expected.set(3.0);
        assert_eq!(out, expected.metric());

        assert_eq!(metric.count(), 0);
        assert_eq!(metric.value(), 0.0);
    }

    #[test]
    fn test_write_on_empty_metric() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        let mut out = proto::Metric::default();
        metric.write(&mut out);
        assert_eq!(metric.count(), 0);

        let expected = Gauge::new("m", "h").unwrap();
        assert_eq!(out, expected.metric());
    }

    #[test]
    fn test_metric_trait_resets() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        metric.write_str("a");
        let first = metric.metric();
        assert_eq!(metric.count(), 0);

        let second = metric.metric();
        assert_ne!(first, second);
        assert_eq!(second, Gauge::new("m", "h").unwrap().metric());
    }

    #[test]
    fn test_collect_does_not_reset() {
        let metric = CardinalityMetric::new("collected", "help").unwrap();
        metric.write_str("a");
        metric.write_str("b");

        let output = encode(&metric.collect());
        assert_eq!(sample_value(&output, "collected"), 2.0);
        assert_eq!(metric.count(), 2);

        let output = encode(&metric.collect());
        assert_eq!(sample_value(&output, "collected"), 2.0);
    }

    #[test]
    fn test_collect_and_reset() {
        let metric = CardinalityMetric::new("reset_me", "help").unwrap();
        metric.write_str("a");
        metric.write_str("b");

        let output = encode(&metric.collect_and_reset());
        assert!(output.contains("# TYPE reset_me gauge"));
        assert_eq!(sample_value(&output, "reset_me"), 2.0);
        assert_eq!(metric.count(), 0);

        let output = encode(&metric.collect());
        assert_eq!(sample_value(&output, "reset_me"), 0.0);
    }

    #[test]
    fn test_describe() {
        let metric = CardinalityMetric::with_opts(
            CardinalityOpts::new("visitors", "Distinct visitors")
                .namespace("app")
                .const_label("region", "eu"),
        )
        .unwrap();
        let descs = Collector::desc(&metric);
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].fq_name, "app_visitors");
        assert_eq!(descs[0].help, "Distinct visitors");
    }

    #[test]
    fn test_registry() {
        let registry = Registry::new();
        let metric = CardinalityMetric::new("registered", "help").unwrap();
        registry.register(Box::new(metric.clone())).unwrap();

        metric.write_str("a");
        let output = encode(&registry.gather());
        assert_eq!(sample_value(&output, "registered"), 1.0);

        // Gathering is not an export: the estimate survives.
        assert_eq!(metric.count(), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        let clone = metric.clone();
        clone.write_str("a");
        assert_eq!(metric.count(), 1);
        metric.clear();
        assert_eq!(clone.count(), 0);
    }

    #[test]
    fn test_shared_hash_pool() {
        let pool = Arc::new(HashPool::with_warmup(8));
        let a = CardinalityMetric::with_opts(
            CardinalityOpts::new("a", "h").hash_pool(Arc::clone(&pool)),
        )
        .unwrap();
        let b = CardinalityMetric::with_opts(
            CardinalityOpts::new("b", "h").hash_pool(Arc::clone(&pool)),
        )
        .unwrap();
        assert!(Arc::ptr_eq(a.hash_pool(), b.hash_pool()));

        a.write_str("x");
        b.write_str("x");
        assert_eq!(pool.idle(), 8);
    }

    #[test]
    fn test_as_dyn_cardinality() {
        let metric = CardinalityMetric::new("m", "h").unwrap();
        let estimator: &dyn Cardinality = &metric;
        estimator.write_str("a");
        estimator.write_bytes(b"b");
        estimator.write_hash(7);
        assert_eq!(estimator.count(), 3);
        assert_eq!(estimator.clear(), 3);
        assert_eq!(estimator.count(), 0);
    }

    #[test]
    fn test_multiple_threads() {
        let metric = CardinalityMetric::with_opts(CardinalityOpts::new("m", "h").precision(14))
            .unwrap();
        let mut handles = vec![];

        for t in 0..4u32 {
            let metric = metric.clone();
            handles.push(thread::spawn(move || {
                for i in 0..2500u32 {
                    metric.write_str(&format!("{}-{}", t, i));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let estimate = metric.count() as f64;
        let error = (estimate - 10_000.0).abs() / 10_000.0;
        assert!(error < 0.04, "estimate={} error={}", estimate, error);
        assert_eq!(metric.value(), estimate);
    }

    #[test]
    fn test_concurrent_export_loses_nothing() {
        let metric = CardinalityMetric::with_opts(CardinalityOpts::new("m", "h").precision(16))
            .unwrap();
        let exported = Arc::new(Mutex::new(0.0f64));

        let writer = {
            let metric = metric.clone();
            thread::spawn(move || {
                for i in 0..20_000u32 {
                    metric.write_bytes(&i.to_le_bytes());
                }
            })
        };
        let exporter = {
            let metric = metric.clone();
            let exported = Arc::clone(&exported);
            thread::spawn(move || {
                for _ in 0..50 {
                    let output = encode(&metric.collect_and_reset());
                    *exported.lock() += sample_value(&output, "m");
                    thread::yield_now();
                }
            })
        };

        writer.join().unwrap();
        exporter.join().unwrap();

        // Every distinct value is counted in exactly one interval, so the
        // intervals add up to the total (up to per-interval estimator noise).
        let total = *exported.lock() + metric.clear() as f64;
        let error = (total - 20_000.0).abs() / 20_000.0;
        assert!(error < 0.05, "total={} error={}", total, error);
    }

    #[test]
    fn test_debug() {
        let metric = CardinalityMetric::with_opts(CardinalityOpts::new("dbg", "h").precision(10))
            .unwrap();
        metric.write_str("a");
        assert_eq!(format!("{:?}", metric), "dbg{ p:10 value:1 }");
    }
}
