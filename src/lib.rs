//! # Cardinalita - Distinct Counting as a Prometheus Gauge
//!
//! A Rust library providing a thread-safe, memory-bounded **cardinality
//! estimator** that is at the same time a Prometheus metric. Feed it a
//! stream of values from any number of threads; it keeps a HyperLogLog
//! sketch of the distinct values and publishes the estimate as a gauge.
//!
//! ## The Problem
//!
//! Counting distinct things (users, IP addresses, URLs, session ids) exactly
//! requires remembering every value seen. Under a high-cardinality stream that
//! set grows without bound, and in a metrics pipeline it also has to be
//! shared between every thread that observes a value.
//!
//! ## The Solution: a HyperLogLog Gauge
//!
//! [`CardinalityMetric`](metric::CardinalityMetric) fuses three pieces:
//!
//! 1. **Hash Pool**: inputs are turned into 64-bit xxHash64 digests with
//!    hashers borrowed from a lock-free [`HashPool`](hash_pool::HashPool).
//!    Hashing happens outside any lock.
//!
//! 2. **Sketch**: a [`HyperLogLog`](sketch::HyperLogLog) with `2^p`
//!    one-byte registers estimates the number of distinct digests with a
//!    relative standard error of `1.04 / sqrt(2^p)`, using constant memory.
//!
//! 3. **Adapter**: one mutex per metric serializes the register update and
//!    the gauge update, so the exported gauge always equals the sketch's
//!    estimate as of the last write.
//!
//! ```text
//!   thread 0 ──write_str──► hash (pooled) ──┐
//!   thread 1 ──write_str──► hash (pooled) ──┼──► lock ─► sketch.add ─► gauge.set
//!   thread N ──write_str──► hash (pooled) ──┘
//!
//!   exporter ──write / collect_and_reset──► lock ─► sample ─► reset sketch + gauge
//! ```
//!
//! ## Export Resets the Estimate
//!
//! Exporting through [`CardinalityMetric::write`](metric::CardinalityMetric::write),
//! [`prometheus::core::Metric::metric`], the [`Resettable`](adapters::Resettable)
//! collector or
//! [`PrometheusObserver::render_and_reset`](observers::prometheus::PrometheusObserver::render_and_reset)
//! hands out the current estimate **and resets it**. Each export therefore
//! reports cardinality *since the last export*. Plain
//! [`Collector::collect`](prometheus::core::Collector::collect) (what a
//! [`Registry`](prometheus::Registry) calls) reports without resetting.
//!
//! ## Precision and Memory
//!
//! | Precision | Registers | Memory | Std. error |
//! |-----------|-----------|--------|------------|
//! | 10 | 1,024 | 1 KB | 3.25% |
//! | 12 | 4,096 | 4 KB | 1.62% |
//! | 14 (default) | 16,384 | 16 KB | 0.81% |
//! | 16 | 65,536 | 64 KB | 0.41% |
//! | 18 | 262,144 | 256 KB | 0.20% |
//!
//! Precision outside `4..=18` is rejected at construction.
//!
//! ## Quick Start
//!
//! ```rust
//! use cardinalita::metric::CardinalityMetric;
//! use cardinalita::opts::CardinalityOpts;
//! use prometheus::Registry;
//!
//! let visitors = CardinalityMetric::with_opts(
//!     CardinalityOpts::new("unique_visitors", "Distinct visitors")
//!         .namespace("myapp")
//!         .precision(12),
//! )?;
//!
//! // Register a clone; the original keeps ingesting.
//! let registry = Registry::new();
//! registry.register(Box::new(visitors.clone()))?;
//!
//! // Ingest from any thread.
//! visitors.write_str("alice");
//! visitors.write_str("bob");
//! visitors.write_str("alice");
//! assert_eq!(visitors.count(), 2);
//!
//! // Read and reset.
//! assert_eq!(visitors.clear(), 2);
//! assert_eq!(visitors.count(), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Thread Safety
//!
//! [`CardinalityMetric`](metric::CardinalityMetric) is `Send + Sync` and
//! cheap to clone; clones share state. Writers, readers and exporters may run
//! on different threads concurrently.
//!
//! ## Observers
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`observers::prometheus`] | Render metrics in the Prometheus text exposition format |

pub mod adapters;
pub mod cardinality;
pub mod error;
pub mod hash_pool;
pub mod metric;
pub mod observers;
pub mod opts;
pub mod sketch;

mod macros;

#[doc(hidden)]
pub use prometheus as __prometheus;
