//! Observers for exporting cardinality metrics.
//!
//! - [`prometheus`] - Render metrics in the Prometheus text exposition format
//!
//! # Unified Error Handling
//!
//! Observers report failures through [`ObserverError`]. Resetting renders
//! reset the metrics before encoding, so an error from a resetting render
//! means the interval was consumed and the rendered copy may be incomplete.
//!
//! # Example
//!
//! ```rust
//! use cardinalita::metric::CardinalityMetric;
//! use cardinalita::observers::prometheus::PrometheusObserver;
//! use cardinalita::observers::Result;
//!
//! fn export(metrics: &[&CardinalityMetric]) -> Result<String> {
//!     PrometheusObserver::new().render_and_reset(metrics.iter().copied())
//! }
//!
//! let users = CardinalityMetric::new("users", "Distinct users").unwrap();
//! users.write_str("alice");
//! let output = export(&[&users]).unwrap();
//! assert!(output.contains("# TYPE users gauge"));
//! assert_eq!(users.count(), 0);
//! ```

mod error;

pub use error::{ObserverError, Result};

pub mod prometheus;
