//! Wrapper types for changing how a cardinality metric is collected.
//!
//! | Wrapper | Description |
//! |---------|-------------|
//! | [`Resettable`] | Resets the estimate every time the registry collects it |
//!
//! # Example
//!
//! ```rust
//! use cardinalita::adapters::Resettable;
//! use cardinalita::metric::CardinalityMetric;
//! use prometheus::Registry;
//!
//! let visitors = CardinalityMetric::new("visitors_per_scrape", "Distinct visitors per scrape")?;
//! let registry = Registry::new();
//! registry.register(Box::new(Resettable::new(visitors.clone())))?;
//!
//! visitors.write_str("alice");
//! let _families = registry.gather(); // reports 1, then resets
//! assert_eq!(visitors.count(), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod resettable;

pub use resettable::Resettable;
