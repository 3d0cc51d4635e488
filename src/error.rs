//! Error type for building cardinality metrics.
//!
//! Construction is the only fallible step: once a
//! [`CardinalityMetric`](crate::metric::CardinalityMetric) exists, every
//! ingestion and inspection operation is total.

use thiserror::Error;

/// Errors reported while constructing a sketch or a cardinality metric.
#[derive(Debug, Error)]
pub enum CardinalityError {
    /// The requested precision is outside the supported `4..=18` range.
    #[error("invalid precision {precision}: expected a value in 4..=18")]
    InvalidPrecision {
        /// The rejected precision.
        precision: u8,
    },

    /// The metric descriptor was rejected by the `prometheus` crate
    /// (empty or malformed name, invalid label names, duplicate
    /// registration, ...).
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Result type for cardinality construction.
pub type Result<T> = std::result::Result<T, CardinalityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_precision_display() {
        let err = CardinalityError::InvalidPrecision { precision: 3 };
        assert_eq!(
            format!("{}", err),
            "invalid precision 3: expected a value in 4..=18"
        );
    }

    #[test]
    fn test_from_prometheus_error() {
        let err: CardinalityError = prometheus::Error::Msg("boom".to_string()).into();
        assert!(matches!(err, CardinalityError::Prometheus(_)));
        assert!(format!("{}", err).starts_with("prometheus error:"));
    }
}
