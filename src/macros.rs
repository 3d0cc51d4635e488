//! Registration helpers for the default Prometheus registry.

/// Creates a [`CardinalityMetric`](crate::metric::CardinalityMetric) and
/// registers it with the default Prometheus registry.
///
/// Returns `Result<CardinalityMetric, CardinalityError>`; the returned
/// handle shares its state with the registered clone.
///
/// # Examples
///
/// ```rust
/// use cardinalita::register_cardinality;
/// use cardinalita::opts::CardinalityOpts;
///
/// let users = register_cardinality!("doc_distinct_users", "Distinct users")?;
/// let ips = register_cardinality!("doc_distinct_ips", "Distinct client addresses", 16)?;
/// let paths = register_cardinality!(
///     CardinalityOpts::new("doc_distinct_paths", "Distinct request paths").namespace("web")
/// )?;
///
/// users.write_str("alice");
/// ips.write_str("10.0.0.1");
/// paths.write_str("/index.html");
/// # Ok::<(), cardinalita::error::CardinalityError>(())
/// ```
#[macro_export]
macro_rules! register_cardinality {
    ($OPTS:expr $(,)?) => {{
        $crate::metric::CardinalityMetric::with_opts($OPTS).and_then(|metric| {
            $crate::__prometheus::register(::std::boxed::Box::new(metric.clone()))
                .map(|_| metric)
                .map_err($crate::error::CardinalityError::from)
        })
    }};

    ($NAME:expr, $HELP:expr $(,)?) => {{
        $crate::register_cardinality!($crate::opts::CardinalityOpts::new($NAME, $HELP))
    }};

    ($NAME:expr, $HELP:expr, $PRECISION:expr $(,)?) => {{
        $crate::register_cardinality!(
            $crate::opts::CardinalityOpts::new($NAME, $HELP).precision($PRECISION)
        )
    }};
}

#[cfg(test)]
mod tests {
    use crate::error::CardinalityError;
    use crate::opts::CardinalityOpts;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_register_name_help() {
        let metric = register_cardinality!("macro_test_name_help", "help").unwrap();
        metric.write_str("a");

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("# TYPE macro_test_name_help gauge"));
    }

    #[test]
    fn test_register_with_precision() {
        let metric = register_cardinality!("macro_test_precision", "help", 8).unwrap();
        assert_eq!(metric.precision(), 8);
    }

    #[test]
    fn test_register_opts() {
        let metric = register_cardinality!(
            CardinalityOpts::new("macro_test_opts", "help").namespace("ns")
        )
        .unwrap();
        assert_eq!(metric.desc().fq_name, "ns_macro_test_opts");
    }

    #[test]
    fn test_register_invalid_precision() {
        let err = register_cardinality!("macro_test_invalid", "help", 2).unwrap_err();
        assert!(matches!(err, CardinalityError::InvalidPrecision { precision: 2 }));
    }

    #[test]
    fn test_register_twice_fails() {
        register_cardinality!("macro_test_duplicate", "help").unwrap();
        let err = register_cardinality!("macro_test_duplicate", "help").unwrap_err();
        assert!(matches!(err, CardinalityError::Prometheus(_)));
    }
}
