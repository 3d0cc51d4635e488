//! Demo application showing distinct counting exported to Prometheus.
//!
//! Run with:
//! ```bash
//! cargo run --example demo --features demo -- --help
//! ```

use cardinalita::metric::CardinalityMetric;
use cardinalita::observers::prometheus::PrometheusObserver;
use cardinalita::opts::CardinalityOpts;
use clap::Parser;
use std::thread;
use std::time::Duration;

/// Demo application for cardinalita - distinct counting as a Prometheus gauge.
///
/// This demo simulates concurrent traffic with a configurable number of
/// distinct users and paths, and prints the Prometheus exposition after
/// each round.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sketch precision (4..=18)
    #[arg(short, long, default_value = "14")]
    precision: u8,

    /// Number of writer threads
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Number of events per thread and round
    #[arg(long, default_value = "10000")]
    iterations: usize,

    /// Number of distinct users in the simulated population
    #[arg(long, default_value = "5000")]
    users: usize,

    /// Number of rounds to run
    #[arg(short, long, default_value = "3")]
    rounds: usize,

    /// Prometheus metric prefix
    #[arg(long, default_value = "demo")]
    namespace: String,

    /// Prometheus instance label
    #[arg(long)]
    instance: Option<String>,

    /// Report without resetting (cumulative cardinality)
    #[arg(long)]
    no_reset: bool,

    /// Pause between rounds in milliseconds
    #[arg(short, long, default_value = "0")]
    watch: u64,
}

/// Creates the demo metrics.
fn create_metrics(precision: u8) -> cardinalita::error::Result<(CardinalityMetric, CardinalityMetric)> {
    let users = CardinalityMetric::with_opts(
        CardinalityOpts::new("distinct_users", "Distinct users since last scrape").precision(precision),
    )?;
    let paths = CardinalityMetric::with_opts(
        CardinalityOpts::new("distinct_paths", "Distinct request paths since last scrape")
            .precision(precision),
    )?;
    Ok((users, paths))
}

/// Simulates one round of concurrent traffic.
fn simulate_traffic(
    users: &CardinalityMetric,
    paths: &CardinalityMetric,
    args: &Args,
    round: usize,
) {
    thread::scope(|scope| {
        for t in 0..args.threads {
            scope.spawn(move || {
                for j in 0..args.iterations {
                    let n = (round * 7919 + t * args.iterations + j) % args.users.max(1);
                    users.write_str(&format!("user-{}", n));
                    paths.write_str(&format!("/item/{}", n % 100));
                }
            });
        }
    });
}

fn main() {
    let args = Args::parse();

    let (users, paths) = match create_metrics(args.precision) {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut observer = PrometheusObserver::new().with_prefix(&args.namespace);
    if let Some(ref instance) = args.instance {
        observer = observer.with_const_label("instance", instance);
    }

    for round in 0..args.rounds {
        eprintln!(
            "Round {}: simulating {} threads x {} events...",
            round + 1,
            args.threads,
            args.iterations
        );
        simulate_traffic(&users, &paths, &args, round);

        let metrics = [&users, &paths];
        let output = if args.no_reset {
            observer.render(metrics.into_iter())
        } else {
            observer.render_and_reset(metrics.into_iter())
        }
        .unwrap_or_else(|e| format!("Error: {}", e));

        println!("{}", output);

        if args.watch > 0 {
            thread::sleep(Duration::from_millis(args.watch));
        }
    }
}
