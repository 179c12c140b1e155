//! Demo harness for the drainq consumer.
//!
//! Runs a single-consumer demonstration followed by a hash-dispatch fan-out
//! across several consumers, then interrupts and joins them all.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use drainq::Consumer;
use drainq::config::DemoConfig;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "drainq", about = "Bounded-queue consumer demo")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override number of consumers in the fan-out run
    #[arg(long, value_name = "COUNT")]
    consumers: Option<usize>,

    /// Override per-consumer queue capacity
    #[arg(long, value_name = "COUNT")]
    capacity: Option<usize>,

    /// Override number of items dispatched in the fan-out run
    #[arg(long, value_name = "COUNT")]
    items: Option<usize>,

    /// Override how long the single-consumer run processes before interrupt
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,

    /// Drop queued items at interrupt instead of draining them
    #[arg(long)]
    no_drain: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("drainq={}", level).parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = match &cli.config {
        Some(path) => DemoConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DemoConfig::default(),
    };
    if let Some(consumers) = cli.consumers {
        cfg.consumers = consumers;
    }
    if let Some(capacity) = cli.capacity {
        cfg.queue_capacity = capacity;
    }
    if let Some(items) = cli.items {
        cfg.items = items;
    }
    if let Some(run_for) = cli.run_for {
        cfg.run_for = run_for;
    }
    if cli.no_drain {
        cfg.drain_on_shutdown = false;
    }
    let cfg = cfg.validated().context("validating configuration")?;

    single_consumer_demo(&cfg);
    fanout_demo(&cfg);
    Ok(())
}

/// Fill a consumer's queue before starting it, let it run briefly, then
/// interrupt it and attempt one late admission.
fn single_consumer_demo(cfg: &DemoConfig) {
    let consumer = Consumer::new(cfg.items, |item: String| {
        info!(%item, "processed");
    });
    consumer.set_drain_on_shutdown(cfg.drain_on_shutdown);

    for n in 1..=cfg.items {
        consumer.add_item(n.to_string());
    }
    consumer.start();
    thread::sleep(cfg.run_for);
    consumer.interrupt();
    // Rejected without error; nothing is printed for it.
    consumer.add_item("late item, admitted never".to_string());
    consumer.join();
    info!(items = cfg.items, "single-consumer run finished");
}

/// Route each item to one of several consumers by hashing it, then interrupt
/// and join them all.
fn fanout_demo(cfg: &DemoConfig) {
    let consumers: Vec<Consumer<String>> = (0..cfg.consumers)
        .map(|id| {
            let consumer = Consumer::new(cfg.queue_capacity, move |item: String| {
                info!(consumer = id, %item, "processed");
            });
            consumer.set_drain_on_shutdown(cfg.drain_on_shutdown);
            consumer.start();
            consumer
        })
        .collect();

    for n in 1..=cfg.items {
        let item = n.to_string();
        consumers[route(&item, cfg.consumers)].add_item(item);
    }
    for consumer in &consumers {
        consumer.interrupt();
    }
    for consumer in &consumers {
        consumer.join();
    }
    info!(
        consumers = cfg.consumers,
        items = cfg.items,
        "fan-out run finished"
    );
}

/// Reduce an item's hash to a consumer index.
fn route(item: &str, buckets: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    (hasher.finish() % buckets as u64) as usize
}
