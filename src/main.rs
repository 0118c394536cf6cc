//! Ethereum Vanity Address Search CLI
//!
//! Usage:
//!   vanity_search -p dead              # Find address starting with "dead"
//!   vanity_search -s beef -w 8         # Find address ending with "beef"
//!   vanity_search -p Cafe -c --entropy <HEX>

use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use rand::Rng;

use vanity_search::entropy::MIN_SAMPLE_INTERVAL;
use vanity_search::{
    Config, EntropyAccumulator, EntropyPool, EntropySample, Outcome, SearchCoordinator,
    SearchResult, SessionHandle,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // Validate configuration
    let pattern = match config.validate() {
        Ok(pattern) => pattern,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    // Print startup info
    println!("Ethereum Vanity Address Search");
    println!("==============================");
    println!("Pattern:    {}", pattern);
    println!(
        "Difficulty: 1 in {} ({})",
        pattern.estimated_difficulty(),
        pattern.difficulty_description()
    );
    println!("Workers:    {}", config.worker_count());
    println!();

    let entropy = match config.entropy_pool() {
        Ok(Some(pool)) => pool,
        Ok(None) => collect_entropy(),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let coordinator =
        SearchCoordinator::new().with_report_interval(Duration::from_secs(config.report_interval));
    let session = match coordinator.start(config.request(entropy)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Search rejected: {}", e);
            process::exit(1);
        }
    };

    ctrlc_handler(session.handle());
    println!("Searching... (Press Ctrl+C to stop)\n");

    match session.wait() {
        Outcome::Found(result) => print_result(&result),
        Outcome::Cancelled => {
            println!("\nStopped by user.");
            process::exit(130);
        }
        Outcome::Failed(reason) => {
            eprintln!("Search failed: {}", reason);
            process::exit(1);
        }
    }
}

/// Gathers entropy from OS randomness mixed with timing jitter, at the
/// accumulator's sampling rate.
fn collect_entropy() -> EntropyPool {
    let mut accumulator = EntropyAccumulator::new();
    let mut rng = rand::thread_rng();

    info!("collecting {} entropy samples", accumulator.required());
    while !accumulator.is_ready() {
        let jitter = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as i64)
            .unwrap_or_default();
        let sample = EntropySample::new(rng.gen::<i64>(), jitter);

        if accumulator.add_sample(sample) && accumulator.len() % 25 == 0 {
            info!("entropy collected: {:.0}%", accumulator.progress() * 100.0);
        }
        thread::sleep(MIN_SAMPLE_INTERVAL);
    }
    accumulator.drain()
}

fn print_result(result: &SearchResult) {
    println!("=== Match ===");
    println!("Address:     {}", result.address);
    println!("Public Key:  {}", result.public_key);
    println!("Private Key: {}", result.private_key);
    println!();
}

fn ctrlc_handler(handle: SessionHandle) {
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        warn!("Error setting Ctrl-C handler: {}", e);
    }
}
