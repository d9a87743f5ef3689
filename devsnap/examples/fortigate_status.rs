//! Collect the FortiGate status commands and print them as they complete.
//!
//! This shows the library API with a custom progress sink instead of the
//! `log`-based default.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example fortigate_status -- 192.168.10.1 admin
//! ```
//!
//! The password is read from `DEVSNAP_PASSWORD`.

use std::env;
use std::time::Duration;

use devsnap::runner::{CommandEntry, Outcome, ProgressSink, run_and_release};
use devsnap::{CommandSpec, Runner, RunnerConfig, SessionBuilder, report};

/// Prints one line per command to stdout.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn command_started(&mut self, position: usize, total: usize, entry: &CommandEntry) {
        println!("[{position}/{total}] Executing: {}", entry.command);
    }

    fn command_finished(&mut self, entry: &CommandEntry, outcome: &Outcome, elapsed: Duration) {
        match outcome.failure() {
            None => println!("      {} done in {:?}", entry.label, elapsed),
            Some(failure) => println!("      {} failed: {}", entry.label, failure),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "192.168.10.1".to_string());
    let user = args.next().unwrap_or_else(|| "admin".to_string());
    let password = env::var("DEVSNAP_PASSWORD")?;

    let mut session = SessionBuilder::new(&host)
        .username(user)
        .password(password)
        .platform("fortinet")
        .build()?;

    println!("Connecting to FortiGate {host}...");
    session.open().await?;

    let spec = CommandSpec::for_platform(session.platform())?;
    let mut runner = Runner::with_sink(RunnerConfig::default(), ConsoleSink);
    let results = run_and_release(&mut runner, &mut session, &spec).await?;
    println!("Disconnected");

    report::render_sections(&mut std::io::stdout(), &results)?;

    let path = report::save(std::path::Path::new("logs"), "fortigate_status", &results)?;
    println!("\nStatus information saved to: {}", path.display());
    Ok(())
}
