//! Sequential command runner with per-command fault isolation.
//!
//! A run sends every command of a [`CommandSpec`] to a [`DeviceSession`], one
//! at a time, and records each command's [`Outcome`] under its label. A
//! command that times out or is rejected is recorded as failed and the run
//! moves on. A session that is dead before the first command, or dies while
//! a command is in flight, aborts the whole run and no results are returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use devsnap::{CommandSpec, Runner, RunnerConfig, SessionBuilder};
//!
//! # async fn example() -> Result<(), devsnap::Error> {
//! let mut session = SessionBuilder::new("192.168.10.1")
//!     .username("admin")
//!     .password("secret")
//!     .platform("fortinet")
//!     .build()?;
//! session.open().await?;
//!
//! let spec = CommandSpec::new([
//!     ("Uptime", "get system status"),
//!     ("Mem", "get system memory status"),
//! ])?;
//!
//! let mut runner = Runner::new(RunnerConfig::default());
//! let results = devsnap::runner::run_and_release(&mut runner, &mut session, &spec).await?;
//! println!("{}", results.text("Uptime").unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod outcome;
mod spec;

pub use outcome::{CommandFailure, CommandResult, FAILURE_SENTINEL, Outcome, ResultSet};
pub use spec::{CommandEntry, CommandSpec};

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{Result, RunError};
use crate::session::DeviceSession;

/// Timing knobs for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Bounded wait for each command's prompt.
    pub command_timeout: Duration,

    /// Pause between consecutive commands. Zero disables it.
    pub inter_command_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            inter_command_delay: Duration::from_secs(1),
        }
    }
}

/// Receives progress events from a run.
pub trait ProgressSink {
    /// Called before a command is sent. `position` is 1-based.
    fn command_started(&mut self, position: usize, total: usize, entry: &CommandEntry);

    /// Called once the command's outcome is known.
    fn command_finished(&mut self, entry: &CommandEntry, outcome: &Outcome, elapsed: Duration);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn command_started(&mut self, position: usize, total: usize, entry: &CommandEntry) {
        (**self).command_started(position, total, entry)
    }

    fn command_finished(&mut self, entry: &CommandEntry, outcome: &Outcome, elapsed: Duration) {
        (**self).command_finished(entry, outcome, elapsed)
    }
}

/// Sink that writes progress to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn command_started(&mut self, position: usize, total: usize, entry: &CommandEntry) {
        info!("[{}/{}] {}: {}", position, total, entry.label, entry.command);
    }

    fn command_finished(&mut self, entry: &CommandEntry, outcome: &Outcome, elapsed: Duration) {
        match outcome.failure() {
            None => debug!("{} completed in {:?}", entry.label, elapsed),
            Some(failure) => warn!("{} ({}) failed: {}", entry.label, entry.command, failure),
        }
    }
}

/// Runs command specs against device sessions.
#[derive(Debug)]
pub struct Runner<S = LogSink> {
    config: RunnerConfig,
    sink: S,
}

impl Runner<LogSink> {
    /// Runner that reports progress through `log`.
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_sink(config, LogSink)
    }
}

impl<S: ProgressSink> Runner<S> {
    pub fn with_sink(config: RunnerConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Send every command in `spec`, in order, and collect the outcomes.
    ///
    /// # Errors
    ///
    /// - [`RunError::SessionUnusable`] if the session is not alive when
    ///   the run starts. Nothing is sent.
    /// - [`RunError::SessionLost`] if a command fails and the session is
    ///   no longer alive afterwards. Results collected so far are dropped.
    pub async fn run<D: DeviceSession>(&mut self, session: &mut D, spec: &CommandSpec) -> Result<ResultSet> {
        if !session.is_alive() {
            return Err(RunError::SessionUnusable.into());
        }

        let total = spec.len();
        let mut results = ResultSet::with_capacity(total);

        for (index, entry) in spec.iter().enumerate() {
            if index > 0 && !self.config.inter_command_delay.is_zero() {
                tokio::time::sleep(self.config.inter_command_delay).await;
            }

            self.sink.command_started(index + 1, total, entry);
            let start = Instant::now();

            let outcome = match session.send(&entry.command, self.config.command_timeout).await {
                Ok(output) => Outcome::Success(output.trim().to_string()),
                Err(e) if !session.is_alive() => {
                    return Err(RunError::SessionLost {
                        label: entry.label.clone(),
                        source: Box::new(e),
                    }
                    .into());
                }
                Err(e) => {
                    debug!("{:?} failed: {:?}", entry.command, e);
                    Outcome::Failed(CommandFailure::classify(&e))
                }
            };

            self.sink.command_finished(entry, &outcome, start.elapsed());
            results.insert(entry, outcome);
        }

        Ok(results)
    }
}

/// Run `spec` and then release the session on every exit path.
///
/// A run error takes precedence over a close error, which is only logged.
/// If the run succeeded, a close error is returned.
pub async fn run_and_release<D, S>(
    runner: &mut Runner<S>,
    session: &mut D,
    spec: &CommandSpec,
) -> Result<ResultSet>
where
    D: DeviceSession,
    S: ProgressSink,
{
    let run = runner.run(session, spec).await;
    let closed = session.close().await;

    match (run, closed) {
        (Ok(results), Ok(())) => Ok(results),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(run_err), Ok(())) => Err(run_err),
        (Err(run_err), Err(close_err)) => {
            warn!("closing session after failed run: {}", close_err);
            Err(run_err)
        }
    }
}
