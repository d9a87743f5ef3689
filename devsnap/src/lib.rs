//! # devsnap
//!
//! Status snapshots from network devices over interactive SSH sessions.
//!
//! devsnap opens a CLI session to a FortiGate, Cisco IOS, Juniper JUNOS or
//! Linux device, runs an ordered list of labelled diagnostic commands, and
//! collects the output of each one. A command that times out or is rejected
//! by the device is recorded as failed without stopping the rest of the run.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Tail-only prompt matching over an ANSI-stripped buffer
//! - Per-command fault isolation with typed failure kinds
//! - Console, JSON and timestamped text-file reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use devsnap::{CommandSpec, Runner, RunnerConfig, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), devsnap::Error> {
//!     let mut session = SessionBuilder::new("192.168.10.1")
//!         .username("admin")
//!         .password("secret")
//!         .platform("fortinet")
//!         .build()?;
//!
//!     session.open().await?;
//!
//!     let spec = CommandSpec::for_platform(session.platform())?;
//!     let mut runner = Runner::new(RunnerConfig::default());
//!     let results = devsnap::runner::run_and_release(&mut runner, &mut session, &spec).await?;
//!
//!     devsnap::report::render_sections(&mut std::io::stdout(), &results).ok();
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod platform;
pub mod report;
pub mod runner;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use config::JobConfig;
pub use error::Error;
pub use platform::{PlatformDefinition, PlatformRegistry};
pub use runner::{
    CommandEntry, CommandFailure, CommandSpec, Outcome, ProgressSink, ResultSet, Runner,
    RunnerConfig,
};
pub use session::{DeviceSession, Response, SessionBuilder, SshSession};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
