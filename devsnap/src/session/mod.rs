//! Device sessions.
//!
//! [`DeviceSession`] is the small contract the command runner needs from a
//! device: send one command with a bounded wait, report whether the channel
//! is still alive, and release it. [`SshSession`] implements it on top of an
//! interactive SSH shell.

mod builder;
#[cfg(test)]
pub(crate) mod fake_device;
mod response;
mod ssh;

pub use builder::SessionBuilder;
pub use response::Response;
pub use ssh::SshSession;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// An authenticated, open channel to a remote device.
///
/// Implementations are used by exactly one run at a time; the runner holds
/// `&mut` access for the whole run.
pub trait DeviceSession: Send {
    /// Send a command and return its output.
    ///
    /// Fails if the command does not complete within `timeout`, the
    /// transport errors, or the device reports the command as failed.
    fn send(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Whether the session can still carry commands.
    fn is_alive(&self) -> bool;

    /// Release the session. Calling this on a released session is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
