//! SSH-backed device session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::DeviceSession;
use super::response::Response;
use crate::channel::PtyChannel;
use crate::channel::patterns::last_line;
use crate::error::{Result, SessionError};
use crate::platform::{DefaultBehavior, PlatformDefinition, VendorBehavior};
use crate::transport::SshTransport;
use crate::transport::config::SshConfig;

/// Interactive shell session to one device.
///
/// This handles:
/// - SSH transport and PTY channel lifecycle
/// - Command execution with prompt detection
/// - Output normalization and failure-string detection
pub struct SshSession {
    config: SshConfig,

    platform: PlatformDefinition,

    behavior: Arc<dyn VendorBehavior>,

    /// SSH transport (None when disconnected).
    transport: Option<SshTransport>,

    /// Shell channel (None when disconnected).
    channel: Option<PtyChannel>,

    /// Default timeout for commands without an explicit one.
    timeout: Duration,

    search_depth: usize,
}

impl SshSession {
    /// Create a new, unopened session.
    pub fn new(config: SshConfig, platform: PlatformDefinition, search_depth: usize) -> Self {
        let timeout = config.timeout;
        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));

        Self {
            config,
            platform,
            behavior,
            transport: None,
            channel: None,
            timeout,
            search_depth,
        }
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Set the default command timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Connect, authenticate, wait for the first prompt and run the
    /// platform's on-open commands.
    ///
    /// If anything after the TCP connect fails, the connection is torn
    /// down before the error is returned.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(SessionError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.config).await?;
        let channel = match transport.open_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("close after failed channel open: {}", close_err);
                }
                return Err(e);
            }
        };

        self.transport = Some(transport);
        self.channel = Some(PtyChannel::new(channel, self.search_depth));

        if let Err(e) = self.prepare_terminal().await {
            if let Err(close_err) = self.close().await {
                debug!("close after failed open: {}", close_err);
            }
            return Err(e);
        }

        info!("session open to {} ({})", self.config.host, self.platform.name);
        Ok(())
    }

    async fn prepare_terminal(&mut self) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;
        let banner = channel
            .read_until_pattern(&self.platform.prompt_pattern, self.timeout)
            .await?;
        debug!("initial prompt: {:?}", String::from_utf8_lossy(last_line(&banner)));

        for command in self.platform.on_open_commands.clone() {
            let response = self.send_command(&command).await?;
            if !response.is_success() {
                warn!(
                    "on-open command {:?} rejected: {}",
                    command,
                    response.failure_message.unwrap_or_default()
                );
            }
        }
        Ok(())
    }

    /// Send a command with the session's default timeout.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let timeout = self.timeout;
        self.send_command_with_timeout(command, timeout).await
    }

    /// Send a command and wait up to `timeout` for the prompt.
    ///
    /// A device-reported failure is returned as `Ok` with
    /// `failure_message` set; only transport and timeout problems are `Err`.
    ///
    /// If the previous command timed out, its prompt is awaited first (up to
    /// `timeout`); when it never arrives this command is not sent and fails
    /// with [`ChannelError::OutOfSync`](crate::error::ChannelError::OutOfSync).
    pub async fn send_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        // Late output of a timed-out command must not become this one's
        let stale = channel.resync(&self.platform.prompt_pattern, timeout).await?;
        if stale > 0 {
            debug!("discarded {} stale bytes before {:?}", stale, command);
        }

        let start = Instant::now();
        debug!("sending {:?}", command);
        channel.send(command).await?;

        let data = channel
            .read_until_pattern(&self.platform.prompt_pattern, timeout)
            .await?;
        let elapsed = start.elapsed();

        let raw_result = String::from_utf8_lossy(&data).into_owned();
        let prompt = String::from_utf8_lossy(last_line(&data)).into_owned();
        let result = self.behavior.normalize_output(&raw_result, command);

        let failure = self
            .behavior
            .detect_failure(&result)
            .or_else(|| self.platform.failure_in(&result).map(str::to_string));

        debug!("{:?} completed in {:?}", command, elapsed);

        let response = Response::new(command, result, raw_result, prompt, elapsed);
        Ok(match failure {
            Some(message) => response.with_failure(message),
            None => response,
        })
    }

    /// Whether `open()` has succeeded and `close()` has not been called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Close the channel and disconnect. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("channel close: {}", e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
            info!("session to {} closed", self.config.host);
        }
        Ok(())
    }
}

impl DeviceSession for SshSession {
    async fn send(&mut self, command: &str, timeout: Duration) -> Result<String> {
        self.send_command_with_timeout(command, timeout)
            .await?
            .into_output()
    }

    fn is_alive(&self) -> bool {
        let transport_up = self.transport.as_ref().is_some_and(|t| !t.is_closed());
        let channel_up = self.channel.as_ref().is_some_and(|c| !c.is_closed());
        transport_up && channel_up
    }

    async fn close(&mut self) -> Result<()> {
        SshSession::close(self).await
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!(
                "SshSession to {} dropped without close()",
                self.config.host
            );
        }
    }
}
