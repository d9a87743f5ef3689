//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Error, Result};

/// Default number of trailing bytes searched for a prompt.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Used when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// High-level PTY channel for interactive device sessions.
///
/// Wraps a russh shell channel and provides pattern-based read
/// operations with timeout handling.
pub struct PtyChannel {
    channel: Channel<Msg>,

    /// Pattern buffer for accumulating output.
    buffer: PatternBuffer,

    /// Set once the remote side sent EOF or closed the channel.
    closed: bool,

    /// A read timed out before its prompt; the rest of that reply may
    /// still be queued on the channel.
    out_of_sync: bool,
}

impl PtyChannel {
    pub fn new(channel: Channel<Msg>, search_depth: usize) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(search_depth),
            closed: false,
            out_of_sync: false,
        }
    }

    /// Send a line of input, terminated with a newline.
    pub async fn send(&mut self, input: &str) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed.into());
        }
        let line = format!("{input}\n");
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` matches the buffer tail, returning everything
    /// received up to and including the match.
    ///
    /// On timeout the partial output stays buffered and the channel is
    /// marked out of sync; call [`resync`](Self::resync) before the next
    /// command.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = deadline_after(timeout);

        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }
            if self.closed {
                return Err(ChannelError::Closed.into());
            }

            match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Ok(msg) => self.absorb(msg),
                Err(_) => {
                    self.out_of_sync = true;
                    return Err(ChannelError::PatternTimeout(timeout).into());
                }
            }
        }
    }

    fn absorb(&mut self, msg: Option<ChannelMsg>) {
        match msg {
            Some(ChannelMsg::Data { ref data }) => {
                trace!("channel read {} bytes", data.len());
                self.buffer.extend(&data[..]);
            }
            Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                self.buffer.extend(&data[..]);
            }
            Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                debug!("channel closed by remote");
                self.closed = true;
            }
            Some(_) => {}
        }
    }

    /// Get the channel ready for the next command, returning the number of
    /// stale bytes dropped.
    ///
    /// After a timed-out read this keeps consuming output until `pattern`
    /// matches, so the late reply is not taken as the next command's
    /// output. Fails with [`ChannelError::OutOfSync`] if the prompt does not
    /// show up within `grace`; the channel stays out of sync.
    pub async fn resync(&mut self, pattern: &Regex, grace: Duration) -> Result<usize> {
        if !self.out_of_sync {
            return Ok(self.discard());
        }

        match self.read_until_pattern(pattern, grace).await {
            Ok(late) => {
                debug!("resynchronized after {} late bytes", late.len());
                self.out_of_sync = false;
                Ok(late.len() + self.discard())
            }
            Err(Error::Channel(ChannelError::PatternTimeout(_))) => {
                Err(ChannelError::OutOfSync(grace).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Drop any buffered output, returning how many bytes were dropped.
    pub fn discard(&mut self) -> usize {
        let stale = self.buffer.len();
        self.buffer.clear();
        stale
    }

    /// Whether a timed-out read is still waiting for its prompt.
    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Whether the remote side closed the channel.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the channel.
    pub async fn close(self) -> Result<()> {
        if !self.closed {
            self.channel.close().await.map_err(ChannelError::Ssh)?;
        }
        Ok(())
    }
}
