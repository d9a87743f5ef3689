//! Response type for a single command sent over a session.

use std::time::Duration;

use crate::error::{Result, SessionError};

/// What came back from one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// Output with the command echo and trailing prompt removed.
    pub result: String,

    /// Output as received, after ANSI stripping.
    pub raw_result: String,

    /// The prompt line that ended the output.
    pub prompt: String,

    pub elapsed: Duration,

    /// The failure string the device answered with, if any.
    pub failure_message: Option<String>,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Mark the response as rejected by the device.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// The normalized output, or [`SessionError::CommandRejected`] if the
    /// device reported a failure.
    pub fn into_output(self) -> Result<String> {
        match self.failure_message {
            None => Ok(self.result),
            Some(message) => Err(SessionError::CommandRejected {
                command: self.command,
                message,
            }
            .into()),
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_into_output_success() {
        let response = Response::new(
            "get system status",
            "Version: FortiGate-60E",
            "FGT # get system status\nVersion: FortiGate-60E\nFGT # ",
            "FGT #",
            Duration::from_millis(120),
        );
        assert!(response.is_success());
        assert_eq!(response.into_output().unwrap(), "Version: FortiGate-60E");
    }

    #[test]
    fn test_into_output_rejected() {
        let response = Response::new("get sys bogus", "command parse error", "", "FGT #", Duration::ZERO)
            .with_failure("command parse error");
        assert!(!response.is_success());

        match response.into_output().unwrap_err() {
            Error::Session(SessionError::CommandRejected { command, message }) => {
                assert_eq!(command, "get sys bogus");
                assert_eq!(message, "command parse error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
