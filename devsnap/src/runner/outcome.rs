//! Per-command outcomes and the result set of a run.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;

use super::spec::CommandEntry;
use crate::error::{Error, SessionError};

/// Text shown in place of output for a failed command.
pub const FAILURE_SENTINEL: &str = "Command failed";

/// Why a single command produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// No prompt within the command timeout.
    Timeout(Duration),

    /// The channel or connection errored on a session that stayed alive.
    Transport(String),

    /// The device answered with one of the platform's failure strings.
    Device(String),
}

impl CommandFailure {
    /// Sort a session error into a failure kind, keeping its text.
    pub fn classify(error: &Error) -> Self {
        if let Some(elapsed) = error.timeout() {
            return Self::Timeout(elapsed);
        }
        match error {
            Error::Session(SessionError::CommandRejected { message, .. }) => {
                Self::Device(message.clone())
            }
            other => Self::Transport(other.to_string()),
        }
    }

    /// Short kind name used in exports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Device(_) => "device",
        }
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(d) => write!(f, "timed out after {:?}", d),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Device(msg) => write!(f, "device reported: {}", msg),
        }
    }
}

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Trimmed output.
    Success(String),
    Failed(CommandFailure),
}

impl Outcome {
    /// The output, or [`FAILURE_SENTINEL`] for a failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(output) => output,
            Self::Failed(_) => FAILURE_SENTINEL,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&CommandFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// One entry of a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    pub outcome: Outcome,
}

/// Label to outcome, in the order the commands ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: IndexMap<String, CommandResult>,
}

impl ResultSet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, entry: &CommandEntry, outcome: Outcome) {
        self.entries.insert(
            entry.label.clone(),
            CommandResult {
                command: entry.command.clone(),
                outcome,
            },
        );
    }

    pub fn get(&self, label: &str) -> Option<&CommandResult> {
        self.entries.get(label)
    }

    pub fn outcome(&self, label: &str) -> Option<&Outcome> {
        self.entries.get(label).map(|r| &r.outcome)
    }

    /// Output or failure sentinel for `label`.
    pub fn text(&self, label: &str) -> Option<&str> {
        self.outcome(label).map(Outcome::text)
    }

    /// Entries in run order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandResult)> {
        self.entries.iter().map(|(label, result)| (label.as_str(), result))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels whose command failed, in run order.
    pub fn failed_labels(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, result)| !result.outcome.is_success())
            .map(|(label, _)| label)
    }

    pub fn failure_count(&self) -> usize {
        self.failed_labels().count()
    }

    /// Overwrite outcomes with those from a retry run.
    ///
    /// Labels keep their original position; labels not present in `self`
    /// are appended.
    pub fn merge(&mut self, retry: ResultSet) {
        for (label, result) in retry.entries {
            self.entries.insert(label, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelError, TransportError};

    #[test]
    fn test_classify_timeout() {
        let err: Error = ChannelError::PatternTimeout(Duration::from_secs(30)).into();
        assert_eq!(
            CommandFailure::classify(&err),
            CommandFailure::Timeout(Duration::from_secs(30))
        );

        let err: Error = TransportError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(CommandFailure::classify(&err).kind(), "timeout");
    }

    #[test]
    fn test_classify_device_rejection() {
        let err: Error = SessionError::CommandRejected {
            command: "get sys bogus".into(),
            message: "command parse error".into(),
        }
        .into();
        assert_eq!(
            CommandFailure::classify(&err),
            CommandFailure::Device("command parse error".into())
        );
    }

    #[test]
    fn test_classify_transport() {
        let err: Error = ChannelError::Closed.into();
        let failure = CommandFailure::classify(&err);
        assert_eq!(failure.kind(), "transport");
        assert!(failure.to_string().contains("Channel closed"));
    }

    #[test]
    fn test_outcome_text() {
        assert_eq!(Outcome::Success("up 5 days".into()).text(), "up 5 days");
        assert_eq!(
            Outcome::Failed(CommandFailure::Timeout(Duration::from_secs(1))).text(),
            FAILURE_SENTINEL
        );
    }

    #[test]
    fn test_merge_keeps_position() {
        let first = CommandEntry::new("first", "cmd 1");
        let second = CommandEntry::new("second", "cmd 2");

        let mut results = ResultSet::default();
        results.insert(&first, Outcome::Failed(CommandFailure::Transport("reset".into())));
        results.insert(&second, Outcome::Success("two".into()));
        assert_eq!(results.failed_labels().collect::<Vec<_>>(), vec!["first"]);

        let mut retry = ResultSet::default();
        retry.insert(&first, Outcome::Success("one".into()));
        results.merge(retry);

        assert_eq!(results.labels().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(results.text("first"), Some("one"));
        assert_eq!(results.failure_count(), 0);
    }
}
