//! Error types for devsnap.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for devsnap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Invalid command spec
    #[error("Command spec error: {0}")]
    Spec(#[from] SpecError),

    /// Run aborted before every command was attempted
    #[error("Run aborted: {0}")]
    Run(#[from] RunError),

    /// Job configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Report rendering or export errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

impl Error {
    /// The elapsed timeout, if this error is a timeout at any layer.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Error::Transport(TransportError::Timeout(d)) => Some(*d),
            Error::Channel(ChannelError::PatternTimeout(d)) => Some(*d),
            _ => None,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key is not in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// A previous read timed out and its prompt never arrived
    #[error("Channel out of sync: previous prompt not seen within {0:?}")]
    OutOfSync(Duration),

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session layer errors (command execution, lifecycle).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not connected
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// The device answered with one of the platform's failure strings
    #[error("Device rejected '{command}': {message}")]
    CommandRejected { command: String, message: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// A thread panicked while holding the platform registry lock
    #[error("Platform registry lock poisoned")]
    RegistryPoisoned,

    /// No platform registered under this name
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A platform with this name is already registered
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Command spec construction errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// The command list is empty
    #[error("command spec is empty")]
    Empty,

    /// Two entries share a label
    #[error("duplicate label '{label}'")]
    DuplicateLabel { label: String },

    /// A `label=command` pair could not be parsed
    #[error("invalid command entry '{entry}': expected LABEL=COMMAND")]
    Malformed { entry: String },
}

/// Run-level failures. Any of these discards the partial result set.
#[derive(Error, Debug)]
pub enum RunError {
    /// The session was not usable before the first command
    #[error("session is not open or no longer alive")]
    SessionUnusable,

    /// The session died while a command was in flight
    #[error("session lost while running '{label}': {source}")]
    SessionLost {
        label: String,
        #[source]
        source: Box<Error>,
    },
}

/// Job configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for a job
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Config is well-formed but unusable
    #[error("{message}")]
    Invalid { message: String },
}

/// Report export errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Writing the report failed
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON rendering failed
    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using devsnap's Error.
pub type Result<T> = std::result::Result<T, Error>;
