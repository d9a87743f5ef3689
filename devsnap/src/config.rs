//! Job configuration: which device to poll, which commands to run, and
//! where to put the report.
//!
//! A job file is TOML. Every section is optional; command-line flags are
//! layered on top with [`JobConfig::apply`].
//!
//! ```toml
//! [device]
//! host = "192.168.10.1"
//! username = "admin"
//! platform = "fortinet"
//!
//! [runner]
//! command_timeout_secs = 30
//! inter_command_delay_ms = 1000
//!
//! [output]
//! directory = "logs"
//! prefix = "fortigate_status"
//!
//! [[commands]]
//! label = "System Status"
//! command = "get system status"
//! ```
//!
//! Passwords are deliberately not part of the file format.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::platform::PlatformDefinition;
use crate::runner::{CommandEntry, CommandSpec, RunnerConfig};
use crate::transport::HostKeyVerification;

/// A complete job description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub device: DeviceConfig,
    pub runner: RunnerSection,
    pub output: OutputConfig,
    /// Commands to run. Empty means the platform's defaults.
    pub commands: Vec<CommandEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub platform: String,
    pub connect_timeout_secs: u64,
    pub host_key: HostKeyVerification,
    pub known_hosts: Option<PathBuf>,
    /// Private key file; password authentication is used when unset.
    pub key: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 22,
            username: None,
            platform: "fortinet".to_string(),
            connect_timeout_secs: 30,
            host_key: HostKeyVerification::default(),
            known_hosts: None,
            key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSection {
    pub command_timeout_secs: u64,
    pub inter_command_delay_ms: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            command_timeout_secs: 30,
            inter_command_delay_ms: 1000,
        }
    }
}

/// Report format printed to the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File name prefix. Defaults to `<platform>_status`.
    pub prefix: Option<String>,
    /// Whether to write the timestamped report file.
    pub save: bool,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            prefix: None,
            save: true,
            format: OutputFormat::default(),
        }
    }
}

/// Values given on the command line. `None`/empty leaves the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub platform: Option<String>,
    pub key: Option<PathBuf>,
    pub connect_timeout_secs: Option<u64>,
    pub command_timeout_secs: Option<u64>,
    pub inter_command_delay_ms: Option<u64>,
    pub host_key: Option<HostKeyVerification>,
    pub known_hosts: Option<PathBuf>,
    pub commands: Vec<CommandEntry>,
    pub output_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub no_save: bool,
    pub json: bool,
}

impl JobConfig {
    /// Read and parse a job file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse job TOML. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Layer command-line values over the file values.
    pub fn apply(&mut self, overrides: Overrides) {
        let device = &mut self.device;
        if let Some(host) = overrides.host {
            device.host = Some(host);
        }
        if let Some(port) = overrides.port {
            device.port = port;
        }
        if let Some(username) = overrides.username {
            device.username = Some(username);
        }
        if let Some(platform) = overrides.platform {
            device.platform = platform;
        }
        if let Some(key) = overrides.key {
            device.key = Some(key);
        }
        if let Some(secs) = overrides.connect_timeout_secs {
            device.connect_timeout_secs = secs;
        }
        if let Some(mode) = overrides.host_key {
            device.host_key = mode;
        }
        if let Some(path) = overrides.known_hosts {
            device.known_hosts = Some(path);
        }

        if let Some(secs) = overrides.command_timeout_secs {
            self.runner.command_timeout_secs = secs;
        }
        if let Some(ms) = overrides.inter_command_delay_ms {
            self.runner.inter_command_delay_ms = ms;
        }

        // Commands given on the command line replace the file's list
        if !overrides.commands.is_empty() {
            self.commands = overrides.commands;
        }

        if let Some(dir) = overrides.output_dir {
            self.output.directory = dir;
        }
        if let Some(prefix) = overrides.prefix {
            self.output.prefix = Some(prefix);
        }
        if overrides.no_save {
            self.output.save = false;
        }
        if overrides.json {
            self.output.format = OutputFormat::Json;
        }
    }

    /// Check the merged job is runnable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> crate::Error {
            ConfigError::Invalid {
                message: message.to_string(),
            }
            .into()
        };

        match self.device.host.as_deref() {
            Some(host) if !host.trim().is_empty() => {}
            _ => return Err(invalid("device host is required (--host or [device].host)")),
        }
        if self.device.port == 0 {
            return Err(invalid("device port must be non-zero"));
        }
        if self.device.connect_timeout_secs == 0 {
            return Err(invalid("connect_timeout_secs must be positive"));
        }
        if self.runner.command_timeout_secs == 0 {
            return Err(invalid("command_timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            command_timeout: Duration::from_secs(self.runner.command_timeout_secs),
            inter_command_delay: Duration::from_millis(self.runner.inter_command_delay_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.device.connect_timeout_secs)
    }

    /// The job's commands, or the platform's defaults when none are listed.
    pub fn command_spec(&self, platform: &PlatformDefinition) -> Result<CommandSpec> {
        let spec = if self.commands.is_empty() {
            CommandSpec::for_platform(platform)?
        } else {
            CommandSpec::from_entries(self.commands.clone())?
        };
        Ok(spec)
    }

    pub fn report_prefix(&self) -> String {
        self.output
            .prefix
            .clone()
            .unwrap_or_else(|| format!("{}_status", self.device.platform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::error::SpecError;
    use crate::platform::vendors;

    const JOB: &str = r#"
[device]
host = "192.168.10.1"
username = "admin"
platform = "fortinet"
host_key = "strict"

[runner]
inter_command_delay_ms = 250

[output]
prefix = "fortigate_status"

[[commands]]
label = "Uptime"
command = "get system status"

[[commands]]
label = "Mem"
command = "get system memory status"
"#;

    fn parse(content: &str) -> Result<JobConfig> {
        JobConfig::parse(content, Path::new("job.toml"))
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let config = parse("").unwrap();
        assert_eq!(config, JobConfig::default());
        assert_eq!(config.device.port, 22);
        assert_eq!(config.device.platform, "fortinet");
        assert_eq!(config.runner_config(), RunnerConfig::default());
        assert!(config.output.save);
        assert_eq!(config.report_prefix(), "fortinet_status");
    }

    #[test]
    fn test_parse_full_job() {
        let config = parse(JOB).unwrap();
        assert_eq!(config.device.host.as_deref(), Some("192.168.10.1"));
        assert_eq!(config.device.host_key, HostKeyVerification::Strict);
        assert_eq!(config.runner.command_timeout_secs, 30);
        assert_eq!(
            config.runner_config().inter_command_delay,
            Duration::from_millis(250)
        );
        assert_eq!(config.report_prefix(), "fortigate_status");

        let spec = config.command_spec(&vendors::fortinet::platform()).unwrap();
        assert_eq!(spec.labels().collect::<Vec<_>>(), vec!["Uptime", "Mem"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse("[device]\nhostname = \"fw\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_platform_defaults_when_no_commands() {
        let config = parse("[device]\nhost = \"10.0.0.1\"\nplatform = \"cisco_ios\"\n").unwrap();
        let spec = config.command_spec(&vendors::cisco_ios::platform()).unwrap();
        assert_eq!(spec.labels().collect::<Vec<_>>(), vec!["Version", "Interfaces"]);
    }

    #[test]
    fn test_duplicate_labels_in_file() {
        let config = parse(
            "[[commands]]\nlabel = \"A\"\ncommand = \"x\"\n[[commands]]\nlabel = \"A\"\ncommand = \"y\"\n",
        )
        .unwrap();
        let err = config.command_spec(&vendors::linux::platform()).unwrap_err();
        assert!(matches!(
            err,
            Error::Spec(SpecError::DuplicateLabel { ref label }) if label == "A"
        ));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = parse(JOB).unwrap();
        config.apply(Overrides {
            host: Some("10.1.1.1".into()),
            port: Some(2222),
            command_timeout_secs: Some(5),
            commands: vec![CommandEntry::new("Perf", "get system performance status")],
            no_save: true,
            json: true,
            ..Default::default()
        });

        assert_eq!(config.device.host.as_deref(), Some("10.1.1.1"));
        assert_eq!(config.device.port, 2222);
        assert_eq!(config.device.username.as_deref(), Some("admin"));
        assert_eq!(config.runner_config().command_timeout, Duration::from_secs(5));
        assert_eq!(config.commands.len(), 1);
        assert!(!config.output.save);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_requires_host() {
        let err = JobConfig::default().validate().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid { .. })));

        let mut config = JobConfig::default();
        config.device.host = Some("fw".into());
        config.runner.command_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = JobConfig::load(Path::new("/nonexistent/devsnap.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Read { .. })));
    }
}
