//! Ordered (label, command) lists.

use std::collections::HashSet;

use serde::Deserialize;

use super::outcome::ResultSet;
use crate::error::SpecError;
use crate::platform::PlatformDefinition;

/// One labelled command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandEntry {
    /// Key in the result set and section header in reports.
    pub label: String,

    /// Command line sent to the device.
    pub command: String,
}

impl CommandEntry {
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
        }
    }

    /// Parse `LABEL=COMMAND`, splitting at the first `=`. Both halves are
    /// trimmed; later `=` stay in the command.
    pub fn parse(entry: &str) -> Result<Self, SpecError> {
        let malformed = || SpecError::Malformed {
            entry: entry.to_string(),
        };
        let (label, command) = entry.split_once('=').ok_or_else(malformed)?;
        let (label, command) = (label.trim(), command.trim());
        if label.is_empty() || command.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(label, command))
    }
}

/// A non-empty, ordered list of commands with unique labels.
///
/// Order decides both execution order and display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    entries: Vec<CommandEntry>,
}

impl CommandSpec {
    /// Build a spec from (label, command) pairs.
    pub fn new<I, L, C>(pairs: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = (L, C)>,
        L: Into<String>,
        C: Into<String>,
    {
        Self::from_entries(
            pairs
                .into_iter()
                .map(|(label, command)| CommandEntry::new(label, command))
                .collect(),
        )
    }

    /// Build a spec from entries, rejecting empty lists and repeated labels.
    pub fn from_entries(entries: Vec<CommandEntry>) -> Result<Self, SpecError> {
        if entries.is_empty() {
            return Err(SpecError::Empty);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.label.as_str()) {
                return Err(SpecError::DuplicateLabel {
                    label: entry.label.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// The platform's default status commands.
    pub fn for_platform(platform: &PlatformDefinition) -> Result<Self, SpecError> {
        Self::new(platform.default_commands.iter().cloned())
    }

    /// Entries whose outcome in `results` is a failure, in spec order.
    ///
    /// `None` when nothing failed. Used to layer a retry on top of a run.
    pub fn failed_subset(&self, results: &ResultSet) -> Option<Self> {
        let failed: Vec<CommandEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                results
                    .outcome(&entry.label)
                    .is_some_and(|outcome| !outcome.is_success())
            })
            .cloned()
            .collect();

        Self::from_entries(failed).ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed spec.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}

impl<'a> IntoIterator for &'a CommandSpec {
    type Item = &'a CommandEntry;
    type IntoIter = std::slice::Iter<'a, CommandEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors;

    #[test]
    fn test_empty_spec_rejected() {
        let pairs: Vec<(&str, &str)> = vec![];
        assert_eq!(CommandSpec::new(pairs).unwrap_err(), SpecError::Empty);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = CommandSpec::new([
            ("Uptime", "get system status"),
            ("Mem", "get system memory status"),
            ("Uptime", "diagnose sys top"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::DuplicateLabel {
                label: "Uptime".to_string()
            }
        );
    }

    #[test]
    fn test_order_preserved() {
        let spec = CommandSpec::new([("b", "cmd b"), ("a", "cmd a"), ("c", "cmd c")]).unwrap();
        assert_eq!(spec.labels().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(spec.get("a").unwrap().command, "cmd a");
        assert_eq!(spec.len(), 3);
    }

    #[test]
    fn test_parse_entry() {
        let entry = CommandEntry::parse("Sessions = diagnose sys session filter dport=443").unwrap();
        assert_eq!(entry.label, "Sessions");
        assert_eq!(entry.command, "diagnose sys session filter dport=443");

        let entry = CommandEntry::parse("Arp=  show arp  ").unwrap();
        assert_eq!(entry.command, "show arp");

        assert!(CommandEntry::parse("no separator").is_err());
        assert!(CommandEntry::parse("=show version").is_err());
        assert!(CommandEntry::parse("Version=").is_err());
    }

    #[test]
    fn test_for_platform() {
        let spec = CommandSpec::for_platform(&vendors::fortinet::platform()).unwrap();
        assert_eq!(
            spec.labels().collect::<Vec<_>>(),
            vec!["System Status", "Performance", "Physical Interfaces", "Session Status"]
        );
    }
}
