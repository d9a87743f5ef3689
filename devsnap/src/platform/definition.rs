//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;

use regex::bytes::Regex;

use super::VendorBehavior;
use crate::channel::compile_prompt_pattern;

/// Platform definition containing all vendor-specific configuration.
///
/// Prompt patterns are matched against the tail of the received output and
/// must only match when the prompt is the final line. Built-in platforms
/// write them as `(?:\A|\n)<prompt>\s*\z`; an unanchored pattern gets
/// `\s*$` appended.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "fortinet", "cisco_ios").
    pub name: String,

    /// Pattern matching the prompt that terminates every response.
    pub prompt_pattern: Regex,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the session is opened.
    pub on_open_commands: Vec<String>,

    /// Status commands as (label, command), in display order.
    pub default_commands: Vec<(String, String)>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Optional vendor-specific behavior.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>, prompt_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            prompt_pattern: compile_prompt_pattern(prompt_pattern)?,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            default_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            behavior: None,
        })
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add a default status command.
    pub fn with_default_command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.default_commands.push((label.into(), command.into()));
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// First failure string contained in `output`, if any.
    pub fn failure_in(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("prompt_pattern", &self.prompt_pattern.as_str())
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("default_commands", &self.default_commands)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_in() {
        let platform = PlatformDefinition::new("test", r"#\s*\z")
            .unwrap()
            .with_failure_pattern("% Invalid input")
            .with_failure_pattern("% Incomplete command");

        assert_eq!(
            platform.failure_in("   ^\n% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.failure_in("Cisco IOS Software"), None);
    }

    #[test]
    fn test_unanchored_prompt_gets_anchor() {
        let platform = PlatformDefinition::new("lab", r"lab-fw #").unwrap();
        assert!(platform.prompt_pattern.is_match(b"output\nlab-fw # "));
        assert!(!platform.prompt_pattern.is_match(b"lab-fw # show"));
    }

    #[test]
    fn test_invalid_prompt_pattern() {
        assert!(PlatformDefinition::new("broken", r"(unclosed").is_err());
    }
}
