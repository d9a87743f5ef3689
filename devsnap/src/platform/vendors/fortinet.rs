//! Fortinet FortiGate (FortiOS) platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! FGT60E #                  # super_admin
//! FGT60E $                  # read-only admin
//! FGT60E (global) #         # multi-VDOM global context
//! FGT60E (interface) #      # config context
//! ```
//!
//! FortiOS pages long output with `--More--` unless the console is set to
//! `set output standard` under `config system console`. Devices polled by
//! devsnap are expected to have standard output configured.

use crate::platform::PlatformDefinition;

/// Platform name for FortiGate.
pub const PLATFORM_NAME: &str = "fortinet";

/// Create the FortiGate platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(
        PLATFORM_NAME,
        r"(?:\A|\n)[\w.\-@/:]{1,63}(?: \([\w.\- ]{1,63}\))? ?[#$]\s*\z",
    )
    .unwrap()
    .with_failure_pattern("Command fail. Return code")
    .with_failure_pattern("Unknown action")
    .with_failure_pattern("command parse error")
    .with_failure_pattern("Permission denied")
    .with_default_command("System Status", "get system status")
    .with_default_command("Performance", "get system performance status")
    .with_default_command("Physical Interfaces", "get system interface physical")
    .with_default_command("Session Status", "diagnose sys session status")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fortinet_platform() {
        let platform = platform();
        assert_eq!(platform.name, "fortinet");
        assert_eq!(platform.default_commands.len(), 4);
        assert_eq!(
            platform.default_commands[0],
            ("System Status".to_string(), "get system status".to_string())
        );
    }

    #[test]
    fn test_prompt_match() {
        let prompt = platform().prompt_pattern;
        assert!(prompt.is_match(b"FGT60E # "));
        assert!(prompt.is_match(b"FGT60E #"));
        assert!(prompt.is_match(b"FGT60E $ "));
        assert!(prompt.is_match(b"FortiGate-VM64 (global) # "));
        assert!(prompt.is_match(b"Version: FortiGate-60E\nHostname: FGT60E\nFGT60E # "));
    }

    #[test]
    fn test_prompt_not_matched_mid_output() {
        let prompt = platform().prompt_pattern;
        assert!(!prompt.is_match(b"FGT60E # get system status\nVersion: FortiGate-60E"));
        assert!(!prompt.is_match(b"System uptime: 5 days"));
    }

    #[test]
    fn test_failure_strings() {
        let platform = platform();
        assert_eq!(
            platform.failure_in("Unknown action 0\nCommand fail. Return code -1"),
            Some("Command fail. Return code")
        );
    }
}
