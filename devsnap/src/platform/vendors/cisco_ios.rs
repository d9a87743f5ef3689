//! Cisco IOS / IOS-XE platform definition.
//!
//! ```text
//! router>                   # user exec
//! router#                   # privileged exec
//! router(config-if)#        # configuration sub-mode
//! ```

use crate::platform::PlatformDefinition;

/// Platform name for Cisco IOS.
pub const PLATFORM_NAME: &str = "cisco_ios";

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(
        PLATFORM_NAME,
        r"(?:\A|\n)[\w.\-@/:]{1,63}(?:\(config[\w.\-@/:+]{0,32}\))?[>#]\s*\z",
    )
    .unwrap()
    .with_failure_pattern("% Ambiguous command")
    .with_failure_pattern("% Incomplete command")
    .with_failure_pattern("% Invalid input")
    .with_failure_pattern("% Unknown command")
    .with_on_open_command("terminal length 0")
    .with_on_open_command("terminal width 512")
    .with_default_command("Version", "show version")
    .with_default_command("Interfaces", "show ip interface brief")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_match() {
        let prompt = platform().prompt_pattern;
        assert!(prompt.is_match(b"router>"));
        assert!(prompt.is_match(b"router# "));
        assert!(prompt.is_match(b"core-sw01.lab#"));
        assert!(prompt.is_match(b"router(config-if)#"));
        assert!(!prompt.is_match(b"router# show version"));
    }

    #[test]
    fn test_paging_disabled_on_open() {
        let platform = platform();
        assert_eq!(platform.on_open_commands[0], "terminal length 0");
    }
}
