//! Juniper JUNOS platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! user@router>              # operational mode
//! user@router#              # configuration mode
//! {master:0}                # routing-engine indicator (separate line)
//! user@router>              # prompt on next line
//! ```

use crate::platform::PlatformDefinition;

/// Platform name for Juniper JUNOS.
pub const PLATFORM_NAME: &str = "juniper_junos";

/// Create the Juniper JUNOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, r"(?:\A|\n)[\w\-@()/:.]{1,63}[>#%]\s*\z")
        .unwrap()
        .with_failure_pattern("is ambiguous")
        .with_failure_pattern("No valid completions")
        .with_failure_pattern("unknown command")
        .with_failure_pattern("syntax error")
        .with_on_open_command("set cli screen-length 0")
        .with_on_open_command("set cli screen-width 511")
        .with_default_command("Version", "show version")
        .with_default_command("Interfaces", "show interfaces terse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_match() {
        let prompt = platform().prompt_pattern;
        assert!(prompt.is_match(b"user@router> "));
        assert!(prompt.is_match(b"user@router#"));
        assert!(prompt.is_match(b"{master:0}\nuser@router> "));
        assert!(!prompt.is_match(b"user@router> show version"));
    }

    #[test]
    fn test_failure_strings() {
        let platform = platform();
        assert_eq!(
            platform.failure_in("                 ^\nunknown command."),
            Some("unknown command")
        );
    }
}
