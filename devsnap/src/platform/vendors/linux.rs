//! Linux platform definition.
//!
//! This is the simplest platform, supporting standard Linux/Unix shells
//! with `$` (user) and `#` (root) prompts.

use crate::platform::PlatformDefinition;

/// Platform name for Linux hosts.
pub const PLATFORM_NAME: &str = "linux";

/// Create the Linux platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, r"[$#]\s*\z")
        .unwrap()
        .with_failure_pattern("command not found")
        .with_failure_pattern("No such file or directory")
        .with_failure_pattern("Permission denied")
        .with_failure_pattern("Operation not permitted")
        .with_default_command("Kernel", "uname -a")
        .with_default_command("Uptime", "uptime")
        .with_default_command("Memory", "free -m")
        .with_terminal_size(511, 24)
}
