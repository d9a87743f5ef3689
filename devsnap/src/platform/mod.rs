//! Platform definitions for multi-vendor support.
//!
//! A platform describes how a device family's CLI looks from the outside:
//! the prompt that ends every response, the strings that mean a command was
//! rejected, the commands that prepare the terminal, and the status commands
//! collected when a job does not list its own.

mod definition;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use registry::PlatformRegistry;

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Normalize command output (strip command echo, trailing prompt).
    fn normalize_output(&self, raw: &str, command: &str) -> String;

    /// Detect command failure from output that the failure strings miss.
    fn detect_failure(&self, output: &str) -> Option<String>;
}

/// Default vendor behavior implementation.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        // Echo line may carry the prompt in front of the command
        let output = match raw.split_once('\n') {
            Some((first, rest)) if first.trim_end().ends_with(command.trim()) => rest,
            None if raw.trim_end().ends_with(command.trim()) => "",
            _ => raw,
        };

        // Trailing prompt is the last line
        let output = output.trim_end();
        match output.rfind('\n') {
            Some(pos) => output[..pos].to_string(),
            None => String::new(),
        }
    }

    fn detect_failure(&self, _output: &str) -> Option<String> {
        None
    }
}
