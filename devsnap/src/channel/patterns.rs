//! Pattern matching utilities for prompt detection.

use regex::bytes::Regex;

/// Compile a prompt pattern string into a regex.
///
/// Patterns without an end anchor (`$` or `\z`) get `\s*$` appended, so a
/// prompt only matches at the very end of the received data.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') || pattern.ends_with(r"\z") {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// The last line of `data`, trimmed. This is where a device prompt sits.
pub fn last_line(data: &[u8]) -> &[u8] {
    let trimmed = trim_end(data);
    let start = memchr::memrchr(b'\n', trimmed).map_or(0, |pos| pos + 1);
    &trimmed[start..]
}

/// Everything before the last line of `data`.
pub fn strip_last_line(data: &[u8]) -> &[u8] {
    let trimmed = trim_end(data);
    match memchr::memrchr(b'\n', trimmed) {
        Some(pos) => &trimmed[..pos],
        None => &[],
    }
}

fn trim_end(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &data[..end]
}
