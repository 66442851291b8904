use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read and parse JSON piped on stdin.
///
/// Returns Ok(None) when stdin is an interactive terminal or carries no
/// data, so callers can fall back to requiring --input.
pub fn read_json<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed: T =
        serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse stdin as JSON: {e}"))?;
    Ok(Some(parsed))
}
