//! Relay endpoint validation.

use std::fmt;

use crate::error::{RelayError, Result};

/// The only scheme a relay endpoint may use.
pub const RELAY_SCHEME: &str = "wss";

/// A validated relay endpoint: trimmed, `wss://`, with a host.
///
/// The original (trimmed) spelling is kept for display and deduplication.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RelayUrl(String);

impl RelayUrl {
    /// Validate an endpoint string.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if !trimmed.starts_with("wss://") {
            return Err(RelayError::InvalidUrl(trimmed.to_string()));
        }
        let parsed =
            url::Url::parse(trimmed).map_err(|_| RelayError::InvalidUrl(trimmed.to_string()))?;
        if parsed.scheme() != RELAY_SCHEME || parsed.host_str().map_or(true, str::is_empty) {
            return Err(RelayError::InvalidUrl(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelayUrl({})", self.0)
    }
}

/// Validate, deduplicate (first occurrence wins) and cap a relay list.
///
/// Invalid entries are dropped without error.
pub fn normalize_relays<I, S>(relays: I, max: usize) -> Vec<RelayUrl>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<RelayUrl> = Vec::new();
    for relay in relays {
        let Ok(url) = RelayUrl::parse(relay.as_ref()) else {
            continue;
        };
        if out.contains(&url) {
            continue;
        }
        if out.len() == max {
            break;
        }
        out.push(url);
    }
    out
}
