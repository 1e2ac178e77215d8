//! Relay preferences reported by the signer.

use serde_json::Value;

/// Read/write flags for one endpoint. Absent flags are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayPolicy {
    pub read: Option<bool>,
    pub write: Option<bool>,
}

/// Endpoint -> policy mapping, in the order the signer reported it.
///
/// A `None` policy means the signer gave something other than an object for
/// that endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayPreferences {
    entries: Vec<(String, Option<RelayPolicy>)>,
}

impl RelayPreferences {
    /// Parse the signer's answer. Anything but an object is an empty mapping.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let entries = map
            .iter()
            .map(|(endpoint, cfg)| {
                let policy = cfg.as_object().map(|cfg| RelayPolicy {
                    read: cfg.get("read").and_then(Value::as_bool),
                    write: cfg.get("write").and_then(Value::as_bool),
                });
                (endpoint.clone(), policy)
            })
            .collect();
        Self { entries }
    }

    /// Endpoints not explicitly marked write-disabled.
    pub fn writable(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, policy)| !matches!(policy, Some(RelayPolicy { write: Some(false), .. })))
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&RelayPolicy>)> {
        self.entries.iter().map(|(e, p)| (e.as_str(), p.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
