//! Permission sets and their integer encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::permissions::name::PermissionName;

/// One boolean per known permission, always complete and in canonical order.
///
/// Persisted as a single integer where bit `i` is the value of
/// `PermissionName::ALL[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct PermissionSet {
    entries: Vec<(PermissionName, bool)>,
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self {
            entries: PermissionName::ALL
                .iter()
                .map(|p| (*p, p.default_value()))
                .collect(),
        }
    }
}

impl PermissionSet {
    /// Decode a stored bitfield. Bits beyond the known permissions are ignored.
    pub fn decode(value: u32) -> Self {
        let mut set = Self::default();
        for (index, entry) in set.entries.iter_mut().enumerate() {
            entry.1 = value & (1 << index) != 0;
        }
        set
    }

    /// Encode into the storable bitfield.
    pub fn encode(&self) -> u32 {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, (_, value))| *value)
            .fold(0, |acc, (index, _)| acc | (1 << index))
    }

    pub fn has(&self, name: PermissionName) -> bool {
        self.entries
            .iter()
            .find(|(p, _)| *p == name)
            .map(|(_, value)| *value)
            .unwrap_or(false)
    }

    pub fn set(&mut self, name: PermissionName, value: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| *p == name) {
            entry.1 = value;
        }
    }

    /// Lookup by key; unknown keys read as `false`.
    pub fn has_named(&self, key: &str) -> bool {
        key.parse::<PermissionName>()
            .map(|name| self.has(name)).unwrap_or(false)
    }

    /// Update by key; unknown keys are ignored.
    pub fn set_named(&mut self, key: &str, value: bool) {
        match key.parse::<PermissionName>() {
            Ok(name) => self.set(name, value),
            Err(e) => tracing::debug!(error = %e, "Ignoring permission update"),
        }
    }

    /// Iterate `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (PermissionName, bool)> + '_ {
        self.entries.iter().copied()
    }

    /// Names of the granted permissions.
    pub fn granted(&self) -> Vec<PermissionName> {
        self.iter().filter(|(_, v)| *v).map(|(p, _)| p).collect()
    }
}

impl From<u32> for PermissionSet {
    fn from(value: u32) -> Self {
        Self::decode(value)
    }
}

impl From<PermissionSet> for u32 {
    fn from(set: PermissionSet) -> Self {
        set.encode()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let granted: Vec<&str> = self.granted().into_iter().map(PermissionName::key).collect();
        write!(f, "[{}]", granted.join(", "))
    }
}
