use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity reserved for blocks created by the ledger itself (genesis).
pub const SYSTEM_IDENTITY: &str = "system";

/// Opaque identifier of a peer in the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Generates a fresh, unique identity for a peer that joined anonymously.
    pub fn generate() -> Self {
        PeerId(Uuid::new_v4().to_string())
    }

    pub fn system() -> Self {
        PeerId(SYSTEM_IDENTITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        PeerId(s.to_string())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        PeerId(s)
    }
}
