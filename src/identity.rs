//! Identity configuration documents produced by enrollment.

use serde::{Deserialize, Serialize};

/// PEM-encoded key material bound to an enrolled identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityMaterial {
    pub cert: String,
    pub key: String,
    pub ca: String,
}

/// The configuration document an enrollment yields. `controller` is the
/// overlay controller endpoint the identity authenticates against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub controller: String,
    pub id: IdentityMaterial,
}

impl IdentityConfig {
    /// Canonical serialized form, as delivered through the completion bridge
    /// and written to disk by the enroll CLI.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
