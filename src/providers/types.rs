//! Shared types for the provider registry.

use serde::{Deserialize, Serialize};

/// One external service integration, addressed by id and remote endpoint.
///
/// `known_commands` is an ordered, deduplicated list: seeded at registration
/// and extended append-only after a successful remote catalog fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub endpoint: String,
    #[serde(default)]
    pub known_commands: Vec<String>,
}

impl ProviderDescriptor {
    pub fn new(id: &str, display_name: &str, endpoint: &str, commands: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            endpoint: endpoint.to_string(),
            known_commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }
}
