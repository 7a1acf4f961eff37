//! Provider catalog — which services exist, where they live, and which
//! command slugs they accept.

pub mod registry;
pub mod types;

// Re-exports for convenience
pub use registry::{ProviderRegistry, DEFAULT_GATEWAY_URL};
pub use types::ProviderDescriptor;
