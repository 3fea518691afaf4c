//! Provider detection from inbound `provider_info` metadata.
//!
//! ```rust
//! use serde_json::json;
//! use wprovider::{ProfileRegistry, ProviderId, ProviderInfo, detect};
//!
//! let registry = ProfileRegistry::standard();
//! let info = ProviderInfo::from_value(&json!({
//!     "provider": "anthropic",
//!     "model": "claude-sonnet-4",
//!     "orchestrator_type": "langgraph"
//! }));
//!
//! let detected = detect(&registry, info.as_ref()).expect("info present");
//! assert_eq!(detected.provider, ProviderId::Anthropic);
//! assert_eq!(detected.profile.max_retries, 5);
//!
//! assert_eq!(registry.resolve(None).provider, ProviderId::Unknown);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProfileRegistry, ProviderId, ProviderProfile};

/// Raw provider triple as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderInfo {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub orchestrator_type: String,
}

impl ProviderInfo {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        orchestrator_type: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            orchestrator_type: orchestrator_type.into(),
        }
    }

    /// Lenient extraction: a non-object or mistyped value yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        serde_json::from_value(value.clone()).ok()
    }

    pub fn provider_id(&self) -> ProviderId {
        ProviderId::from_name(&self.provider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedProvider {
    pub provider: ProviderId,
    pub model: String,
    pub orchestrator: String,
    pub profile: Arc<ProviderProfile>,
}

impl ProfileRegistry {
    pub fn resolve(&self, info: Option<&ProviderInfo>) -> Arc<ProviderProfile> {
        match info {
            Some(info) => self.get(info.provider_id()),
            None => self.unknown(),
        }
    }
}

/// Resolves `info` against `registry`, keeping the model and orchestrator alongside the
/// profile. Absent info detects nothing.
pub fn detect(registry: &ProfileRegistry, info: Option<&ProviderInfo>) -> Option<DetectedProvider> {
    let info = info?;
    let profile = registry.resolve(Some(info));

    Some(DetectedProvider {
        provider: profile.provider,
        model: info.model.clone(),
        orchestrator: info.orchestrator_type.clone(),
        profile,
    })
}
