//! Provider profile table for runtime lookup.
//!
//! ```rust
//! use wprovider::{ProfileRegistry, ProviderId};
//!
//! let registry = ProfileRegistry::standard();
//! assert_eq!(registry.len(), 3);
//! assert_eq!(registry.get(ProviderId::OpenAi).max_retries, 3);
//! ```

use std::sync::Arc;

use wcommon::Registry;

use crate::{ProfileError, ProviderId, ProviderProfile};

#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Registry<ProviderId, Arc<ProviderProfile>>,
    fallback: Arc<ProviderProfile>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProfileRegistry {
    /// The built-in table: anthropic, openai and the conservative unknown profile.
    pub fn standard() -> Self {
        let fallback = Arc::new(ProviderProfile::unknown());
        let mut profiles = Registry::new();
        profiles.insert(ProviderId::Anthropic, Arc::new(ProviderProfile::anthropic()));
        profiles.insert(ProviderId::OpenAi, Arc::new(ProviderProfile::openai()));
        profiles.insert(ProviderId::Unknown, Arc::clone(&fallback));

        Self { profiles, fallback }
    }

    /// Replaces the entry for `profile.provider` after validating it.
    pub fn register(&mut self, profile: ProviderProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        let profile = Arc::new(profile);
        if profile.provider == ProviderId::Unknown {
            self.fallback = Arc::clone(&profile);
        }

        self.profiles.insert(profile.provider, profile);
        Ok(())
    }

    pub fn with_profile(mut self, profile: ProviderProfile) -> Result<Self, ProfileError> {
        self.register(profile)?;
        Ok(self)
    }

    pub fn get(&self, provider: ProviderId) -> Arc<ProviderProfile> {
        self.profiles
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn unknown(&self) -> Arc<ProviderProfile> {
        Arc::clone(&self.fallback)
    }

    pub fn contains(&self, provider: ProviderId) -> bool {
        self.profiles.contains_key(&provider)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        self.profiles.values().try_for_each(|profile| profile.validate())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
