//! Immutable per-provider connection and dispatch tuning.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use wprovider::{ChunkBuffering, ProviderId, ProviderProfile};
//!
//! let profile = ProviderProfile::anthropic();
//! assert_eq!(profile.provider, ProviderId::Anthropic);
//! assert_eq!(profile.ping_interval, Duration::from_secs(15));
//! assert_eq!(profile.chunk_buffering, ChunkBuffering::Immediate);
//! assert!(profile.use_recoverable_errors);
//! ```

use std::time::Duration;

use crate::{ProfileError, ProviderId};

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkBuffering {
    /// Every chunk is surfaced the moment it is dispatched.
    #[default]
    Immediate,
    /// Chunk text is coalesced until at least `size` bytes are pending.
    Buffered { size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    Disabled,
    #[default]
    Deflate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: ProviderId,
    pub chunk_buffering: ChunkBuffering,
    pub compression: CompressionMode,
    pub use_recoverable_errors: bool,
    pub max_retries: u32,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub max_message_size: usize,
}

impl ProviderProfile {
    pub fn anthropic() -> Self {
        Self {
            provider: ProviderId::Anthropic,
            chunk_buffering: ChunkBuffering::Immediate,
            compression: CompressionMode::Deflate,
            use_recoverable_errors: true,
            max_retries: 5,
            ping_interval: Duration::from_secs(15),
            ping_timeout: Duration::from_secs(8),
            max_message_size: 2 * MIB,
        }
    }

    pub fn openai() -> Self {
        Self {
            provider: ProviderId::OpenAi,
            chunk_buffering: ChunkBuffering::Immediate,
            compression: CompressionMode::Deflate,
            use_recoverable_errors: false,
            max_retries: 3,
            ping_interval: Duration::from_secs(20),
            ping_timeout: Duration::from_secs(10),
            max_message_size: MIB,
        }
    }

    /// Conservative defaults for unclassified and pre-detection traffic.
    pub fn unknown() -> Self {
        Self {
            provider: ProviderId::Unknown,
            chunk_buffering: ChunkBuffering::Immediate,
            compression: CompressionMode::Deflate,
            use_recoverable_errors: false,
            max_retries: 3,
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(15),
            max_message_size: MIB,
        }
    }

    pub fn standard(provider: ProviderId) -> Self {
        match provider {
            ProviderId::Anthropic => Self::anthropic(),
            ProviderId::OpenAi => Self::openai(),
            ProviderId::Unknown => Self::unknown(),
        }
    }

    pub fn with_chunk_buffering(mut self, chunk_buffering: ChunkBuffering) -> Self {
        self.chunk_buffering = chunk_buffering;
        self
    }

    pub fn with_compression(mut self, compression: CompressionMode) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_recoverable_errors(mut self, enabled: bool) -> Self {
        self.use_recoverable_errors = enabled;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_ping(mut self, interval: Duration, timeout: Duration) -> Self {
        self.ping_interval = interval;
        self.ping_timeout = timeout;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.ping_interval.is_zero() {
            return Err(ProfileError::invalid_ping(format!(
                "{} profile ping interval must be greater than zero",
                self.provider
            )));
        }

        if self.ping_timeout.is_zero() {
            return Err(ProfileError::invalid_ping(format!(
                "{} profile ping timeout must be greater than zero",
                self.provider
            )));
        }

        if self.max_message_size == 0 {
            return Err(ProfileError::invalid_message_size(format!(
                "{} profile max message size must be greater than zero",
                self.provider
            )));
        }

        if let ChunkBuffering::Buffered { size: 0 } = self.chunk_buffering {
            return Err(ProfileError::invalid_buffering(format!(
                "{} profile buffered mode requires a non-zero buffer size",
                self.provider
            )));
        }

        if self.max_retries == 0 {
            return Err(ProfileError::invalid_retries(format!(
                "{} profile must allow at least one retry",
                self.provider
            )));
        }

        Ok(())
    }
}

impl Default for ProviderProfile {
    fn default() -> Self {
        Self::unknown()
    }
}
