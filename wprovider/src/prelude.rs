//! Common `wprovider` imports for downstream crates.

pub use crate::{
    ChunkBuffering, CompressionMode, DetectedProvider, ProfileError, ProfileErrorKind,
    ProfileRegistry, ProviderId, ProviderInfo, ProviderProfile, detect,
};
