//! Provider identification, optimization profiles, and detection.

mod detect;
mod error;
mod profile;
mod provider;
mod registry;

pub mod prelude;

pub use detect::{DetectedProvider, ProviderInfo, detect};
pub use error::{ProfileError, ProfileErrorKind};
pub use profile::{ChunkBuffering, CompressionMode, ProviderProfile};
pub use provider::ProviderId;
pub use registry::ProfileRegistry;
