//! Profile validation errors.
//!
//! ```rust
//! use wprovider::{ProfileError, ProfileErrorKind};
//!
//! let error = ProfileError::invalid_ping("ping interval must be non-zero");
//! assert_eq!(error.kind, ProfileErrorKind::InvalidPing);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileErrorKind {
    InvalidPing,
    InvalidMessageSize,
    InvalidBuffering,
    InvalidRetries,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileError {
    pub kind: ProfileErrorKind,
    pub message: String,
}

impl ProfileError {
    pub fn new(kind: ProfileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_ping(message: impl Into<String>) -> Self {
        Self::new(ProfileErrorKind::InvalidPing, message)
    }

    pub fn invalid_message_size(message: impl Into<String>) -> Self {
        Self::new(ProfileErrorKind::InvalidMessageSize, message)
    }

    pub fn invalid_buffering(message: impl Into<String>) -> Self {
        Self::new(ProfileErrorKind::InvalidBuffering, message)
    }

    pub fn invalid_retries(message: impl Into<String>) -> Self {
        Self::new(ProfileErrorKind::InvalidRetries, message)
    }
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProfileError {}
