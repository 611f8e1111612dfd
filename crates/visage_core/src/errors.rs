//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`VisageError`] only covers the genuinely fallible
//! surfaces of the engine:
//! - Avatar profile loading and validation
//! - Parsing of external signal messages
//!
//! Missing rig roles and missing morph channels are *not* errors. They are
//! expressed as `Option`s and absent map entries and resolved by the fallback
//! tiers, so the per-frame path never returns a `Result`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use visage_core::errors::{VisageError, Result};
//!
//! fn load_profile(text: &str) -> Result<AvatarProfile> {
//!     let profile: AvatarProfile = serde_json::from_str(text)?;
//!     profile.validate()?;
//!     Ok(profile)
//! }
//! ```

use thiserror::Error;

/// The main error type for the Visage engine.
#[derive(Error, Debug)]
pub enum VisageError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The profile document is not valid JSON or does not match the schema.
    #[error("Profile parse error: {0}")]
    ProfileParse(#[from] serde_json::Error),

    /// A profile value is outside of its accepted range.
    #[error("Invalid profile value: {field} - {message}")]
    InvalidProfile {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    // ========================================================================
    // Signal Errors
    // ========================================================================
    /// An external signal message could not be decoded.
    #[error("Malformed signal: {message}")]
    MalformedSignal {
        /// Decoder message
        message: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl VisageError {
    /// Shorthand for [`VisageError::InvalidProfile`].
    pub fn invalid_profile(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProfile {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Alias for `Result<T, VisageError>`.
pub type Result<T> = std::result::Result<T, VisageError>;
