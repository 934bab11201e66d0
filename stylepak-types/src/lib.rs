//! Core type definitions for stylepak.
//!
//! This crate defines the fundamental, package-agnostic types used throughout
//! the engine:
//! - [`ObjectId`], the case-insensitive identifier for packages and objects
//! - [`Keyvalues`], the already-parsed tree form of every package file
//!
//! All object kinds (styles, items, voice packs, etc.) belong in
//! `stylepak-packages`, not here.

mod ids;
mod keyvalues;

pub use ids::ObjectId;
pub use keyvalues::{Keyvalues, KvValue, parse_bool, sep_values};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("object IDs may not be blank")]
    EmptyId,

    #[error("invalid value {value:?} for \"{key}\", expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}
