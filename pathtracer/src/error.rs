//! Error types for the library boundary.
//!
//! Traversal and intersection code never fails — a miss is a value, not an
//! error — so this enum only needs to cover the boundaries named in the
//! design: scene construction, output I/O, and configuration validation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load scene: {reason}")]
    SceneLoad { reason: String },

    #[error("I/O failure writing output")]
    IoFailure(#[from] std::io::Error),

    #[error("invalid configuration: {reason}")]
    BadConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
