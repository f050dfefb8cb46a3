//! Typed errors for the filesystem core.
//!
//! Policy:
//! - The core recovers locally from a split-advised commit (compact, then
//!   split) and from a single-half metadata read failure (prefer the mate).
//! - Everything else surfaces to the caller unchanged; device I/O is wrapped
//!   without transformation and never retried here.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    /// A path component does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path names a value where a dictionary was required.
    #[error("dictionary expected: {0}")]
    DictionaryExpected(String),

    /// The path names a dictionary where a value was required.
    #[error("value expected: {0}")]
    ValueExpected(String),

    /// Allocator exhausted, or a metadata split could not be completed.
    #[error("no space left on device")]
    NoSpace,

    /// Metadata cannot be parsed (both halves of a pair are unusable).
    /// Fatal for the affected subtree.
    #[error("corrupt metadata: {0}")]
    Corrupt(String),

    #[error("name too long: {0:?} ({1} > max {2})")]
    NameTooLong(String, usize, u32),

    #[error("file too large: {0} bytes (max {1})")]
    FileTooLarge(usize, u32),

    /// Invalid geometry or configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Surfaced from the block device, untransformed.
    #[error("device error: {0}")]
    Device(#[from] io::Error),
}

pub type Result<T, E = FsError> = std::result::Result<T, E>;
