//! Centralized configuration and builder for flintfs.
//!
//! Goals:
//! - Single place to collect geometry and tunables instead of scattering
//!   env lookups.
//! - FsConfig::from_env() reads the same FFS_* variables the CLI documents.
//! - Fluent setters so tests and the CLI can override specific fields.
//!
//! Geometry rules:
//! - program_block_size must divide block_size (commits are padded to
//!   program-block boundaries, which are the atomic program units).
//! - block_size must be at least 128 bytes; the inline threshold defaults to
//!   block_size / 4 and is capped by the 10-bit tag length limit.

use std::fmt;

use crate::consts::{
    DEFAULT_ATTR_MAX, DEFAULT_FILE_MAX, DEFAULT_NAME_MAX, DEFAULT_PROG_BLOCK_SIZE, TAG_LEN_MAX,
};
use crate::errors::{FsError, Result};

/// Top-level configuration for a filesystem handle.
#[derive(Clone, Debug)]
pub struct FsConfig {
    /// Physical block (erase unit) size in bytes.
    /// Env: FFS_BLOCK_SIZE (default 512)
    pub block_size: u32,

    /// Number of blocks on the device. Adopted from the device/superblock at
    /// format/mount time; 0 means "take it from the device".
    pub block_count: u32,

    /// Smallest atomically programmable unit; commits are padded to it.
    /// Env: FFS_PROG_BLOCK_SIZE (default 32)
    pub prog_block_size: u32,

    /// Maximum name length stored in the superblock and enforced on writes.
    /// Env: FFS_NAME_MAX (default 255)
    pub name_length_max: u32,

    /// Maximum file size stored in the superblock and enforced on writes.
    /// Env: FFS_FILE_MAX (default 0x7fffffff)
    pub file_size_max: u32,

    /// Maximum user-attribute size (superblock field; reserved).
    pub file_attr_size_max: u32,

    /// Optional explicit inline threshold in bytes; if None, defaults to
    /// block_size / 4 (capped by the tag length limit).
    /// Env: FFS_INLINE_THRESHOLD (default None, meaning "use bs/4")
    pub inline_threshold: Option<usize>,

    /// Whether name/file-size limits are enforced on set/mkdir.
    /// Env: FFS_ENFORCE_LIMITS (default true; "0|false|off|no" => false)
    pub enforce_limits: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            block_count: 0,
            prog_block_size: DEFAULT_PROG_BLOCK_SIZE,
            name_length_max: DEFAULT_NAME_MAX,
            file_size_max: DEFAULT_FILE_MAX,
            file_attr_size_max: DEFAULT_ATTR_MAX,
            inline_threshold: None,
            enforce_limits: true,
        }
    }
}

impl FsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FFS_BLOCK_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.block_size = n;
            }
        }
        if let Ok(v) = std::env::var("FFS_PROG_BLOCK_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.prog_block_size = n;
            }
        }
        if let Ok(v) = std::env::var("FFS_NAME_MAX") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.name_length_max = n;
            }
        }
        if let Ok(v) = std::env::var("FFS_FILE_MAX") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.file_size_max = n;
            }
        }
        if let Ok(v) = std::env::var("FFS_INLINE_THRESHOLD") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.inline_threshold = Some(n);
            }
        }
        if let Ok(v) = std::env::var("FFS_ENFORCE_LIMITS") {
            let s = v.trim().to_ascii_lowercase();
            cfg.enforce_limits = !(s == "0" || s == "false" || s == "off" || s == "no");
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_block_size(mut self, bs: u32) -> Self {
        self.block_size = bs;
        self
    }

    pub fn with_prog_block_size(mut self, ps: u32) -> Self {
        self.prog_block_size = ps;
        self
    }

    pub fn with_name_length_max(mut self, n: u32) -> Self {
        self.name_length_max = n;
        self
    }

    pub fn with_file_size_max(mut self, n: u32) -> Self {
        self.file_size_max = n;
        self
    }

    pub fn with_inline_threshold(mut self, thr: Option<usize>) -> Self {
        self.inline_threshold = thr;
        self
    }

    pub fn with_enforce_limits(mut self, on: bool) -> Self {
        self.enforce_limits = on;
        self
    }

    /// Effective inline-vs-CTZ threshold in bytes.
    pub fn inline_threshold(&self) -> usize {
        self.inline_threshold
            .unwrap_or(self.block_size as usize / 4)
            .min(TAG_LEN_MAX)
    }

    /// Validate geometry. Called on format and on mount.
    pub fn validate(&self) -> Result<()> {
        if self.block_size < 128 {
            return Err(FsError::Config(format!(
                "block_size must be >= 128, got {}",
                self.block_size
            )));
        }
        if self.prog_block_size < 4 {
            return Err(FsError::Config(format!(
                "prog_block_size must be >= 4, got {}",
                self.prog_block_size
            )));
        }
        if self.block_size % self.prog_block_size != 0 {
            return Err(FsError::Config(format!(
                "prog_block_size {} must divide block_size {}",
                self.prog_block_size, self.block_size
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FsConfig {{ block_size: {}, block_count: {}, prog_block_size: {}, \
             name_length_max: {}, file_size_max: {}, inline_threshold: {}, \
             enforce_limits: {} }}",
            self.block_size,
            self.block_count,
            self.prog_block_size,
            self.name_length_max,
            self.file_size_max,
            self.inline_threshold
                .map(|v| v.to_string())
                .unwrap_or_else(|| "default(bs/4)".to_string()),
            self.enforce_limits,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_validation() {
        assert!(FsConfig::default().validate().is_ok());
        assert!(FsConfig::default().with_block_size(100).validate().is_err());
        assert!(FsConfig::default()
            .with_block_size(512)
            .with_prog_block_size(48)
            .validate()
            .is_err());
    }

    #[test]
    fn inline_threshold_defaults_and_cap() {
        let cfg = FsConfig::default().with_block_size(512);
        assert_eq!(cfg.inline_threshold(), 128);

        // Порог никогда не превышает 10-битный максимум длины тега.
        let cfg = FsConfig::default().with_block_size(8192);
        assert_eq!(cfg.inline_threshold(), TAG_LEN_MAX);

        let cfg = cfg.with_inline_threshold(Some(64));
        assert_eq!(cfg.inline_threshold(), 64);
    }
}
