//! Cache key derivation

use crate::config::TransformOptions;
use crate::error::Result;
use crate::transform::Transform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 128-bit MD5 fingerprint of a (configuration, file) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 16]);

impl CacheKey {
    pub fn from_digest(digest: md5::Digest) -> Self {
        Self(digest.0)
    }

    /// Lowercase hex rendering (32 chars)
    pub fn to_hex(&self) -> String {
        format!("{}", self)
    }

    /// Parse a 32 char hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 32 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for CacheKey {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CacheKey {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).ok_or_else(|| serde::de::Error::custom("invalid cache key"))
    }
}

/// Derives per-file cache keys for one filter instance.
///
/// Every key covers the transform identity (name and version), the
/// serialized per-file options and the exact file content, so a new
/// transform release or any option change produces new keys instead of
/// serving stale output.
#[derive(Debug, Clone)]
pub struct CacheKeyDeriver {
    options: TransformOptions,
    salt: String,
}

impl CacheKeyDeriver {
    /// Build a deriver, failing if the options cannot be serialized
    pub fn new(options: &TransformOptions, transform: &dyn Transform) -> Result<Self> {
        // Surface serialization problems once, up front
        options.to_canonical_json()?;

        Ok(Self {
            options: options.clone(),
            salt: transform_salt(transform),
        })
    }

    /// Key for `content` found at `relative_path`
    pub fn key_for(&self, relative_path: &str, content: &str) -> Result<CacheKey> {
        let options = self.options.for_file(relative_path).to_canonical_json()?;

        let mut context = md5::Context::new();
        context.consume(self.salt.as_bytes());
        context.consume(options.as_bytes());
        context.consume(content.as_bytes());
        Ok(CacheKey::from_digest(context.compute()))
    }
}

/// Identity of this crate plus the transform, one line
fn transform_salt(transform: &dyn Transform) -> String {
    format!(
        "{}@{};{}@{}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        transform.name(),
        transform.version()
    )
}

/// Run-level key identifying the filter implementation and its transform
pub fn filter_cache_key(transform: &dyn Transform) -> CacheKey {
    CacheKey::from_digest(md5::compute(transform_salt(transform)))
}
