//! Derived memoization keys.

use conduit_core::Argument;
use sha2::{Digest, Sha256};

/// Method name used for constructor keys.
pub const CONSTRUCTOR: &str = "__construct";

/// Cache key of a service id.
pub fn service_key(id: &str) -> String {
    format!("service.{}", digest(id.as_bytes()))
}

/// Cache key of a `(class, method, arguments)` build.
///
/// Arguments are keyed by their serialized form, so `Literal(1)` and
/// `Literal("1")` stay distinct.
pub fn build_key(class: &str, method: &str, arguments: &[Argument]) -> String {
    let encoded = serde_json::to_string(arguments).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(class.as_bytes());
    hasher.update(b"::");
    hasher.update(method.as_bytes());
    hasher.update(b"|");
    hasher.update(encoded.as_bytes());
    format!("build.{}", hex::encode(hasher.finalize()))
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
