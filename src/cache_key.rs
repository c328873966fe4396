use serde_json::Value;

use crate::params::{ParamValue, Params};

/// A result-cache key.
///
/// Production uses the 32-bit FNV-1a hash of the inputs; development
/// uses a NUL-delimited readable string so cache contents can be
/// inspected. A 32-bit collision costs one wrong cached string, a
/// trade-off accepted for key inputs this short and well distributed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Hash(u32),
    Readable(String),
}

const FNV_OFFSET: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(hash: u32, bytes: &[u8]) -> u32 {
    let mut hash = hash;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn hashed(locale: &str, key: &str, namespace: &str, signature: &str) -> CacheKey {
    let mut hash = FNV_OFFSET;
    for part in [locale, namespace, key, signature] {
        hash = fnv1a(hash, part.as_bytes());
        hash = fnv1a(hash, &[0]);
    }
    CacheKey::Hash(hash)
}

fn readable(locale: &str, key: &str, namespace: &str, signature: &str) -> CacheKey {
    CacheKey::Readable(format!(
        "{}\u{0}{}\u{0}{}\u{0}{}",
        locale, namespace, key, signature
    ))
}

/// Builds a stable signature of the interpolation parameters: JSON of
/// the primitive values in sorted key order. Returns `None` when any
/// value is non-primitive (or a non-finite float), which makes the call
/// bypass caching entirely.
fn params_signature(params: &Params) -> Option<String> {
    if params.is_empty() {
        return Some(String::new());
    }
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    let mut object = serde_json::Map::new();
    for key in keys {
        let value = match &params[key] {
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::Int(n) => Value::from(*n),
            ParamValue::Float(n) => Value::Number(serde_json::Number::from_f64(*n)?),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Map(_) => return None,
        };
        object.insert(key.clone(), value);
    }
    Some(Value::Object(object).to_string())
}

/// Strategy-selected cache key construction.
///
/// The strategy is picked once at engine construction from the dev-mode
/// flag; per-call code goes through a plain function pointer and never
/// branches on the mode.
pub struct CacheKeyGenerator {
    make: fn(&str, &str, &str, &str) -> CacheKey,
}

impl CacheKeyGenerator {
    pub fn new(dev_mode: bool) -> Self {
        CacheKeyGenerator {
            make: if dev_mode { readable } else { hashed },
        }
    }

    /// Generate the cache key for one lookup, or `None` when the params
    /// are not representable and the call must bypass the cache.
    pub fn generate(
        &self,
        locale: &str,
        key: &str,
        namespace: Option<&str>,
        params: &Params,
    ) -> Option<CacheKey> {
        let signature = params_signature(params)?;
        Some((self.make)(locale, key, namespace.unwrap_or(""), &signature))
    }
}
