//! Canonical hashing and seed derivation.
//!
//! Determinism policy:
//! - Scene documents hash via RFC 8785 (JCS) canonicalization + BLAKE3,
//!   so the same declarative scene always yields the same hash regardless
//!   of key order or formatting.
//! - Batch generation derives one independent seed per variation from the
//!   base seed with BLAKE3, so variations draw from unrelated streams.

use crate::error::SceneError;
use crate::scene::Scene;

/// Computes the canonical BLAKE3 hash of a scene document.
///
/// ```text
/// scene_hash = hex(BLAKE3(JCS(scene_json)))
/// ```
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
pub fn canonical_scene_hash(scene: &Scene) -> Result<String, SceneError> {
    let value = scene.to_value()?;
    Ok(canonical_value_hash(&value))
}

/// Computes the canonical BLAKE3 hash of a JSON value.
pub fn canonical_value_hash(value: &serde_json::Value) -> String {
    let canonical = canonicalize_json(value);
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

/// Canonicalizes a JSON value per RFC 8785 (JCS): keys sorted, no
/// whitespace, minimal escaping, deterministic number formatting.
pub fn canonicalize_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        serde_json::Value::Number(n) => write_number(n, out),
        serde_json::Value::String(s) => write_string(s, out),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
    }
}

fn write_number(n: &serde_json::Number, out: &mut String) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
        return;
    }
    if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
        return;
    }
    match n.as_f64() {
        // JCS treats non-finite numbers as null.
        Some(f) if !f.is_finite() => out.push_str("null"),
        Some(f) if f == 0.0 => out.push('0'),
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            out.push_str(&(f as i64).to_string());
        }
        Some(f) => {
            let s = f.to_string();
            if s.contains('.') && !s.contains('e') && !s.contains('E') {
                out.push_str(s.trim_end_matches('0').trim_end_matches('.'));
            } else {
                out.push_str(&s);
            }
        }
        None => out.push_str("null"),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Derives a seed for a numbered variation from the base seed.
///
/// ```text
/// variation_seed = truncate_u32(BLAKE3(base_seed || index))
/// ```
///
/// Used by batch generation so each variation's sampling stream is
/// independent of the others and of the base stream.
pub fn derive_variation_seed(base_seed: u32, index: u32) -> u32 {
    let mut input = Vec::with_capacity(8);
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(&index.to_le_bytes());

    let hash = blake3::hash(&input);
    let bytes: [u8; 4] = hash.as_bytes()[0..4].try_into().expect("hash is 32 bytes");
    u32::from_le_bytes(bytes)
}

/// Derives a seed for a named variation from the base seed.
pub fn derive_variation_seed_str(base_seed: u32, key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    let hash = blake3::hash(&input);
    let bytes: [u8; 4] = hash.as_bytes()[0..4].try_into().expect("hash is 32 bytes");
    u32::from_le_bytes(bytes)
}
