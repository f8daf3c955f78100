//! Byte-level comparison of two encoded captures.
//!
//! The score is `(1 - mse / 255) * 100` over the raw encoded bytes. It is 100
//! for identical inputs and is not clamped: very different streams of equal
//! length go negative.

/// Similarity of `current` to `previous`.
///
/// Inputs of different length (including different screen sizes) score `0.0`,
/// as do two empty inputs.
pub fn score(current: &[u8], previous: &[u8]) -> f64 {
    if current.len() != previous.len() || current.is_empty() {
        return 0.0;
    }

    let sum_squared_diff: f64 = current
        .iter()
        .zip(previous)
        .map(|(&a, &b)| {
            let diff = i64::from(a) - i64::from(b);
            (diff * diff) as f64
        })
        .sum();

    let mse = sum_squared_diff / current.len() as f64;
    (1.0 - mse / 255.0) * 100.0
}

/// Additive checksum over the bytes read as signed 8-bit values.
///
/// Only an opaque tag; trivially collides. See `phash` for a fingerprint that
/// tracks visual content.
pub fn checksum(bytes: &[u8]) -> i64 {
    bytes.iter().map(|&b| i64::from(b as i8)).sum()
}
