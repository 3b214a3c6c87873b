//! Deterministic rounding used by interpretation band lookup.
//!
//! Integer-scale interpretation bands are matched against
//! `round_half_up(score)`, not the raw (possibly fractional, prorated)
//! score. Rust's `f64::round` already rounds half away from zero, which
//! coincides with "round half up" for the non-negative scores this engine
//! deals in; `round_half_up` exists as a named, tested entry point so the
//! policy is explicit and centralized rather than an incidental property of
//! whichever std method happened to be called at a given site.

/// Round `v` to the nearest integer, ties rounding up (away from zero for
/// positive values, which is the only case clinical scale scores occur in).
pub fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}
