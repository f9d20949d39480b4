//! Target-region alignment check.
//!
//! A candidate rectangle matches the target when each of its four scalar
//! attributes deviates from the target's by at most `tolerance`, measured
//! relative to the target attribute. The target is always the denominator,
//! so a transiently zero-sized detection never divides by zero.

use crate::types::Rect;
use thiserror::Error;

/// Maximum relative deviation per attribute for a face to count as aligned.
pub const DEFAULT_TOLERANCE: f32 = 0.1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid target region: width={width}, height={height} (both must be finite and > 0)")]
    InvalidTarget { width: f32, height: f32 },
}

/// Check that `target` can be used as a match target.
pub fn validate_target(target: &Rect) -> Result<(), GeometryError> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if valid(target.width) && valid(target.height) {
        Ok(())
    } else {
        Err(GeometryError::InvalidTarget {
            width: target.width,
            height: target.height,
        })
    }
}

/// Deviation of one attribute from its target value.
///
/// Relative to the target value; falls back to the absolute difference when
/// the target value is exactly zero (a target flush with the frame origin).
fn deviation(candidate: f32, target: f32) -> f32 {
    let diff = (candidate - target).abs();
    if target == 0.0 {
        diff
    } else {
        diff / target.abs()
    }
}

/// Per-attribute deviations in x, y, width, height order.
pub fn relative_deviations(candidate: &Rect, target: &Rect) -> [f32; 4] {
    let c = candidate.attributes();
    let t = target.attributes();
    [
        deviation(c[0], t[0]),
        deviation(c[1], t[1]),
        deviation(c[2], t[2]),
        deviation(c[3], t[3]),
    ]
}

/// Whether `candidate` is aligned with `target` within `tolerance`.
///
/// Fails with [`GeometryError::InvalidTarget`] if the target has a
/// non-positive or non-finite size. A candidate with any non-finite
/// attribute never matches.
pub fn matches(candidate: &Rect, target: &Rect, tolerance: f32) -> Result<bool, GeometryError> {
    validate_target(target)?;

    let deviations = relative_deviations(candidate, target);
    tracing::trace!(?deviations, tolerance, "alignment deviations");

    // NaN compares false, so non-finite candidates fall through to `false`.
    Ok(deviations.iter().all(|&d| d <= tolerance))
}
