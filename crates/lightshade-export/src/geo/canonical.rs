//! Numeric canonicalization for `.geo` output
//!
//! Every float written to a document goes through here. Values within
//! [`ZERO_EPSILON`] of zero become exactly zero, and everything else is
//! truncated toward zero to [`DIGITS`] fractional digits.
//!
//! Three text forms exist:
//! - scalar fields (node position, rotation, scale) always carry a decimal
//!   point: `1.0`, `-0.5`, `1.23456`
//! - bulk arrays (vertices, UVs, normals, colors) collapse near-integers to
//!   integer text: `1`, `0`, `0.70710`
//! - collision positions keep the first [`COLLISION_WIDTH`] characters of the
//!   zero-snapped value's shortest decimal text

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

/// Magnitude below which a value snaps to zero
pub const ZERO_EPSILON: f64 = 1e-4;

/// Fractional digits kept by truncation
pub const DIGITS: i32 = 5;

/// Characters kept per collision coordinate
pub const COLLISION_WIDTH: usize = 7;

const SCALE: f64 = 100_000.0;

/// Snap values in `(-1e-4, 1e-4)` to `0.0`. Non-finite values also map to
/// `0.0` since JSON cannot carry them.
pub fn snap_zero(value: f64) -> f64 {
    if !value.is_finite() || (-ZERO_EPSILON < value && value < ZERO_EPSILON) {
        0.0
    } else {
        value
    }
}

/// Zero-snap, then truncate toward zero to five fractional digits.
///
/// `value * 10^5` can land a few ulps below an integer for values that
/// already have five digits (`0.00013 * 1e5 == 12.999999999999998`); those
/// are taken as the integer so the function is idempotent.
pub fn canonicalize(value: f64) -> f64 {
    let value = snap_zero(value);
    if value == 0.0 {
        return 0.0;
    }
    let scaled = value * SCALE;
    let nearest = scaled.round();
    let steps = if (scaled - nearest).abs() <= nearest.abs().max(1.0) * 4.0 * f64::EPSILON {
        nearest
    } else {
        scaled.trunc()
    };
    // -0.0 would print as "-0"
    (steps / SCALE) + 0.0
}

/// Text for a scalar field: canonical value, always with a decimal point
pub fn format_scalar(value: f64) -> String {
    with_decimal_point(canonicalize(value))
}

/// Text for one element of a bulk array. The integer test runs on the
/// zero-snapped input, before truncation.
pub fn format_array_value(value: f64) -> String {
    let value = snap_zero(value);
    let rounded = value.round();
    if (rounded - value).abs() < ZERO_EPSILON {
        // round() keeps the sign of -0.4 as -0.0
        format!("{}", rounded + 0.0)
    } else {
        format!("{}", canonicalize(value))
    }
}

/// Text for one collision coordinate
pub fn format_collision_value(value: f64) -> String {
    let mut text = with_decimal_point(snap_zero(value));
    text.truncate(COLLISION_WIDTH);
    if text.ends_with('.') {
        text.pop();
    }
    text
}

fn with_decimal_point(value: f64) -> String {
    let text = format!("{}", value + 0.0);
    if text.contains('.') {
        text
    } else {
        text + ".0"
    }
}

fn join<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
    let parts: Vec<String> = items.iter().map(f).collect();
    format!("[{}]", parts.join(","))
}

fn emit_raw<S: Serializer>(text: String, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = RawValue::from_string(text).map_err(S::Error::custom)?;
    raw.serialize(serializer)
}

// ==================== JSON fragments ====================
//
// Each wrapper serializes to a single-line JSON fragment holding the
// canonical text. Only meaningful with serde_json serializers.

/// `1.0` style scalar
#[derive(Debug, Clone, Copy)]
pub struct Scalar(pub f64);

/// `[x,y,z]` of scalar-form values
#[derive(Debug, Clone, Copy)]
pub struct Scalars<'a>(pub &'a [f64]);

/// `[0,1,0.5,...]` bulk array
#[derive(Debug, Clone, Copy)]
pub struct Array<'a>(pub &'a [f64]);

/// `[0,1,2,...]` index list
#[derive(Debug, Clone, Copy)]
pub struct Indices<'a>(pub &'a [u32]);

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        emit_raw(format_scalar(self.0), serializer)
    }
}

impl Serialize for Scalars<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        emit_raw(join(self.0, |v| format_scalar(*v)), serializer)
    }
}

impl Serialize for Array<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        emit_raw(join(self.0, |v| format_array_value(*v)), serializer)
    }
}

impl Serialize for Indices<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        emit_raw(join(self.0, |v| v.to_string()), serializer)
    }
}

/// `[[x,y,z],...]` collision positions, for `#[serde(serialize_with)]`
pub fn serialize_positions<S: Serializer>(
    values: &[[f64; 3]],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let text = join(values, |p| join(p, |v| format_collision_value(*v)));
    emit_raw(text, serializer)
}
