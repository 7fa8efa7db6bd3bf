//! Axis conversion from the host's right-handed Z-up space to the
//! renderer's Y-up space.
//!
//! The basis change is fixed: `(x, y, z) -> (-x, z, y)`. Values are widened
//! to `f64` first so exact-match welding sees the same numbers the text
//! output is derived from.

use lightshade_core::{Vec2, Vec3};

/// Map a position
pub fn position(v: Vec3) -> [f64; 3] {
    let [x, y, z] = v.to_f64();
    [-x, z, y]
}

/// Map a normal; same basis change as positions
pub fn normal(v: Vec3) -> [f64; 3] {
    position(v)
}

/// Map XYZ Euler angles
pub fn rotation(r: Vec3) -> [f64; 3] {
    let [x, y, z] = r.to_f64();
    [-x, y, z]
}

/// Flip the V texture coordinate
pub fn uv(t: Vec2) -> [f64; 2] {
    let [u, v] = t.to_f64();
    [u, 1.0 - v]
}

/// Collision positions are swizzled to `[x, z, y]` without negating X
pub fn collision_position(v: Vec3) -> [f64; 3] {
    let [x, y, z] = v.to_f64();
    [x, z, y]
}
