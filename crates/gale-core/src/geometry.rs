//! Small fixed-size vector helpers.
//!
//! Node data crosses the solver boundary as parallel arrays of 3-vectors
//! and flattened 3×3 matrices; these aliases and helpers keep that
//! arithmetic allocation-free.

/// A Cartesian 3-vector.
pub type Vec3 = [f64; 3];

/// A 3×3 direction-cosine matrix, row-major, flattened to 9 values.
pub type Orientation = [f64; 9];

/// Component-wise `a - b`.
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Component-wise `a + b`.
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Component-wise negation.
pub fn neg(a: Vec3) -> Vec3 {
    [-a[0], -a[1], -a[2]]
}

/// Cross product `a × b`.
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean distance between two points.
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    let d = sub(a, b);
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

/// Row `row` (0, 1 or 2) of a row-major orientation matrix.
///
/// # Panics
///
/// Panics if `row > 2`.
pub fn orientation_row(m: &Orientation, row: usize) -> Vec3 {
    assert!(row < 3, "orientation row {row} out of range");
    [m[3 * row], m[3 * row + 1], m[3 * row + 2]]
}
