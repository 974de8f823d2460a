//! Interpolation along a single blade or tower segment.

use gale_core::geometry::distance;
use gale_core::{NodeType, Vec3};

use crate::bracket::BracketSearch;
use crate::error::InterpError;

/// Distance of every point from the first point of the slice.
///
/// The first node of a blade is its root and the first tower node is its
/// bottom, so this is the 1-D interpolation parameter along the segment.
pub fn radial_parameters(points: &[Vec3]) -> Vec<f64> {
    match points.first() {
        None => Vec::new(),
        Some(&origin) => points.iter().map(|&p| distance(p, origin)).collect(),
    }
}

/// Interpolate `N`-component values from force nodes to sampling nodes of
/// one segment.
///
/// Each sampling node's bracket is located once and reused for all `N`
/// components. A segment with a single force node broadcasts that node's
/// value.
///
/// # Errors
///
/// [`InterpError::LengthMismatch`] if `force_values` does not match
/// `force_params` or `out` does not match `sample_params`;
/// [`InterpError::EmptySegment`] if sampling nodes exist but force nodes
/// do not.
pub fn interpolate_segment<const N: usize>(
    segment: NodeType,
    force_params: &[f64],
    force_values: &[[f64; N]],
    sample_params: &[f64],
    out: &mut [[f64; N]],
) -> Result<(), InterpError> {
    if force_values.len() != force_params.len() {
        return Err(InterpError::LengthMismatch {
            what: "force values",
            expected: force_params.len(),
            actual: force_values.len(),
        });
    }
    if out.len() != sample_params.len() {
        return Err(InterpError::LengthMismatch {
            what: "sampling output",
            expected: sample_params.len(),
            actual: out.len(),
        });
    }
    if sample_params.is_empty() {
        return Ok(());
    }
    if force_values.is_empty() {
        return Err(InterpError::EmptySegment {
            segment,
            samples: sample_params.len(),
        });
    }
    match BracketSearch::new(force_params) {
        None => out.fill(force_values[0]),
        Some(mut search) => {
            for (slot, &x) in out.iter_mut().zip(sample_params) {
                *slot = search.locate(x).apply(force_values);
            }
        }
    }
    Ok(())
}
