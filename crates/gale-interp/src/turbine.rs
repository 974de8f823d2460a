//! Whole-turbine force-node to sampling-node interpolation.

use std::ops::Range;

use gale_core::{NodeLayout, NodeType, Vec3};

use crate::error::InterpError;
use crate::segment::{interpolate_segment, radial_parameters};

/// Carry a 3-component field from every force node of a turbine to every
/// sampling node.
///
/// The hub (node 0) is copied directly. Each blade is interpolated along
/// its distance from the blade root, the tower along its distance from
/// the bottom tower node.
///
/// # Errors
///
/// Fails if any buffer length disagrees with its layout, if the layouts
/// disagree on the blade count, or if sampling nodes exist on a segment
/// without force nodes.
pub fn interpolate_turbine(
    force_layout: &NodeLayout,
    velocity_layout: &NodeLayout,
    force_positions: &[Vec3],
    sample_positions: &[Vec3],
    force_values: &[Vec3],
    out: &mut [Vec3],
) -> Result<(), InterpError> {
    check_len("force positions", force_layout.len(), force_positions.len())?;
    check_len("force values", force_layout.len(), force_values.len())?;
    check_len(
        "sampling positions",
        velocity_layout.len(),
        sample_positions.len(),
    )?;
    check_len("sampling output", velocity_layout.len(), out.len())?;
    if force_layout.num_blades() != velocity_layout.num_blades() {
        return Err(InterpError::BladeCountMismatch {
            force: force_layout.num_blades(),
            velocity: velocity_layout.num_blades(),
        });
    }

    out[0] = force_values[0];

    for segment in velocity_layout.segments() {
        let force_nodes = match segment.kind {
            NodeType::Blade(b) => force_layout.blade_nodes(b)?,
            _ => force_layout.tower_nodes(),
        };
        carry(
            segment.kind,
            force_nodes,
            segment.nodes,
            force_positions,
            sample_positions,
            force_values,
            out,
        )?;
    }
    Ok(())
}

fn carry(
    kind: NodeType,
    force_nodes: Range<usize>,
    sample_nodes: Range<usize>,
    force_positions: &[Vec3],
    sample_positions: &[Vec3],
    force_values: &[Vec3],
    out: &mut [Vec3],
) -> Result<(), InterpError> {
    let force_params = radial_parameters(&force_positions[force_nodes.clone()]);
    let sample_params = radial_parameters(&sample_positions[sample_nodes.clone()]);
    interpolate_segment(
        kind,
        &force_params,
        &force_values[force_nodes],
        &sample_params,
        &mut out[sample_nodes],
    )
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), InterpError> {
    if expected == actual {
        Ok(())
    } else {
        Err(InterpError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}
