//! Hub/blade/tower node layout.
//!
//! Both node sets of a turbine (force nodes and velocity sampling nodes)
//! share one ordering convention:
//!
//! ```text
//! [hub] [blade 0: root..tip] [blade 1: root..tip] ... [tower: bottom..top]
//! ```
//!
//! Every blade carries the same number of nodes. Node type is derived
//! purely from a node's position in this ordering, independent of which
//! process owns the turbine.

use std::ops::Range;

use smallvec::SmallVec;

use crate::error::LayoutError;

/// Classification of a node within a [`NodeLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// The single hub node (index 0).
    Hub,
    /// A node on the blade with the given 0-based index.
    Blade(usize),
    /// A tower node.
    Tower,
}

/// A contiguous run of nodes along one blade or the tower.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// `NodeType::Blade(b)` or `NodeType::Tower`.
    pub kind: NodeType,
    /// Node indices covered, root (or tower bottom) first.
    pub nodes: Range<usize>,
}

/// Node counts of one node set of one turbine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeLayout {
    num_blades: usize,
    per_blade: usize,
    tower: usize,
}

impl NodeLayout {
    /// Layout with `num_blades` blades of `per_blade` nodes each and
    /// `tower` tower nodes, plus the hub.
    pub fn new(num_blades: usize, per_blade: usize, tower: usize) -> Self {
        Self {
            num_blades,
            per_blade,
            tower,
        }
    }

    /// Total node count including the hub.
    pub fn len(&self) -> usize {
        1 + self.num_blades * self.per_blade + self.tower
    }

    /// Always `false`: every layout has a hub node.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of blades.
    pub fn num_blades(&self) -> usize {
        self.num_blades
    }

    /// Nodes per blade.
    pub fn per_blade(&self) -> usize {
        self.per_blade
    }

    /// Tower node count.
    pub fn tower(&self) -> usize {
        self.tower
    }

    /// Node indices of blade `blade`.
    pub fn blade_nodes(&self, blade: usize) -> Result<Range<usize>, LayoutError> {
        if blade >= self.num_blades {
            return Err(LayoutError::BladeOutOfRange {
                blade,
                num_blades: self.num_blades,
            });
        }
        let start = 1 + blade * self.per_blade;
        Ok(start..start + self.per_blade)
    }

    /// Node indices of the tower (empty when the tower is not modelled).
    pub fn tower_nodes(&self) -> Range<usize> {
        let start = 1 + self.num_blades * self.per_blade;
        start..start + self.tower
    }

    /// All blade segments in order, followed by the tower if present.
    pub fn segments(&self) -> SmallVec<[Segment; 4]> {
        let mut out: SmallVec<[Segment; 4]> = (0..self.num_blades)
            .map(|b| {
                let start = 1 + b * self.per_blade;
                Segment {
                    kind: NodeType::Blade(b),
                    nodes: start..start + self.per_blade,
                }
            })
            .collect();
        if self.tower > 0 {
            out.push(Segment {
                kind: NodeType::Tower,
                nodes: self.tower_nodes(),
            });
        }
        out
    }

    /// Classify `node` by its position in the ordering.
    pub fn node_type(&self, node: usize) -> Result<NodeType, LayoutError> {
        if node >= self.len() {
            return Err(LayoutError::NodeOutOfRange {
                node,
                len: self.len(),
            });
        }
        if node == 0 {
            return Ok(NodeType::Hub);
        }
        let blade_end = 1 + self.num_blades * self.per_blade;
        if node < blade_end {
            Ok(NodeType::Blade((node - 1) / self.per_blade))
        } else {
            Ok(NodeType::Tower)
        }
    }
}

/// Node counts of both node sets of a turbine, as reported by its solver
/// at initialisation or restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeCounts {
    /// Number of blades.
    pub num_blades: usize,
    /// Force nodes per blade.
    pub force_pts_blade: usize,
    /// Force nodes on the tower.
    pub force_pts_tower: usize,
    /// Velocity sampling nodes per blade.
    pub vel_pts_blade: usize,
    /// Velocity sampling nodes on the tower.
    pub vel_pts_tower: usize,
}

impl NodeCounts {
    /// Layout of the force node set.
    pub fn force_layout(&self) -> NodeLayout {
        NodeLayout::new(self.num_blades, self.force_pts_blade, self.force_pts_tower)
    }

    /// Layout of the velocity sampling node set.
    pub fn velocity_layout(&self) -> NodeLayout {
        NodeLayout::new(self.num_blades, self.vel_pts_blade, self.vel_pts_tower)
    }
}
