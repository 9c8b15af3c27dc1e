//! Bounding Volume Hierarchy
//!
//! Nodes for every model live in one shared [Arena]; each build appends a
//! subtree and hands back the index of its root. Triangles are never copied
//! into the tree: building permutes the triangle range in place so every leaf
//! refers to a contiguous `start..end` slice of the scene's triangle array.

use std::ops::Range;

use log::debug;

use crate::{
    bounds::BoundingBox,
    geometry::Triangle,
    utils::arena::{Arena, ArenaIndex},
};

/// Index of a [BvhNode] in the shared node arena.
pub type NodeIndex = ArenaIndex;

/// Axes thinner than this are widened by the same amount on both sides.
pub const MIN_EXTENT: f32 = 0.01;

/// Recursion limit used when the caller does not pick one.
pub const DEFAULT_DEPTH_BUDGET: u32 = 100;

/// What a node refers to: either a run of triangles or two child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Triangles `start..end` of the scene's triangle array; never empty.
    Leaf { start: usize, end: usize },
    /// Two children, both appended after this node.
    Interior { left: NodeIndex, right: NodeIndex },
}

/// A node in the BVH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    /// AABB of every triangle below this node, widened by [MIN_EXTENT] on thin axes
    pub bounds: BoundingBox,
    pub kind: NodeKind,
}

impl BvhNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Returns the triangle range of a leaf, `None` for interior nodes.
    pub fn triangles(&self) -> Option<Range<usize>> {
        match self.kind {
            NodeKind::Leaf { start, end } => Some(start..end),
            NodeKind::Interior { .. } => None,
        }
    }
}

/// Recursive object-median builder over a shared node arena.
#[derive(Debug)]
pub struct BvhBuilder<'a> {
    triangles: &'a mut [Triangle],
    nodes: &'a mut Arena<BvhNode>,
}

impl<'a> BvhBuilder<'a> {
    pub fn new(triangles: &'a mut [Triangle], nodes: &'a mut Arena<BvhNode>) -> Self {
        Self { triangles, nodes }
    }

    /// Builds a subtree over `range`, returning the index of its root node.
    ///
    /// `depth_budget` bounds the recursion; once exhausted, the remaining
    /// range becomes a single leaf regardless of its size.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds for the triangle slice.
    /// `range` must not be empty.
    pub fn build(&mut self, range: Range<usize>, depth_budget: u32) -> NodeIndex {
        debug_assert!(!range.is_empty(), "Given empty triangle range!");
        let first_node = self.nodes.len();
        let root = self.build_range(range.start, range.end, depth_budget);
        debug!(
            "built {} BVH nodes over triangles {range:?}",
            self.nodes.len() - first_node
        );
        root
    }

    fn range_bounds(&self, start: usize, end: usize) -> BoundingBox {
        self.triangles[start..end]
            .iter()
            .fold(BoundingBox::empty(), |bbox, tri| bbox.union(tri.bounds()))
            .inflate(MIN_EXTENT)
    }

    fn new_leaf(&mut self, bounds: BoundingBox, start: usize, end: usize) -> NodeIndex {
        self.nodes.add(BvhNode {
            bounds,
            kind: NodeKind::Leaf { start, end },
        })
    }

    fn build_range(&mut self, start: usize, end: usize, depth_budget: u32) -> NodeIndex {
        let bounds = self.range_bounds(start, end);
        let count = end - start;

        if depth_budget == 0 || count < 2 {
            return self.new_leaf(bounds, start, end);
        }

        // children are patched in once both halves are built
        let idx = self.nodes.add(BvhNode {
            bounds,
            kind: NodeKind::Interior { left: 0, right: 0 },
        });

        let axis = bounds.longest_axis();
        self.triangles[start..end]
            .sort_by(|a, b| a.centroid()[axis].total_cmp(&b.centroid()[axis]));

        let mid = start + count / 2;
        let left = self.build_range(start, mid, depth_budget - 1);
        let right = self.build_range(mid, end, depth_budget - 1);
        self.nodes[idx].kind = NodeKind::Interior { left, right };

        idx
    }
}

/// Depth-first walk over the subtree rooted at `root`, yielding `(index, depth)` pairs.
pub fn walk(nodes: &[BvhNode], root: NodeIndex) -> impl Iterator<Item = (NodeIndex, usize)> + '_ {
    let mut stack = vec![(root, 0)];
    std::iter::from_fn(move || {
        let (idx, depth) = stack.pop()?;
        if let NodeKind::Interior { left, right } = nodes[idx].kind {
            stack.push((right, depth + 1));
            stack.push((left, depth + 1));
        }
        Some((idx, depth))
    })
}

/// Returns the triangle ranges of every leaf below `root`, left to right.
pub fn leaf_ranges(nodes: &[BvhNode], root: NodeIndex) -> Vec<Range<usize>> {
    walk(nodes, root)
        .filter_map(|(idx, _)| nodes[idx].triangles())
        .collect()
}

/// Returns the number of edges on the longest root-to-leaf path.
pub fn depth(nodes: &[BvhNode], root: NodeIndex) -> usize {
    walk(nodes, root).map(|(_, depth)| depth).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3A};

    use super::*;

    fn tri(p0: Vec3A, p1: Vec3A, p2: Vec3A) -> Triangle {
        Triangle {
            positions: [p0, p1, p2],
            normals: [Vec3A::Z; 3],
            uvs: [Vec2::ZERO; 3],
            material: 0,
        }
    }

    /// A row of small triangles along the x axis
    fn strip(count: usize) -> Vec<Triangle> {
        (0..count)
            .map(|i| {
                let x = i as f32;
                tri(
                    Vec3A::new(x, 0.0, 0.0),
                    Vec3A::new(x + 0.5, 1.0, 0.0),
                    Vec3A::new(x + 1.0, 0.0, 0.5),
                )
            })
            .collect()
    }

    fn build(triangles: &mut [Triangle], depth_budget: u32) -> (Arena<BvhNode>, NodeIndex) {
        let mut nodes = Arena::new();
        let len = triangles.len();
        let root = BvhBuilder::new(triangles, &mut nodes).build(0..len, depth_budget);
        (nodes, root)
    }

    #[test]
    fn single_triangle_is_one_leaf() {
        for budget in [0, 1, DEFAULT_DEPTH_BUDGET] {
            let mut triangles = strip(1);
            let (nodes, root) = build(&mut triangles, budget);
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[root].kind, NodeKind::Leaf { start: 0, end: 1 });
        }
    }

    #[test]
    fn zero_budget_makes_single_leaf() {
        let mut triangles = strip(16);
        let (nodes, root) = build(&mut triangles, 0);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[root].triangles(), Some(0..16));
    }

    #[test]
    fn leaves_partition_the_range() {
        let mut triangles = strip(37);
        let (nodes, root) = build(&mut triangles, DEFAULT_DEPTH_BUDGET);

        let mut next = 0;
        for range in leaf_ranges(nodes.as_slice(), root) {
            assert!(!range.is_empty(), "found empty leaf {range:?}");
            assert_eq!(range.start, next, "gap or overlap before leaf {range:?}");
            next = range.end;
        }
        assert_eq!(next, 37);
        assert!(nodes.len() <= 2 * 37 - 1);
        assert_eq!(depth(nodes.as_slice(), root), 6);
    }

    #[test]
    fn median_split_sorts_along_longest_axis() {
        let mut triangles = strip(8);
        triangles.reverse();
        let (nodes, root) = build(&mut triangles, DEFAULT_DEPTH_BUDGET);

        let NodeKind::Interior { left, right } = nodes[root].kind else {
            panic!("expected an interior root, found {:?}", nodes[root].kind);
        };
        assert!(left > root && right > left, "children must follow their parent");
        assert!(nodes[left].bounds.max.x <= nodes[right].bounds.min.x + 1.0);

        let xs: Vec<f32> = triangles.iter().map(|t| t.centroid().x).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]), "triangles not sorted: {xs:?}");
    }

    #[test]
    fn nodes_enclose_their_triangles() {
        let mut triangles = strip(20);
        let (nodes, root) = build(&mut triangles, 3);

        for (idx, _) in walk(nodes.as_slice(), root) {
            let node = &nodes[idx];
            let covered = leaf_ranges(nodes.as_slice(), idx);
            for tri in covered.into_iter().flatten().map(|i| &triangles[i]) {
                for p in tri.positions {
                    assert!(node.bounds.inside(p), "{p} escapes node {idx}: {:?}", node.bounds);
                }
            }
        }
    }

    #[test]
    fn coplanar_triangles_get_thickness() {
        let mut triangles: Vec<Triangle> = (0..4)
            .map(|i| {
                let x = i as f32;
                tri(
                    Vec3A::new(x, 0.0, 0.0),
                    Vec3A::new(x + 1.0, 0.0, 0.0),
                    Vec3A::new(x, 1.0, 0.0),
                )
            })
            .collect();
        let (nodes, root) = build(&mut triangles, DEFAULT_DEPTH_BUDGET);
        assert!(nodes[root].bounds.diagonal().z >= 2.0 * MIN_EXTENT);
    }

    #[test]
    fn appends_after_existing_nodes() {
        let mut triangles = strip(6);
        let mut nodes = Arena::new();
        let first = BvhBuilder::new(&mut triangles, &mut nodes).build(0..3, DEFAULT_DEPTH_BUDGET);
        let before: Vec<BvhNode> = nodes.as_slice().to_vec();
        let second = BvhBuilder::new(&mut triangles, &mut nodes).build(3..6, DEFAULT_DEPTH_BUDGET);

        assert_eq!(first, 0);
        assert_eq!(second, before.len());
        assert_eq!(&nodes.as_slice()[..before.len()], before.as_slice());
        assert_eq!(leaf_ranges(nodes.as_slice(), second).first().map(|r| r.start), Some(3));
    }
}
