#![forbid(unsafe_code)]

//! Tidy-tree layout engine.
//!
//! Assigns every node of a [`FamilyTree`] a world-space position using the
//! Buchheim–Jünger–Leipert linear-time refinement of Reingold–Tilford.
//! The engine is fully deterministic: same tree and canvas always produce
//! identical output with no RNG or iteration-order dependence.
//!
//! # Pipeline
//! 1. Contour walk (post-order): preliminary cross-axis positions with
//!    subtree threads and deferred shifts
//! 2. Shift resolution + modifier accumulation (pre-order)
//! 3. Canvas normalization: cross extent scaled onto the canvas, depth
//!    mapped monotonically onto the other axis
//! 4. Orientation remap and Bézier edge construction
//!
//! Positions are in a normalized layout space; pan/zoom is applied on top
//! by the scene's viewport, never here.

use kintree_core::geometry::{Bounds, Point, Size};
use kintree_core::hierarchy::{FamilyTree, NodeIdx};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Which axis depth grows along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Root at the left, depth grows rightward (the classic family-tree
    /// orientation).
    #[default]
    LeftRight,
    /// Root at the top, depth grows downward.
    TopBottom,
}

/// A positioned node in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub node: NodeIdx,
    pub center: Point,
    pub radius: f64,
}

impl NodeBox {
    /// Bounding box of the drawn avatar circle.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_center(self.center, self.radius)
    }
}

/// One parent→child connector as a cubic Bézier.
///
/// Control points sit at the inter-level midpoint, matching the rounded
/// "link" curves of the original diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub parent: NodeIdx,
    pub child: NodeIdx,
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

/// Complete layout result.
///
/// `nodes[i]` positions `NodeIdx(i)`, so node boxes line up with the
/// record slice the tree was built from. The root has no incoming edge.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub nodes: Vec<NodeBox>,
    pub edges: Vec<EdgeCurve>,
    pub bounds: Bounds,
    pub orientation: Orientation,
    pub canvas: Size,
}

impl TreeLayout {
    /// Position of one node.
    #[must_use]
    pub fn center_of(&self, node: NodeIdx) -> Point {
        self.nodes[node.0].center
    }
}

/// Configuration knobs for the layout engine.
///
/// Gaps are relative separations in the pre-normalization walk space (a
/// sibling pair sits `sibling_gap` apart, nodes of different subtrees at
/// least `subtree_gap`); the canvas scale then stretches them uniformly.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub node_radius: f64,
    pub sibling_gap: f64,
    pub subtree_gap: f64,
    pub orientation: Orientation,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_radius: 30.0,
            sibling_gap: 1.0,
            subtree_gap: 2.0,
            orientation: Orientation::LeftRight,
        }
    }
}

// ---------------------------------------------------------------------------
// Walk state
// ---------------------------------------------------------------------------

/// Per-node scratch state for the contour walk, arena-indexed like the
/// tree itself.
struct Walk<'t> {
    tree: &'t FamilyTree,
    config: &'t LayoutConfig,
    prelim: Vec<f64>,
    modifier: Vec<f64>,
    thread: Vec<Option<usize>>,
    ancestor: Vec<usize>,
    change: Vec<f64>,
    shift: Vec<f64>,
    /// Index among siblings (0-based); 0 for the root.
    number: Vec<usize>,
}

impl<'t> Walk<'t> {
    fn new(tree: &'t FamilyTree, config: &'t LayoutConfig) -> Self {
        let n = tree.len();
        let mut number = vec![0usize; n];
        for i in 0..n {
            for (k, &child) in tree.children(NodeIdx(i)).iter().enumerate() {
                number[child.0] = k;
            }
        }
        Self {
            tree,
            config,
            prelim: vec![0.0; n],
            modifier: vec![0.0; n],
            thread: vec![None; n],
            ancestor: (0..n).collect(),
            change: vec![0.0; n],
            shift: vec![0.0; n],
            number,
        }
    }

    fn children(&self, v: usize) -> &[NodeIdx] {
        self.tree.children(NodeIdx(v))
    }

    fn parent(&self, v: usize) -> Option<usize> {
        self.tree.parent(NodeIdx(v)).map(|p| p.0)
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let p = self.parent(v)?;
        let k = self.number[v];
        (k > 0).then(|| self.children(p)[k - 1].0)
    }

    fn leftmost_sibling(&self, v: usize) -> Option<usize> {
        let p = self.parent(v)?;
        Some(self.children(p)[0].0)
    }

    /// Next node on the left contour of the subtree below `v`.
    fn next_left(&self, v: usize) -> Option<usize> {
        self.children(v).first().map(|c| c.0).or(self.thread[v])
    }

    /// Next node on the right contour of the subtree below `v`.
    fn next_right(&self, v: usize) -> Option<usize> {
        self.children(v).last().map(|c| c.0).or(self.thread[v])
    }

    /// Minimum separation between two adjacent nodes on a contour.
    fn separation(&self, a: usize, b: usize) -> f64 {
        if self.parent(a) == self.parent(b) {
            self.config.sibling_gap
        } else {
            self.config.subtree_gap
        }
    }

    /// Post-order contour walk with apportion interleaved between each
    /// child subtree. Explicit stack; parent chains can be arbitrarily
    /// deep.
    fn first_walk(&mut self, root: usize) {
        #[derive(Clone, Copy)]
        struct Frame {
            v: usize,
            next: usize,
            default_ancestor: usize,
        }

        let mut stack = vec![Frame {
            v: root,
            next: 0,
            default_ancestor: root,
        }];
        while let Some(&Frame { v, next, .. }) = stack.last() {
            let top = stack.len() - 1;
            let kids_len = self.children(v).len();
            if next < kids_len {
                let child = self.children(v)[next].0;
                if next == 0 {
                    stack[top].default_ancestor = child;
                }
                stack.push(Frame {
                    v: child,
                    next: 0,
                    default_ancestor: child,
                });
                continue;
            }

            if kids_len == 0 {
                self.prelim[v] = match self.left_sibling(v) {
                    Some(w) => self.prelim[w] + self.separation(w, v),
                    None => 0.0,
                };
            } else {
                self.execute_shifts(v);
                let first = self.children(v)[0].0;
                let last = self.children(v)[kids_len - 1].0;
                let midpoint = (self.prelim[first] + self.prelim[last]) / 2.0;
                match self.left_sibling(v) {
                    Some(w) => {
                        self.prelim[v] = self.prelim[w] + self.separation(w, v);
                        self.modifier[v] = self.prelim[v] - midpoint;
                    }
                    None => self.prelim[v] = midpoint,
                }
            }

            stack.pop();
            // The parent resumes: resolve v's subtree against its left
            // siblings, then advance to the next child.
            if let Some(parent_top) = stack.len().checked_sub(1) {
                let da = stack[parent_top].default_ancestor;
                let da = self.apportion(v, da);
                stack[parent_top].default_ancestor = da;
                stack[parent_top].next += 1;
            }
        }
    }

    /// Resolve the contour conflict between the subtree rooted at `v` and
    /// its left siblings' subtrees, shifting `v`'s subtree right as needed.
    fn apportion(&mut self, v: usize, default_ancestor: usize) -> usize {
        let Some(w) = self.left_sibling(v) else {
            return default_ancestor;
        };

        // Inner/outer contour cursors: (i)nside/(o)utside, (p)lus right
        // subtree / (m)inus left subtree.
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.leftmost_sibling(v).unwrap_or(v);

        let mut sip = self.modifier[vip];
        let mut sop = self.modifier[vop];
        let mut sim = self.modifier[vim];
        let mut som = self.modifier[vom];

        let mut default_ancestor = default_ancestor;

        while let (Some(nim), Some(nip)) = (self.next_right(vim), self.next_left(vip)) {
            vim = nim;
            vip = nip;
            vom = self.next_left(vom).unwrap_or(vom);
            vop = self.next_right(vop).unwrap_or(vop);
            self.ancestor[vop] = v;

            let gap = (self.prelim[vim] + sim) - (self.prelim[vip] + sip)
                + self.separation(vim, vip);
            if gap > 0.0 {
                let wm = self.responsible_ancestor(vim, v, default_ancestor);
                self.move_subtree(wm, v, gap);
                sip += gap;
                sop += gap;
            }

            sim += self.modifier[vim];
            sip += self.modifier[vip];
            som += self.modifier[vom];
            sop += self.modifier[vop];
        }

        if self.next_right(vim).is_some() && self.next_right(vop).is_none() {
            self.thread[vop] = self.next_right(vim);
            self.modifier[vop] += sim - sop;
        }
        if self.next_left(vip).is_some() && self.next_left(vom).is_none() {
            self.thread[vom] = self.next_left(vip);
            self.modifier[vom] += sip - som;
            default_ancestor = v;
        }
        default_ancestor
    }

    fn responsible_ancestor(&self, vim: usize, v: usize, default_ancestor: usize) -> usize {
        if self.parent(self.ancestor[vim]) == self.parent(v) {
            self.ancestor[vim]
        } else {
            default_ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = (self.number[wp] - self.number[wm]) as f64;
        self.change[wp] -= shift / subtrees;
        self.shift[wp] += shift;
        self.change[wm] += shift / subtrees;
        self.prelim[wp] += shift;
        self.modifier[wp] += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        let kids: Vec<usize> = self.children(v).iter().map(|c| c.0).collect();
        for &w in kids.iter().rev() {
            self.prelim[w] += shift;
            self.modifier[w] += shift;
            change += self.change[w];
            shift += self.shift[w] + change;
        }
    }

    /// Pre-order pass accumulating modifiers into final cross positions.
    fn second_walk(&self, root: usize, acc: f64, out: &mut [f64]) {
        let mut stack = vec![(root, acc)];
        while let Some((v, acc)) = stack.pop() {
            out[v] = self.prelim[v] + acc;
            for &child in self.children(v).iter().rev() {
                stack.push((child.0, acc + self.modifier[v]));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas normalization + orientation remap
// ---------------------------------------------------------------------------

/// Map walk-space cross positions and integer depths onto the canvas.
///
/// Cross positions stretch to fill the cross extent (like the original's
/// size-driven tree); depth maps linearly onto the primary extent with the
/// root at 0. Degenerate extents center instead of dividing by zero.
fn normalize(
    cross: &[f64],
    depths: &[usize],
    cross_extent: f64,
    primary_extent: f64,
) -> (Vec<f64>, Vec<f64>) {
    let min_c = cross.iter().copied().fold(f64::INFINITY, f64::min);
    let max_c = cross.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_d = depths.iter().copied().max().unwrap_or(0);

    let cross_out: Vec<f64> = cross
        .iter()
        .map(|&c| {
            if max_c - min_c < f64::EPSILON {
                cross_extent / 2.0
            } else {
                (c - min_c) / (max_c - min_c) * cross_extent
            }
        })
        .collect();

    let depth_out: Vec<f64> = depths
        .iter()
        .map(|&d| {
            if max_d == 0 {
                0.0
            } else {
                d as f64 / max_d as f64 * primary_extent
            }
        })
        .collect();

    (cross_out, depth_out)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Layout a tree using the default configuration.
#[must_use]
pub fn layout(tree: &FamilyTree, canvas: Size) -> TreeLayout {
    layout_with_config(tree, canvas, &LayoutConfig::default())
}

/// Layout a tree with explicit configuration.
#[must_use]
pub fn layout_with_config(tree: &FamilyTree, canvas: Size, config: &LayoutConfig) -> TreeLayout {
    let n = tree.len();
    let mut walk = Walk::new(tree, config);
    walk.first_walk(tree.root().0);

    let mut cross = vec![0.0f64; n];
    walk.second_walk(tree.root().0, -walk.prelim[tree.root().0], &mut cross);

    // Single pre-order pass; parents come before children.
    let mut depths = vec![0usize; n];
    for v in tree.preorder() {
        if let Some(p) = tree.parent(v) {
            depths[v.0] = depths[p.0] + 1;
        }
    }

    let (cross_extent, primary_extent) = match config.orientation {
        Orientation::LeftRight => (canvas.height, canvas.width),
        Orientation::TopBottom => (canvas.width, canvas.height),
    };
    let (cross, primary) = normalize(&cross, &depths, cross_extent, primary_extent);

    let nodes: Vec<NodeBox> = (0..n)
        .map(|i| {
            let center = match config.orientation {
                Orientation::LeftRight => Point::new(primary[i], cross[i]),
                Orientation::TopBottom => Point::new(cross[i], primary[i]),
            };
            NodeBox {
                node: NodeIdx(i),
                center,
                radius: config.node_radius,
            }
        })
        .collect();

    let edges: Vec<EdgeCurve> = (0..n)
        .filter_map(|i| {
            let parent = tree.parent(NodeIdx(i))?;
            Some(connect(
                nodes[parent.0].center,
                nodes[i].center,
                parent,
                NodeIdx(i),
                config.orientation,
            ))
        })
        .collect();

    let bounds = nodes
        .iter()
        .fold(Bounds::EMPTY, |acc, nb| acc.union(&nb.bounds()));

    #[cfg(feature = "tracing")]
    tracing::debug!(nodes = n, edges = edges.len(), "tree layout computed");

    TreeLayout {
        nodes,
        edges,
        bounds,
        orientation: config.orientation,
        canvas,
    }
}

/// Cubic Bézier from parent to child with control points at the
/// inter-level midpoint.
fn connect(
    from: Point,
    to: Point,
    parent: NodeIdx,
    child: NodeIdx,
    orientation: Orientation,
) -> EdgeCurve {
    let (ctrl1, ctrl2) = match orientation {
        Orientation::LeftRight => {
            let mx = (from.x + to.x) / 2.0;
            (Point::new(mx, from.y), Point::new(mx, to.y))
        }
        Orientation::TopBottom => {
            let my = (from.y + to.y) / 2.0;
            (Point::new(from.x, my), Point::new(to.x, my))
        }
    };
    EdgeCurve {
        parent,
        child,
        from,
        ctrl1,
        ctrl2,
        to,
    }
}

/// Bounding interval of a subtree on the cross axis, used by the overlap
/// invariant tests.
#[must_use]
pub fn subtree_cross_interval(layout: &TreeLayout, tree: &FamilyTree, root: NodeIdx) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        let c = match layout.orientation {
            Orientation::LeftRight => layout.nodes[v.0].center.y,
            Orientation::TopBottom => layout.nodes[v.0].center.x,
        };
        min = min.min(c);
        max = max.max(c);
        stack.extend_from_slice(tree.children(v));
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kintree_core::MemberRecord;
    use kintree_core::hierarchy::build;

    const CANVAS: Size = Size {
        width: 1200.0,
        height: 600.0,
    };

    fn rec(id: &str, parent: Option<&str>) -> MemberRecord {
        MemberRecord::new(id, format!("name-{id}"), parent, 1)
    }

    fn tree_of(members: &[(&str, Option<&str>)]) -> FamilyTree {
        let records: Vec<MemberRecord> = members.iter().map(|&(id, p)| rec(id, p)).collect();
        build(&records).unwrap()
    }

    #[test]
    fn single_node_at_origin_depth() {
        let tree = tree_of(&[("A", None)]);
        let l = layout(&tree, CANVAS);
        assert_eq!(l.nodes.len(), 1);
        assert_eq!(l.edges.len(), 0);
        // Depth axis at 0, cross axis centered.
        assert!((l.nodes[0].center.x - 0.0).abs() < 1e-9);
        assert!((l.nodes[0].center.y - CANVAS.height / 2.0).abs() < 1e-9);
    }

    #[test]
    fn depth_monotone_on_primary_axis() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("B")),
            ("D", Some("C")),
        ]);
        let l = layout(&tree, CANVAS);
        for i in 1..4 {
            assert!(
                l.nodes[i].center.x > l.nodes[i - 1].center.x,
                "deeper node must sit farther along the primary axis"
            );
        }
    }

    #[test]
    fn parent_centered_over_children() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("A")),
        ]);
        let l = layout(&tree, CANVAS);
        let mid = (l.nodes[1].center.y + l.nodes[3].center.y) / 2.0;
        assert!((l.nodes[0].center.y - mid).abs() < 1e-9);
    }

    #[test]
    fn siblings_evenly_spaced() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("A")),
            ("E", Some("A")),
        ]);
        let l = layout(&tree, CANVAS);
        let gaps: Vec<f64> = (2..5)
            .map(|i| l.nodes[i].center.y - l.nodes[i - 1].center.y)
            .collect();
        for g in &gaps {
            assert!(*g > 0.0, "siblings must keep input order on the cross axis");
            assert!((g - gaps[0]).abs() < 1e-9, "uneven sibling spacing: {gaps:?}");
        }
    }

    #[test]
    fn sibling_subtrees_do_not_overlap() {
        // Two bushy siblings with enough leaves to collide if the contour
        // walk were wrong.
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("B1", Some("B")),
            ("B2", Some("B")),
            ("B3", Some("B")),
            ("C1", Some("C")),
            ("C2", Some("C")),
            ("C3", Some("C")),
        ]);
        let l = layout(&tree, CANVAS);
        let (_, b_max) = subtree_cross_interval(&l, &tree, NodeIdx(1));
        let (c_min, _) = subtree_cross_interval(&l, &tree, NodeIdx(2));
        assert!(
            b_max < c_min,
            "sibling subtrees overlap: b_max={b_max} c_min={c_min}"
        );
    }

    #[test]
    fn deterministic_positions() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("B")),
            ("E", Some("B")),
            ("F", Some("C")),
        ]);
        let l1 = layout(&tree, CANVAS);
        let l2 = layout(&tree, CANVAS);
        for (a, b) in l1.nodes.iter().zip(l2.nodes.iter()) {
            assert_eq!(a.center, b.center);
        }
    }

    #[test]
    fn one_edge_per_non_root() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("B")),
        ]);
        let l = layout(&tree, CANVAS);
        assert_eq!(l.edges.len(), 3);
        assert!(l.edges.iter().all(|e| e.child != tree.root()));
    }

    #[test]
    fn edge_endpoints_match_node_centers() {
        let tree = tree_of(&[("A", None), ("B", Some("A"))]);
        let l = layout(&tree, CANVAS);
        let e = &l.edges[0];
        assert_eq!(e.from, l.center_of(e.parent));
        assert_eq!(e.to, l.center_of(e.child));
        // Control points at the horizontal midpoint for LeftRight.
        let mx = (e.from.x + e.to.x) / 2.0;
        assert!((e.ctrl1.x - mx).abs() < 1e-9);
        assert!((e.ctrl2.x - mx).abs() < 1e-9);
        assert!((e.ctrl1.y - e.from.y).abs() < 1e-9);
        assert!((e.ctrl2.y - e.to.y).abs() < 1e-9);
    }

    #[test]
    fn top_bottom_orientation_swaps_axes() {
        let tree = tree_of(&[("A", None), ("B", Some("A")), ("C", Some("A"))]);
        let config = LayoutConfig {
            orientation: Orientation::TopBottom,
            ..LayoutConfig::default()
        };
        let l = layout_with_config(&tree, CANVAS, &config);
        assert!(l.nodes[0].center.y < l.nodes[1].center.y);
        assert!(l.nodes[1].center.x < l.nodes[2].center.x);
    }

    #[test]
    fn bounds_enclose_all_nodes() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("C")),
        ]);
        let l = layout(&tree, CANVAS);
        for nb in &l.nodes {
            assert!(l.bounds.contains(nb.center));
        }
    }

    #[test]
    fn small_family_keeps_sibling_order() {
        // A with children [B, C] in that order.
        let tree = tree_of(&[("A", None), ("B", Some("A")), ("C", Some("A"))]);
        let l = layout(&tree, CANVAS);
        assert_eq!(l.nodes.len(), 3);
        // B before C on the cross axis (input order preserved).
        assert!(l.nodes[1].center.y < l.nodes[2].center.y);
        // Both deeper than the root on the primary axis.
        assert!(l.nodes[1].center.x > l.nodes[0].center.x);
        assert!(l.nodes[2].center.x > l.nodes[0].center.x);
    }

    #[test]
    fn canvas_scaling_spans_cross_extent() {
        let tree = tree_of(&[("A", None), ("B", Some("A")), ("C", Some("A"))]);
        let l = layout(&tree, CANVAS);
        // Leaves stretch to the cross extent edges.
        assert!((l.nodes[1].center.y - 0.0).abs() < 1e-9);
        assert!((l.nodes[2].center.y - CANVAS.height).abs() < 1e-9);
    }

    #[test]
    fn deep_chain_lays_out_without_exhausting_the_stack() {
        let depth = 10_000;
        let mut records = vec![MemberRecord::new("n0", "name-n0", None, 1)];
        for i in 1..depth {
            let parent = format!("n{}", i - 1);
            records.push(MemberRecord::new(
                format!("n{i}"),
                format!("name-n{i}"),
                Some(parent.as_str()),
                1,
            ));
        }
        let tree = build(&records).unwrap();
        let l = layout(&tree, CANVAS);
        assert_eq!(l.nodes.len(), depth);
        // Deepest node lands at the far end of the primary axis.
        assert!((l.nodes[depth - 1].center.x - CANVAS.width).abs() < 1e-9);
    }

    #[test]
    fn asymmetric_fanout_keeps_order() {
        let tree = tree_of(&[
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("A")),
            ("B1", Some("B")),
            ("D1", Some("D")),
            ("D2", Some("D")),
            ("D3", Some("D")),
        ]);
        let l = layout(&tree, CANVAS);
        assert!(l.nodes[1].center.y < l.nodes[2].center.y);
        assert!(l.nodes[2].center.y < l.nodes[3].center.y);
    }
}
