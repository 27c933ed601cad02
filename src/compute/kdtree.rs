//! Three-dimensional k-d tree for exact nearest-neighbor search.
//!
//! The tree is built once over the projected gazetteer and never mutated
//! afterwards. Nodes live in a flat array; leaves refer to contiguous ranges
//! of the reordered point array. Split axes alternate x, y, z by depth and
//! every split is at the median, so depth stays near `log2(n / leaf_size)`.
//!
//! Ties are resolved towards the lowest original index. Median selection
//! also orders equal coordinates by original index, so the layout of the
//! tree itself is a pure function of the input.

use crate::error::{GeocodeError, Result};
use revgeo_types::point::ProjectedPoint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const DIMENSIONS: usize = 3;

/// Default maximum number of points per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 16;

/// Nearest point found for a query: original index and Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the sequence the tree was built from
    pub index: usize,
    /// Euclidean distance in the projected space (km)
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    /// Interior node: split axis, split value, left child, right child.
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
    /// Leaf node: range [start..end) into the points/indices arrays.
    Leaf { start: usize, end: usize },
}

/// Immutable k-d tree over projected points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdTree {
    nodes: Vec<Node>,
    points: Vec<ProjectedPoint>,
    indices: Vec<usize>,
    leaf_size: usize,
}

/// Running best candidate during a search.
struct Best {
    index: usize,
    dist_sq: f64,
}

impl Best {
    #[inline]
    fn offer(&mut self, index: usize, dist_sq: f64) {
        if dist_sq < self.dist_sq || (dist_sq == self.dist_sq && index < self.index) {
            self.index = index;
            self.dist_sq = dist_sq;
        }
    }
}

impl KdTree {
    /// Build a tree with the default leaf size.
    pub fn build(points: Vec<ProjectedPoint>) -> Self {
        Self::with_leaf_size(points, DEFAULT_LEAF_SIZE)
    }

    /// Build a tree whose leaves hold at most `leaf_size` points.
    ///
    /// An empty input yields an empty tree; queries against it fail with
    /// [`GeocodeError::EmptyIndex`].
    pub fn with_leaf_size(points: Vec<ProjectedPoint>, leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        let n = points.len();

        if n == 0 {
            return KdTree {
                nodes: Vec::new(),
                points,
                indices: Vec::new(),
                leaf_size,
            };
        }

        let mut order: Vec<usize> = (0..n).collect();
        let mut nodes = Vec::with_capacity(2 * n.div_ceil(leaf_size));
        build_recursive(&points, &mut nodes, &mut order, 0, n, 0, leaf_size);

        let reordered = order.iter().map(|&i| points[i]).collect();

        KdTree {
            nodes,
            points: reordered,
            indices: order,
            leaf_size,
        }
    }

    /// Find the nearest point to `query`.
    ///
    /// # Errors
    ///
    /// [`GeocodeError::EmptyIndex`] if the tree holds no points, and
    /// [`GeocodeError::Parse`] if the query has a non-finite component.
    pub fn nearest(&self, query: &ProjectedPoint) -> Result<Neighbor> {
        if self.nodes.is_empty() {
            return Err(GeocodeError::EmptyIndex);
        }
        if !(query.x.is_finite() && query.y.is_finite() && query.z.is_finite()) {
            return Err(GeocodeError::parse("projected point", format!("{:?}", query)));
        }

        let mut best = Best {
            index: usize::MAX,
            dist_sq: f64::INFINITY,
        };
        self.nearest_recursive(0, query, &mut best);

        Ok(Neighbor {
            index: best.index,
            distance: best.dist_sq.sqrt(),
        })
    }

    fn nearest_recursive(&self, node_idx: usize, query: &ProjectedPoint, best: &mut Best) {
        match self.nodes[node_idx] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    best.offer(self.indices[i], query.distance_squared(&self.points[i]));
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let q = query.axis(axis);
                let diff = q - value;

                let (near, far) = if q <= value {
                    (left, right)
                } else {
                    (right, left)
                };

                self.nearest_recursive(near, query, best);

                // Equality still descends: an equidistant point with a lower
                // index may sit on the far side.
                if diff * diff <= best.dist_sq {
                    self.nearest_recursive(far, query, best);
                }
            }
        }
    }

    /// Nearest neighbor for each query, in query order.
    ///
    /// Fails on the first query that fails; an empty tree fails even for an
    /// empty batch.
    pub fn nearest_batch(&self, queries: &[ProjectedPoint]) -> Result<Vec<Neighbor>> {
        if self.nodes.is_empty() {
            return Err(GeocodeError::EmptyIndex);
        }
        queries.iter().map(|q| self.nearest(q)).collect()
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Check the structure of a tree that was not built in this process,
    /// such as one read back from a snapshot.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let n = self.points.len();

        if self.indices.len() != n {
            return Err(format!("{} indices for {} points", self.indices.len(), n));
        }
        if self.leaf_size == 0 {
            return Err("leaf size is zero".to_string());
        }
        if self.nodes.is_empty() != (n == 0) {
            return Err(format!("{} nodes for {} points", self.nodes.len(), n));
        }
        if let Some(pos) = self
            .points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(format!("point {} is not finite", pos));
        }

        let mut seen = vec![false; n];
        for &index in &self.indices {
            if index >= n || std::mem::replace(&mut seen[index], true) {
                return Err(format!("index {} is out of range or repeated", index));
            }
        }

        for (node_idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { start, end } => {
                    if start > end || end > n {
                        return Err(format!(
                            "leaf {} covers {}..{} of {} points",
                            node_idx, start, end, n
                        ));
                    }
                }
                Node::Split {
                    axis,
                    value,
                    left,
                    right,
                } => {
                    if axis >= DIMENSIONS || !value.is_finite() {
                        return Err(format!(
                            "split {} has axis {} value {}",
                            node_idx, axis, value
                        ));
                    }
                    // Children always follow their parent, so there are no cycles.
                    let in_bounds = |child: usize| child > node_idx && child < self.nodes.len();
                    if !in_bounds(left) || !in_bounds(right) {
                        return Err(format!(
                            "split {} has children {} and {}",
                            node_idx, left, right
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Longest root-to-leaf path, counting the root as depth 1.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((node_idx, depth)) = stack.pop() {
            match self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }
}

fn build_recursive(
    points: &[ProjectedPoint],
    nodes: &mut Vec<Node>,
    order: &mut [usize],
    start: usize,
    end: usize,
    depth: usize,
    leaf_size: usize,
) -> usize {
    let count = end - start;

    if count <= leaf_size {
        let node_idx = nodes.len();
        nodes.push(Node::Leaf { start, end });
        return node_idx;
    }

    let axis = depth % DIMENSIONS;
    let median = count / 2;

    order[start..end].select_nth_unstable_by(median, |&a, &b| compare_on_axis(points, axis, a, b));
    let value = points[order[start + median]].axis(axis);

    let node_idx = nodes.len();
    nodes.push(Node::Leaf { start: 0, end: 0 });

    let split = start + median;
    let left = build_recursive(points, nodes, order, start, split, depth + 1, leaf_size);
    let right = build_recursive(points, nodes, order, split, end, depth + 1, leaf_size);

    nodes[node_idx] = Node::Split {
        axis,
        value,
        left,
        right,
    };

    node_idx
}

#[inline]
fn compare_on_axis(points: &[ProjectedPoint], axis: usize, a: usize, b: usize) -> Ordering {
    points[a]
        .axis(axis)
        .total_cmp(&points[b].axis(axis))
        .then(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xorshift(seed: u64) -> impl FnMut() -> f64 {
        let mut state = seed;
        move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state as f64) / (u64::MAX as f64)
        }
    }

    fn brute_force(points: &[ProjectedPoint], query: &ProjectedPoint) -> (usize, f64) {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, query.distance_squared(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .unwrap()
    }

    #[test]
    fn empty_tree() {
        let tree = KdTree::build(vec![]);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
        assert!(matches!(
            tree.nearest(&ProjectedPoint::new(0.0, 0.0, 0.0)),
            Err(GeocodeError::EmptyIndex)
        ));
        assert!(matches!(
            tree.nearest_batch(&[]),
            Err(GeocodeError::EmptyIndex)
        ));
    }

    #[test]
    fn single_point() {
        let tree = KdTree::build(vec![ProjectedPoint::new(1.0, 2.0, 3.0)]);

        let nearest = tree.nearest(&ProjectedPoint::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(nearest.index, 0);
        assert_eq!(nearest.distance, 0.0);

        let nearest = tree.nearest(&ProjectedPoint::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(nearest.index, 0);
        assert!((nearest.distance - 14.0_f64.sqrt()).abs() < 1e-12);

        let far = tree
            .nearest(&ProjectedPoint::new(-1e6, 1e6, -1e6))
            .unwrap();
        assert_eq!(far.index, 0);
    }

    #[test]
    fn rejects_non_finite_query() {
        let tree = KdTree::build(vec![ProjectedPoint::new(1.0, 2.0, 3.0)]);
        assert!(matches!(
            tree.nearest(&ProjectedPoint::new(f64::NAN, 0.0, 0.0)),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut rng = xorshift(987654321);
        let n = 2_000;
        let points: Vec<ProjectedPoint> = (0..n)
            .map(|_| ProjectedPoint::new(rng(), rng(), rng()))
            .collect();

        for leaf_size in [1, 4, 16, 64] {
            let tree = KdTree::with_leaf_size(points.clone(), leaf_size);
            assert_eq!(tree.len(), n);

            for _ in 0..200 {
                let query = ProjectedPoint::new(rng(), rng(), rng());
                let found = tree.nearest(&query).unwrap();
                let (index, dist_sq) = brute_force(&points, &query);
                assert_eq!(found.index, index, "leaf_size {}", leaf_size);
                assert_eq!(found.distance, dist_sq.sqrt());
            }
        }
    }

    #[test]
    fn self_query_returns_own_index() {
        let mut rng = xorshift(42);
        let points: Vec<ProjectedPoint> = (0..500)
            .map(|_| ProjectedPoint::new(rng() * 100.0, rng() * 100.0, rng() * 100.0))
            .collect();
        let tree = KdTree::with_leaf_size(points.clone(), 8);

        for (i, point) in points.iter().enumerate() {
            let found = tree.nearest(point).unwrap();
            assert_eq!(found.index, i);
            assert_eq!(found.distance, 0.0);
        }
    }

    #[test]
    fn duplicates_resolve_to_lowest_index() {
        let mut points = vec![ProjectedPoint::new(5.0, 5.0, 5.0); 40];
        points.insert(0, ProjectedPoint::new(100.0, 100.0, 100.0));

        // Leaf size 1 spreads the duplicates across many leaves.
        let tree = KdTree::with_leaf_size(points, 1);
        let found = tree.nearest(&ProjectedPoint::new(5.0, 5.0, 5.0)).unwrap();
        assert_eq!(found.index, 1);

        let found = tree.nearest(&ProjectedPoint::new(6.0, 6.0, 6.0)).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn equidistant_points_resolve_to_lowest_index() {
        let points = vec![
            ProjectedPoint::new(3.0, 0.0, 0.0),
            ProjectedPoint::new(-1.0, 0.0, 0.0),
            ProjectedPoint::new(0.0, 1.0, 0.0),
            ProjectedPoint::new(1.0, 0.0, 0.0),
            ProjectedPoint::new(0.0, -1.0, 0.0),
            ProjectedPoint::new(0.0, 0.0, 1.0),
        ];
        for leaf_size in [1, 2, 16] {
            let tree = KdTree::with_leaf_size(points.clone(), leaf_size);
            let found = tree.nearest(&ProjectedPoint::new(0.0, 0.0, 0.0)).unwrap();
            assert_eq!(found.index, 1, "leaf_size {}", leaf_size);
            assert_eq!(found.distance, 1.0);
        }
    }

    #[test]
    fn batch_matches_single_queries() {
        let mut rng = xorshift(7);
        let points: Vec<ProjectedPoint> = (0..300)
            .map(|_| ProjectedPoint::new(rng(), rng(), rng()))
            .collect();
        let queries: Vec<ProjectedPoint> = (0..100)
            .map(|_| ProjectedPoint::new(rng(), rng(), rng()))
            .collect();
        let tree = KdTree::build(points);

        let batch = tree.nearest_batch(&queries).unwrap();
        assert_eq!(batch.len(), queries.len());
        for (query, result) in queries.iter().zip(&batch) {
            assert_eq!(*result, tree.nearest(query).unwrap());
        }

        assert!(tree.nearest_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn depth_is_logarithmic() {
        let mut rng = xorshift(1234);
        let n = 10_000;
        let points: Vec<ProjectedPoint> = (0..n)
            .map(|_| ProjectedPoint::new(rng(), rng(), rng()))
            .collect();
        let tree = KdTree::with_leaf_size(points, 16);

        // ceil(log2(10_000 / 16)) + 1 = 11
        assert!(tree.depth() <= 11, "depth {}", tree.depth());
    }

    #[test]
    fn identical_builds_are_identical() {
        let mut rng = xorshift(99);
        let points: Vec<ProjectedPoint> = (0..1_000)
            .map(|_| ProjectedPoint::new((rng() * 10.0).floor(), (rng() * 10.0).floor(), 0.0))
            .collect();
        let a = KdTree::with_leaf_size(points.clone(), 4);
        let b = KdTree::with_leaf_size(points, 4);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn built_trees_pass_invariants() {
        let mut rng = xorshift(404);
        let points: Vec<ProjectedPoint> = (0..500)
            .map(|_| ProjectedPoint::new(rng(), rng(), rng()))
            .collect();

        assert!(KdTree::build(vec![]).check_invariants().is_ok());
        for leaf_size in [1, 3, 16, 1_000] {
            let tree = KdTree::with_leaf_size(points.clone(), leaf_size);
            assert_eq!(tree.check_invariants(), Ok(()));
        }
    }

    #[test]
    fn tampered_trees_fail_invariants() {
        let points = vec![
            ProjectedPoint::new(0.0, 0.0, 0.0),
            ProjectedPoint::new(1.0, 0.0, 0.0),
            ProjectedPoint::new(2.0, 0.0, 0.0),
        ];
        let good = KdTree::with_leaf_size(points, 1);
        assert!(good.check_invariants().is_ok());

        let mut bad = good.clone();
        bad.indices[0] = 7;
        assert!(bad.check_invariants().is_err());

        let mut bad = good.clone();
        bad.indices[1] = bad.indices[0];
        assert!(bad.check_invariants().is_err());

        let mut bad = good.clone();
        bad.nodes = vec![Node::Leaf { start: 0, end: 5 }];
        assert!(bad.check_invariants().is_err());

        let mut bad = good.clone();
        bad.nodes[0] = Node::Split {
            axis: 0,
            value: 1.0,
            left: 0,
            right: 1,
        };
        assert!(bad.check_invariants().is_err());

        let mut bad = good.clone();
        bad.nodes[0] = Node::Split {
            axis: 3,
            value: 1.0,
            left: 1,
            right: 2,
        };
        assert!(bad.check_invariants().is_err());

        let mut bad = good.clone();
        bad.nodes.clear();
        assert!(bad.check_invariants().is_err());

        let mut bad = good;
        bad.points[2].z = f64::NAN;
        assert!(bad.check_invariants().is_err());
    }
}
