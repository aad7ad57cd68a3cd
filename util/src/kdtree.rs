//! # KdTree Implementation
//!
//! A balanced two dimensional k-d tree, as described in [the wikipedia
//! article](https://en.wikipedia.org/wiki/K-d_tree), supporting single nearest neighbour queries.
//!
//! The tree is built once from a fixed set of points and is immutable afterwards. Each point is
//! tagged with its index in the slice it was built from, which is what queries return.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use nalgebra::Vector2;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// An immutable, balanced 2D k-d tree.
#[derive(Clone, Debug, Default)]
pub struct KdTree {
    /// Node storage, children are referred to by their index in this list
    nodes: Vec<Node>,

    /// Index of the root node, `None` if the tree is empty
    root: Option<usize>,
}

/// The result of a nearest neighbour query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Index of the point in the slice the tree was built from
    pub item: usize,

    /// Squared euclidean distance between the query point and the neighbour
    pub dist_sq: f64,
}

#[derive(Clone, Debug)]
struct Node {
    point: Vector2<f64>,
    item: usize,

    /// Split axis, 0 for x, 1 for y
    axis: usize,

    left: Option<usize>,
    right: Option<usize>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl KdTree {
    /// Build a new tree from the given points.
    ///
    /// The tree is balanced by splitting on the median of each subset, alternating between the x
    /// and y axes.
    pub fn build(points: &[Vector2<f64>]) -> Self {
        let mut items: Vec<(Vector2<f64>, usize)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (*p, i))
            .collect();

        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };

        tree.root = tree.build_node(&mut items, 0);

        tree
    }

    /// Number of points in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the point closest to `target`.
    ///
    /// Where several points are at exactly the same distance the one with the lowest item index
    /// is returned. Returns `None` only if the tree is empty.
    pub fn nearest(&self, target: &Vector2<f64>) -> Option<Neighbour> {
        let mut best = None;

        if let Some(root) = self.root {
            self.search(root, target, &mut best);
        }

        best
    }

    fn build_node(&mut self, items: &mut [(Vector2<f64>, usize)], depth: usize) -> Option<usize> {
        if items.is_empty() {
            return None;
        }

        let axis = depth % 2;
        let median = items.len() / 2;

        // Partition around the median, everything in the lower half is <= the median on this axis
        // and everything in the upper half is >=.
        items.select_nth_unstable_by(median, |a, b| a.0[axis].total_cmp(&b.0[axis]));
        let (point, item) = items[median];

        let (lower, upper) = items.split_at_mut(median);
        let left = self.build_node(lower, depth + 1);
        let right = self.build_node(&mut upper[1..], depth + 1);

        self.nodes.push(Node {
            point,
            item,
            axis,
            left,
            right,
        });

        Some(self.nodes.len() - 1)
    }

    fn search(&self, node_idx: usize, target: &Vector2<f64>, best: &mut Option<Neighbour>) {
        let node = &self.nodes[node_idx];

        let dist_sq = (node.point - target).norm_squared();
        let improves = match best {
            None => true,
            Some(b) => dist_sq < b.dist_sq || (dist_sq == b.dist_sq && node.item < b.item),
        };
        if improves {
            *best = Some(Neighbour {
                item: node.item,
                dist_sq,
            });
        }

        // Descend into the side of the split the target is on first
        let diff = target[node.axis] - node.point[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(n) = near {
            self.search(n, target, best);
        }

        // Only search the far side if the splitting line is no further away than the current
        // best. Equality is searched too so that ties resolve to the lowest index.
        if let Some(f) = far {
            let visit = match best {
                Some(b) => diff * diff <= b.dist_sq,
                None => true,
            };
            if visit {
                self.search(f, target, best);
            }
        }
    }
}
