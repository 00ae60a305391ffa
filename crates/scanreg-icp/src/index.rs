use std::num::NonZero;

use kiddo::{immutable::float::kdtree::ImmutableKdTree, SquaredEuclidean};

use crate::error::RegistrationError;

/// Immutable k-d tree over a fixed set of 3d points.
///
/// Distances returned by the query methods are Euclidean, not squared.
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, u32, 3, 32>,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over the given points.
    pub fn build(points: &[[f64; 3]]) -> Result<Self, RegistrationError> {
        if points.is_empty() {
            return Err(RegistrationError::EmptyPointCloud);
        }
        Ok(Self {
            tree: ImmutableKdTree::new_from_slice(points),
            len: points.len(),
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index is empty. Never true for a built index.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index and distance of the nearest indexed point.
    pub fn nearest_one(&self, query: &[f64; 3]) -> (usize, f64) {
        let nn = self.tree.nearest_one::<SquaredEuclidean>(query);
        (nn.item as usize, nn.distance.sqrt())
    }

    /// Indices and distances of the `k` nearest indexed points, closest first.
    ///
    /// `k == 0` yields an empty result.
    pub fn nearest_n(&self, query: &[f64; 3], k: usize) -> Vec<(usize, f64)> {
        let Some(k) = NonZero::new(k) else {
            return Vec::new();
        };
        self.tree
            .nearest_n::<SquaredEuclidean>(query, k)
            .into_iter()
            .map(|nn| (nn.item as usize, nn.distance.sqrt()))
            .collect()
    }

    /// Indices and distances of all indexed points within `radius` of the query.
    pub fn within_radius(&self, query: &[f64; 3], radius: f64) -> Vec<(usize, f64)> {
        self.tree
            .within::<SquaredEuclidean>(query, radius * radius)
            .into_iter()
            .map(|nn| (nn.item as usize, nn.distance.sqrt()))
            .collect()
    }
}
