use std::collections::HashMap;

use crate::pointcloud::PointCloud;
use crate::vector::DVec3;

/// A 3D voxel grid for downsampling point clouds before registration.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    /// Cubic voxel (leaf) edge length.
    leaf_size: f64,
    /// Minimum number of points required per voxel.
    min_points_per_voxel: usize,
}

impl VoxelGrid {
    /// Creates a new `VoxelGrid` with the given cubic leaf size.
    ///
    /// # Panics
    /// Panics if `leaf_size` is not positive.
    pub fn new(leaf_size: f64) -> Self {
        if leaf_size <= 0.0 {
            panic!("leaf size must be positive");
        }
        VoxelGrid {
            leaf_size,
            min_points_per_voxel: 1,
        }
    }

    /// Require at least `min_points` points in a voxel for it to survive.
    pub fn with_min_points_per_voxel(mut self, min_points: usize) -> Self {
        self.min_points_per_voxel = min_points.max(1);
        self
    }

    /// Downsamples the cloud by replacing each occupied voxel with its centroid.
    ///
    /// Normals and curvatures are not carried over; downsampling runs before
    /// they are estimated.
    pub fn downsample(&self, cloud: &PointCloud) -> PointCloud {
        let mut grid: HashMap<(i64, i64, i64), (DVec3, usize)> = HashMap::new();

        for point in cloud.points() {
            let key = (
                (point[0] / self.leaf_size).floor() as i64,
                (point[1] / self.leaf_size).floor() as i64,
                (point[2] / self.leaf_size).floor() as i64,
            );
            let entry = grid.entry(key).or_insert((DVec3::default(), 0));
            entry.0.add_assign(&DVec3::from_array(point));
            entry.1 += 1;
        }

        let mut points = Vec::with_capacity(grid.len());
        for (_, (sum, count)) in grid {
            if count >= self.min_points_per_voxel {
                points.push(sum.scaled(1.0 / count as f64).to_array());
            }
        }

        PointCloud::new(points, None, None)
    }
}
