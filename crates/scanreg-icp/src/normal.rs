use scanreg_3d::{linalg::symmetric_eigen3, pointcloud::PointCloud};

use crate::{error::RegistrationError, index::SpatialIndex};

/// Default neighborhood size for normal estimation.
pub const DEFAULT_NEIGHBORS: usize = 30;

/// Minimum neighborhood size for a meaningful covariance fit.
const MIN_NEIGHBORS: usize = 4;

/// Estimate per-point surface normals and curvatures from local neighborhoods.
///
/// For each point the `k` nearest neighbors (the point itself included) span a
/// covariance matrix whose smallest eigenvector is the normal and whose
/// eigenvalue ratio `l0 / (l0 + l1 + l2)` is the curvature. Points whose
/// neighborhood is too small to fit a plane are skipped and keep a zero normal
/// and curvature.
///
/// Returns a copy of the cloud with the normal and curvature channels filled
/// in, or [`RegistrationError::InsufficientNeighbors`] if no point in the
/// cloud has a usable neighborhood.
pub fn estimate_normals(cloud: &PointCloud, k: usize) -> Result<PointCloud, RegistrationError> {
    let points = cloud.points();
    if points.is_empty() {
        return Err(RegistrationError::EmptyPointCloud);
    }

    let index = SpatialIndex::build(points)?;
    let query_size = (k + 1).min(points.len());

    let mut normals = vec![[0.0; 3]; points.len()];
    let mut curvatures = vec![0.0; points.len()];
    let mut skipped = 0;
    let mut largest_neighborhood = 0;

    for (i, point) in points.iter().enumerate() {
        let neighbors = index.nearest_n(point, query_size);
        // the query point is its own nearest neighbor
        let neighborhood = neighbors.len().saturating_sub(1);
        largest_neighborhood = largest_neighborhood.max(neighborhood);
        if neighborhood < MIN_NEIGHBORS {
            skipped += 1;
            continue;
        }

        let inv_count = 1.0 / neighbors.len() as f64;
        let mut centroid = [0.0; 3];
        for &(j, _) in &neighbors {
            let p = points[j];
            centroid[0] += p[0] * inv_count;
            centroid[1] += p[1] * inv_count;
            centroid[2] += p[2] * inv_count;
        }

        let mut covariance = [[0.0; 3]; 3];
        for &(j, _) in &neighbors {
            let p = points[j];
            let d = [p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]];
            for r in 0..3 {
                for c in 0..3 {
                    covariance[r][c] += d[r] * d[c] * inv_count;
                }
            }
        }

        let (values, vectors) = symmetric_eigen3(&covariance);
        normals[i] = vectors[0];

        let trace = values[0] + values[1] + values[2];
        if trace > f64::EPSILON {
            curvatures[i] = values[0] / trace;
        }
    }

    if skipped == points.len() {
        return Err(RegistrationError::InsufficientNeighbors {
            required: MIN_NEIGHBORS,
            found: largest_neighborhood,
        });
    }

    if skipped > 0 {
        log::warn!(
            "normal estimation skipped {} of {} points with undersized neighborhoods",
            skipped,
            points.len()
        );
    }

    Ok(PointCloud::new(
        points.to_vec(),
        Some(normals),
        Some(curvatures),
    ))
}
