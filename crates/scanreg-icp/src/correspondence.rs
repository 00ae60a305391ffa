use scanreg_3d::pointcloud::PointCloud;

use crate::{index::SpatialIndex, solver::FeatureMap};

/// A source-to-target point pairing found by nearest-neighbor search.
#[derive(Debug, Clone, Copy)]
pub struct Correspondence {
    /// Index of the point in the source cloud.
    pub source: usize,
    /// Index of the matched point in the target cloud.
    pub target: usize,
    /// Euclidean distance between the paired points.
    pub distance: f64,
    /// Weighted distance in feature space, when both clouds carry curvature.
    pub feature_distance: Option<f64>,
}

/// Pair each source point with its nearest target point, rejecting pairs
/// beyond `max_distance`.
///
/// `source_points` are expected to already be in the target frame. When both
/// sides carry a curvature channel, each correspondence also gets a weighted
/// feature-space distance over `(x, y, z, curvature)`; the weights and the
/// feature layout come from `weights` and `feature_map`.
///
/// An empty result is valid and means no source point found a target within
/// range.
pub fn find_correspondences(
    source_points: &[[f64; 3]],
    source_curvatures: Option<&[f64]>,
    target: &PointCloud,
    index: &SpatialIndex,
    max_distance: f64,
    weights: &[f64; 4],
    feature_map: FeatureMap,
) -> Vec<Correspondence> {
    let target_points = target.points();
    let target_curvatures = target.curvatures();

    let mut correspondences = Vec::with_capacity(source_points.len());
    for (source_idx, point) in source_points.iter().enumerate() {
        let (target_idx, distance) = index.nearest_one(point);
        if distance > max_distance {
            continue;
        }

        let feature_distance = match (source_curvatures, target_curvatures) {
            (Some(sc), Some(tc)) => {
                let fs = feature_map(point, sc[source_idx]);
                let ft = feature_map(&target_points[target_idx], tc[target_idx]);
                let mut sum = 0.0;
                for ((s, t), w) in fs.iter().zip(ft.iter()).zip(weights.iter()) {
                    let d = w * (s - t);
                    sum += d * d;
                }
                Some(sum.sqrt())
            }
            _ => None,
        };

        correspondences.push(Correspondence {
            source: source_idx,
            target: target_idx,
            distance,
            feature_distance,
        });
    }
    correspondences
}
