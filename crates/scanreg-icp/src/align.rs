use scanreg_3d::{linalg::transform_points, pointcloud::PointCloud, rigid::RigidTransform};

use crate::{
    correspondence::find_correspondences,
    error::RegistrationError,
    index::SpatialIndex,
    normal::{estimate_normals, DEFAULT_NEIGHBORS},
    solver::{solve_rigid_transform, xyz_curvature, FeatureMap},
};

/// Tunable parameters of the pairwise alignment loop.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentContext {
    /// Number of outer correspondence rounds.
    pub max_iterations: usize,
    /// Gauss-Newton iterations per correspondence round.
    pub solver_iterations: usize,
    /// Convergence threshold on the incremental transform.
    pub transformation_epsilon: f64,
    /// Starting correspondence rejection distance.
    pub max_correspondence_distance: f64,
    /// How much the rejection distance shrinks when progress stalls.
    pub correspondence_distance_decrement: f64,
    /// Floor below which the rejection distance never shrinks.
    pub min_correspondence_distance: f64,
    /// Neighborhood size for normal estimation.
    pub neighbors: usize,
    /// Per-channel weights over `(x, y, z, curvature)`.
    pub weights: [f64; 4],
    /// Feature layout used for the reported feature-space error.
    pub feature_map: FeatureMap,
}

impl Default for AlignmentContext {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            solver_iterations: 2,
            transformation_epsilon: 1e-6,
            max_correspondence_distance: 0.5,
            correspondence_distance_decrement: 0.01,
            min_correspondence_distance: 0.05,
            neighbors: DEFAULT_NEIGHBORS,
            weights: [1.0; 4],
            feature_map: xyz_curvature,
        }
    }
}

/// How a pairwise alignment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentStatus {
    /// The incremental transform stayed below the threshold for two
    /// consecutive rounds.
    Converged,
    /// Correspondences ran out or degenerated before convergence.
    Stalled,
    /// The iteration budget ran out first.
    MaxIterationsReached,
}

/// Per-round observation of the alignment loop.
#[derive(Debug, Clone, Copy)]
pub struct IterationSnapshot {
    /// Round counter, starting at zero.
    pub iteration: usize,
    /// Number of correspondences used this round.
    pub correspondences: usize,
    /// Rejection distance in effect this round.
    pub max_correspondence_distance: f64,
    /// Rotation angle between this round's increment and the previous one.
    pub rotation_delta: f64,
    /// Translation distance between this round's increment and the previous one.
    pub translation_delta: f64,
}

/// Result of aligning one scan pair.
#[derive(Debug, Clone)]
pub struct PairAlignment {
    /// Transform that carries the target cloud into the source frame.
    pub target_to_source: RigidTransform,
    /// The target cloud mapped into the source frame, with the source
    /// appended. Lives in the source frame.
    pub merged: PointCloud,
    /// How the loop ended.
    pub status: AlignmentStatus,
    /// Rounds actually run.
    pub iterations: usize,
}

/// Align a source scan against a target scan.
///
/// See [`align_pair_observed`] for the loop itself; this variant discards the
/// per-round snapshots.
pub fn align_pair(
    source: &PointCloud,
    target: &PointCloud,
    guess: Option<&RigidTransform>,
    context: &AlignmentContext,
) -> Result<PairAlignment, RegistrationError> {
    align_pair_observed(source, target, guess, context, |_| {})
}

/// Align a source scan against a target scan, reporting every round to
/// `observer`.
///
/// Both clouds get normals and curvatures estimated once up front. Each round
/// re-pairs the transformed source against the target by nearest neighbor,
/// runs a short Gauss-Newton solve, and folds the increment into the running
/// estimate. When the increment stops changing between rounds the rejection
/// distance shrinks, letting the loop refine on closer pairs; two consecutive
/// near-identity increments count as convergence.
///
/// The returned transform maps target-frame points into the source frame, and
/// the merged cloud is the target so mapped with the source appended.
pub fn align_pair_observed(
    source: &PointCloud,
    target: &PointCloud,
    guess: Option<&RigidTransform>,
    context: &AlignmentContext,
    mut observer: impl FnMut(&IterationSnapshot),
) -> Result<PairAlignment, RegistrationError> {
    if source.is_empty() || target.is_empty() {
        return Err(RegistrationError::EmptyPointCloud);
    }

    let source_features = estimate_normals(source, context.neighbors)?;
    let target_features = estimate_normals(target, context.neighbors)?;
    let target_index = SpatialIndex::build(target_features.points())?;

    let mut current = guess.copied().unwrap_or(RigidTransform::IDENTITY);
    let mut previous_increment = RigidTransform::IDENTITY;
    let mut max_distance = context.max_correspondence_distance;
    let mut transformed = vec![[0.0; 3]; source_features.len()];
    let mut status = AlignmentStatus::MaxIterationsReached;
    let mut identity_streak = 0;
    let mut iterations = 0;

    for iteration in 0..context.max_iterations {
        iterations = iteration + 1;

        transform_points(
            source_features.points(),
            &current.rotation,
            &current.translation,
            &mut transformed,
        );

        let correspondences = find_correspondences(
            &transformed,
            source_features.curvatures(),
            &target_features,
            &target_index,
            max_distance,
            &context.weights,
            context.feature_map,
        );
        if correspondences.is_empty() {
            log::warn!(
                "alignment stalled at round {}: no correspondences within {:.3}",
                iteration,
                max_distance
            );
            status = AlignmentStatus::Stalled;
            break;
        }

        let solved = match solve_rigid_transform(
            &correspondences,
            &transformed,
            target_features.points(),
            &context.weights,
            context.transformation_epsilon,
            context.solver_iterations,
        ) {
            Ok(solved) => solved,
            Err(RegistrationError::DegenerateCorrespondences { found }) => {
                log::warn!(
                    "alignment stalled at round {}: {} correspondences do not constrain the transform",
                    iteration,
                    found
                );
                status = AlignmentStatus::Stalled;
                break;
            }
            Err(e) => return Err(e),
        };
        let increment = solved.transform;
        current = increment.compose(&current);

        if log::log_enabled!(log::Level::Debug) {
            let sum_sq = correspondences
                .iter()
                .map(|c| c.distance * c.distance)
                .sum::<f64>();
            let rmse = (sum_sq / correspondences.len() as f64).sqrt();
            let feature_rmse = mean_feature_error(&correspondences);
            log::debug!(
                "round {}: {} pairs, rmse {:.6}, feature rmse {:.6}, rejection {:.3}",
                iteration,
                correspondences.len(),
                rmse,
                feature_rmse,
                max_distance
            );
        }

        let (rotation_delta, translation_delta) = increment.delta(&previous_increment);
        observer(&IterationSnapshot {
            iteration,
            correspondences: correspondences.len(),
            max_correspondence_distance: max_distance,
            rotation_delta,
            translation_delta,
        });

        // when the increment stops changing between rounds, refine on closer
        // pairs by tightening the rejection distance
        if rotation_delta < context.transformation_epsilon
            && translation_delta < context.transformation_epsilon
        {
            max_distance = (max_distance - context.correspondence_distance_decrement)
                .max(context.min_correspondence_distance);
        }
        previous_increment = increment;

        if increment.rotation_angle() < context.transformation_epsilon
            && increment.translation_norm() < context.transformation_epsilon
        {
            identity_streak += 1;
            if identity_streak >= 2 {
                status = AlignmentStatus::Converged;
                break;
            }
        } else {
            identity_streak = 0;
        }
    }

    let target_to_source = current.inverse();
    let mut mapped_target = vec![[0.0; 3]; target.len()];
    transform_points(
        target.points(),
        &target_to_source.rotation,
        &target_to_source.translation,
        &mut mapped_target,
    );
    let merged = PointCloud::new(mapped_target, None, None).concatenate(source);

    Ok(PairAlignment {
        target_to_source,
        merged,
        status,
        iterations,
    })
}

fn mean_feature_error(correspondences: &[crate::correspondence::Correspondence]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for c in correspondences {
        if let Some(d) = c.feature_distance {
            sum += d * d;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).sqrt()
}
