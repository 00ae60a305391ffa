use scanreg_3d::{
    linalg::transform_points, pointcloud::PointCloud, pose::Pose2d, rigid::RigidTransform,
};

use crate::{
    align::{align_pair, AlignmentContext, AlignmentStatus},
    error::RegistrationError,
    seed::pose_seeded_guess,
};

/// One input scan with an optional odometry pose.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Display name, used in logs and output file names.
    pub name: String,
    /// The scan's point cloud in its own frame.
    pub cloud: PointCloud,
    /// Planar odometry pose with the heading in radians, when available.
    pub pose: Option<Pose2d>,
}

/// How a scan pair fared during sequence registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// The pair aligned; carries how the loop ended.
    Aligned(AlignmentStatus),
    /// The pair was skipped after an alignment error.
    Skipped,
}

/// Output of one registered scan pair.
#[derive(Debug, Clone)]
pub struct RegisteredPair {
    /// Index of the newer scan of the pair in the input sequence.
    pub scan_index: usize,
    /// Name of the newer scan.
    pub name: String,
    /// How the pair fared.
    pub outcome: PairOutcome,
    /// This pair's own target-to-source transform. Identity for a skipped
    /// pair.
    pub pair_transform: RigidTransform,
    /// Accumulated transform from this pair's source frame into the frame of
    /// the first scan.
    pub global_transform: RigidTransform,
    /// The pair's merged cloud mapped into the frame of the first scan.
    /// Empty for a skipped pair.
    pub cloud: PointCloud,
}

/// Register a sequence of scans pairwise, accumulating each pairwise result
/// into a transform chain anchored at the first scan.
///
/// Scan `i` is aligned against scan `i-1` as source-against-target with scan
/// `i` as the target. Each pair's merged cloud lives in the frame of scan
/// `i-1`, so the accumulated transform of that frame carries it into the
/// frame of scan `0`; the chain then extends by the pair's own
/// target-to-source transform. A pair that fails to align is reported as
/// skipped and leaves the chain unchanged.
pub fn register_sequence(
    scans: &[Scan],
    context: &AlignmentContext,
) -> Result<Vec<RegisteredPair>, RegistrationError> {
    if scans.len() < 2 {
        return Err(RegistrationError::EmptySequence(scans.len()));
    }

    let mut global = RigidTransform::IDENTITY;
    let mut registered = Vec::with_capacity(scans.len() - 1);

    for (index, window) in scans.windows(2).enumerate() {
        let (source, target) = (&window[0], &window[1]);
        log::info!(
            "aligning {} against {} ({} and {} points)",
            target.name,
            source.name,
            target.cloud.len(),
            source.cloud.len()
        );

        let guess = pose_seeded_guess(source.pose.as_ref(), target.pose.as_ref());

        match align_pair(&source.cloud, &target.cloud, Some(&guess), context) {
            Ok(alignment) => {
                // the merged cloud is in the source frame; the current chain
                // maps that frame into the frame of scan 0
                let mut mapped = vec![[0.0; 3]; alignment.merged.len()];
                transform_points(
                    alignment.merged.points(),
                    &global.rotation,
                    &global.translation,
                    &mut mapped,
                );

                global = global.compose(&alignment.target_to_source);
                registered.push(RegisteredPair {
                    scan_index: index + 1,
                    name: target.name.clone(),
                    outcome: PairOutcome::Aligned(alignment.status),
                    pair_transform: alignment.target_to_source,
                    global_transform: global,
                    cloud: PointCloud::new(mapped, None, None),
                });
            }
            Err(e) => {
                log::warn!("skipping pair {} / {}: {}", source.name, target.name, e);
                registered.push(RegisteredPair {
                    scan_index: index + 1,
                    name: target.name.clone(),
                    outcome: PairOutcome::Skipped,
                    pair_transform: RigidTransform::IDENTITY,
                    global_transform: global,
                    cloud: PointCloud::new(vec![], None, None),
                });
            }
        }
    }

    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(name: &str, cloud: PointCloud) -> Scan {
        Scan {
            name: name.to_string(),
            cloud,
            pose: None,
        }
    }

    fn sheet(n: usize, spacing: f64) -> Vec<[f64; 3]> {
        let mut points = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let x = i as f64 * spacing;
                let y = j as f64 * spacing;
                let z = 0.3 * (x * 1.7).sin() + 0.2 * (y * 2.3).cos();
                points.push([x, y, z]);
            }
        }
        points
    }

    #[test]
    fn too_few_scans_is_an_error() {
        let context = AlignmentContext::default();
        assert!(matches!(
            register_sequence(&[], &context),
            Err(RegistrationError::EmptySequence(0))
        ));
        let one = scan("scan000", PointCloud::new(sheet(6, 0.3), None, None));
        assert!(matches!(
            register_sequence(&[one], &context),
            Err(RegistrationError::EmptySequence(1))
        ));
    }

    #[test]
    fn unalignable_pair_is_skipped_without_breaking_the_chain() {
        let context = AlignmentContext::default();
        let good = PointCloud::new(sheet(8, 0.3), None, None);
        let empty = PointCloud::new(vec![], None, None);

        let scans = [
            scan("scan000", good.clone()),
            scan("scan001", empty),
            scan("scan002", good),
        ];
        let registered = register_sequence(&scans, &context).expect("two pairs");
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0].outcome, PairOutcome::Skipped);
        assert!(registered[0].cloud.is_empty());
        assert_eq!(
            registered[0].global_transform.to_matrix4(),
            RigidTransform::IDENTITY.to_matrix4()
        );
    }

    #[test]
    fn identical_scans_keep_the_chain_at_identity() {
        let context = AlignmentContext::default();
        let cloud = PointCloud::new(sheet(10, 0.3), None, None);
        let scans = [
            scan("scan000", cloud.clone()),
            scan("scan001", cloud.clone()),
            scan("scan002", cloud),
        ];
        let registered = register_sequence(&scans, &context).expect("two pairs");
        for pair in &registered {
            assert!(matches!(pair.outcome, PairOutcome::Aligned(_)));
            assert!(pair.global_transform.rotation_angle() < 1e-5);
            assert!(pair.global_transform.translation_norm() < 1e-5);
        }
    }
}
