use scanreg_3d::{pose::Pose2d, rigid::RigidTransform};

/// Build an initial source-to-target guess from the planar odometry poses of
/// the two scans.
///
/// Each pose spans a planar basis in the world frame from its heading; the
/// guess is the change of basis from the source frame to the target frame
/// plus the projected world offset between the two positions. Headings are
/// expected in radians here.
///
/// Returns the identity when either pose is missing, which leaves the aligner
/// to start from scratch.
pub fn pose_seeded_guess(source: Option<&Pose2d>, target: Option<&Pose2d>) -> RigidTransform {
    let (source, target) = match (source, target) {
        (Some(s), Some(t)) => (s, t),
        _ => return RigidTransform::IDENTITY,
    };

    let basis_src = planar_basis(source.heading);
    let basis_tgt = planar_basis(target.heading);

    let mut rotation = [[0.0; 3]; 3];
    for (i, row) in rotation.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = dot(&basis_tgt[i], &basis_src[j]);
        }
    }

    let offset_world = [source.x - target.x, source.y - target.y, 0.0];
    let mut translation = [0.0; 3];
    for (i, t) in translation.iter_mut().enumerate() {
        *t = dot(&basis_tgt[i], &offset_world);
    }

    RigidTransform::new(rotation, translation)
}

/// Right-handed world-frame basis of a planar pose with the given heading.
fn planar_basis(heading: f64) -> [[f64; 3]; 3] {
    let (sin, cos) = heading.sin_cos();
    [
        [cos, sin, 0.0],
        [-sin, cos, 0.0],
        [0.0, 0.0, 1.0],
    ]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn missing_pose_falls_back_to_identity() {
        let pose = Pose2d::new(1.0, 2.0, 0.5);
        assert_eq!(pose_seeded_guess(None, None), RigidTransform::IDENTITY);
        assert_eq!(
            pose_seeded_guess(Some(&pose), None),
            RigidTransform::IDENTITY
        );
        assert_eq!(
            pose_seeded_guess(None, Some(&pose)),
            RigidTransform::IDENTITY
        );
    }

    #[test]
    fn equal_poses_give_identity() {
        let pose = Pose2d::new(3.0, -1.0, 0.7);
        let guess = pose_seeded_guess(Some(&pose), Some(&pose));
        assert!(guess.rotation_angle() < 1e-12);
        assert!(guess.translation_norm() < 1e-12);
    }

    #[test]
    fn pure_offset_with_zero_headings() {
        let source = Pose2d::new(2.0, 1.0, 0.0);
        let target = Pose2d::new(0.5, 1.0, 0.0);
        let guess = pose_seeded_guess(Some(&source), Some(&target));
        assert!(guess.rotation_angle() < 1e-12);
        assert_relative_eq!(guess.translation[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(guess.translation[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(guess.translation[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn guess_maps_source_origin_to_target_frame() {
        // a point at the source pose's position must land at the target
        // frame's view of that world position
        let source = Pose2d::new(1.0, 0.0, std::f64::consts::FRAC_PI_2);
        let target = Pose2d::new(0.0, 0.0, 0.0);
        let guess = pose_seeded_guess(Some(&source), Some(&target));

        let mapped = guess.transform_point(&[0.0, 0.0, 0.0]);
        assert_relative_eq!(mapped[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(mapped[1], 0.0, epsilon = 1e-12);

        assert_relative_eq!(
            guess.rotation_angle(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
    }
}
