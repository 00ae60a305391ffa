use scanreg_3d::{pointcloud::PointCloud, pose::Pose2d, rigid::RigidTransform};
use scanreg_icp::{
    align_pair, register_sequence, AlignmentContext, AlignmentStatus, PairOutcome,
    RegistrationError, Scan,
};

/// A wavy sheet with structure along every axis so a rigid fit is fully
/// constrained.
fn sheet(n: usize, spacing: f64) -> PointCloud {
    let mut points = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let x = i as f64 * spacing;
            let y = j as f64 * spacing;
            let z = 0.3 * (x * 1.7).sin() + 0.2 * (y * 2.3).cos();
            points.push([x, y, z]);
        }
    }
    PointCloud::new(points, None, None)
}

fn transformed(cloud: &PointCloud, transform: &RigidTransform) -> PointCloud {
    let points = cloud
        .points()
        .iter()
        .map(|p| transform.transform_point(p))
        .collect();
    PointCloud::new(points, None, None)
}

#[test]
fn self_alignment_is_the_identity() -> Result<(), RegistrationError> {
    let cloud = sheet(14, 0.25);
    let alignment = align_pair(&cloud, &cloud, None, &AlignmentContext::default())?;

    assert_eq!(alignment.status, AlignmentStatus::Converged);
    assert!(alignment.target_to_source.rotation_angle() < 1e-6);
    assert!(alignment.target_to_source.translation_norm() < 1e-6);
    Ok(())
}

#[test]
fn swapping_the_pair_inverts_the_transform() -> Result<(), RegistrationError> {
    let target = sheet(14, 0.25);
    let truth = RigidTransform::new(RigidTransform::IDENTITY.rotation, [0.06, -0.04, 0.02]);
    let source = transformed(&target, &truth);

    let context = AlignmentContext::default();
    let forward = align_pair(&source, &target, None, &context)?;
    let backward = align_pair(&target, &source, None, &context)?;

    let roundtrip = forward
        .target_to_source
        .compose(&backward.target_to_source);
    assert!(roundtrip.rotation_angle() < 1e-2);
    assert!(roundtrip.translation_norm() < 1e-2);
    Ok(())
}

#[test]
fn pose_seed_recovers_a_large_offset() -> Result<(), RegistrationError> {
    let target = sheet(14, 0.25);
    // well beyond the cloud extent, so no blind pair falls inside the
    // rejection distance
    let truth = RigidTransform::new(RigidTransform::IDENTITY.rotation, [5.0, 0.0, 0.0]);
    let source = transformed(&target, &truth);

    let context = AlignmentContext::default();

    // without a seed the loop cannot find any pairs
    let blind = align_pair(&source, &target, None, &context)?;
    assert_eq!(blind.status, AlignmentStatus::Stalled);

    // the odometry poses put the clouds within range
    let seeded = align_pair(&source, &target, Some(&truth.inverse()), &context)?;
    let (rot_delta, trans_delta) = seeded.target_to_source.delta(&truth);
    assert!(rot_delta < 1e-2, "rotation off by {rot_delta}");
    assert!(trans_delta < 1e-2, "translation off by {trans_delta}");
    Ok(())
}

#[test]
fn degenerate_input_reports_an_error() {
    let context = AlignmentContext::default();
    let empty = PointCloud::new(vec![], None, None);
    let tiny = PointCloud::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], None, None);

    assert!(matches!(
        align_pair(&empty, &empty, None, &context),
        Err(RegistrationError::EmptyPointCloud)
    ));
    assert!(matches!(
        align_pair(&tiny, &tiny, None, &context),
        Err(RegistrationError::InsufficientNeighbors { .. })
    ));
}

#[test]
fn sequence_chains_pairwise_transforms() -> Result<(), RegistrationError> {
    // three scans of the same scene, the sensor stepping 0.2 m along x each
    // time; in sensor frames the scene appears to step by -0.2 m. The grid
    // spacing stays above twice the step so nearest neighbors are unambiguous.
    let scene = sheet(16, 0.5);
    let step = RigidTransform::new(RigidTransform::IDENTITY.rotation, [-0.2, 0.0, 0.0]);

    let scan0 = scene.clone();
    let scan1 = transformed(&scene, &step);
    let scan2 = transformed(&scan1, &step);

    let scans = [
        Scan {
            name: "scan000".into(),
            cloud: scan0,
            pose: None,
        },
        Scan {
            name: "scan001".into(),
            cloud: scan1,
            pose: None,
        },
        Scan {
            name: "scan002".into(),
            cloud: scan2,
            pose: None,
        },
    ];

    let registered = register_sequence(&scans, &AlignmentContext::default())?;
    assert_eq!(registered.len(), 2);
    for pair in &registered {
        assert!(matches!(pair.outcome, PairOutcome::Aligned(_)));
    }

    // scan1 = step(scan0), so the target-to-source chain accumulates the
    // inverse step each pair
    let g1 = registered[0].global_transform;
    assert!(g1.rotation_angle() < 1e-2);
    assert!((g1.translation[0] - 0.2).abs() < 1e-2, "g1 = {:?}", g1.translation);

    let g2 = registered[1].global_transform;
    assert!(g2.rotation_angle() < 1e-2);
    assert!((g2.translation[0] - 0.4).abs() < 1e-2, "g2 = {:?}", g2.translation);

    // every merged cloud is reported in the frame of the first scan
    assert_eq!(registered[0].cloud.len(), scene.len() * 2);
    assert_eq!(registered[1].cloud.len(), scene.len() * 2);
    Ok(())
}

#[test]
fn recovers_a_rotation_and_translation() -> Result<(), RegistrationError> {
    let target = sheet(14, 0.25);
    let angle = 10_f64.to_radians();
    let rotation = scanreg_3d::transforms::axis_angle_to_rotation_matrix(&[0.0, 0.0, 1.0], angle)
        .expect("valid axis");
    let truth = RigidTransform::new(rotation, [0.1, 0.0, 0.0]);
    let source = transformed(&target, &truth);

    let alignment = align_pair(&source, &target, None, &AlignmentContext::default())?;

    let (rot_delta, trans_delta) = alignment.target_to_source.delta(&truth);
    assert!(rot_delta < 1e-3, "rotation off by {rot_delta}");
    assert!(trans_delta < 1e-3, "translation off by {trans_delta}");
    Ok(())
}

#[test]
fn global_transform_is_the_chain_of_pair_transforms() -> Result<(), RegistrationError> {
    let scene = sheet(16, 0.5);
    let step = RigidTransform::new(RigidTransform::IDENTITY.rotation, [-0.2, 0.0, 0.0]);

    let scan1 = transformed(&scene, &step);
    let scan2 = transformed(&scan1, &step);
    let scans = [
        Scan {
            name: "scan000".into(),
            cloud: scene,
            pose: None,
        },
        Scan {
            name: "scan001".into(),
            cloud: scan1,
            pose: None,
        },
        Scan {
            name: "scan002".into(),
            cloud: scan2,
            pose: None,
        },
    ];

    let registered = register_sequence(&scans, &AlignmentContext::default())?;
    assert_eq!(registered.len(), 2);

    // the chain is exactly the running composition of the pair transforms
    let mut expected = RigidTransform::IDENTITY;
    for pair in &registered {
        expected = expected.compose(&pair.pair_transform);
        assert_eq!(pair.global_transform.to_matrix4(), expected.to_matrix4());
    }
    Ok(())
}

#[test]
fn poses_seed_the_sequence_guess() -> Result<(), RegistrationError> {
    let scene = sheet(14, 0.25);
    // sensor moves 1.5 m along world x between scans, far beyond the
    // correspondence rejection distance
    let step = RigidTransform::new(RigidTransform::IDENTITY.rotation, [-1.5, 0.0, 0.0]);
    let moved = transformed(&scene, &step);

    let scans = [
        Scan {
            name: "scan000".into(),
            cloud: scene.clone(),
            pose: Some(Pose2d::new(0.0, 0.0, 0.0)),
        },
        Scan {
            name: "scan001".into(),
            cloud: moved,
            pose: Some(Pose2d::new(1.5, 0.0, 0.0)),
        },
    ];

    let registered = register_sequence(&scans, &AlignmentContext::default())?;
    assert_eq!(registered.len(), 1);
    assert!(matches!(
        registered[0].outcome,
        PairOutcome::Aligned(AlignmentStatus::Converged | AlignmentStatus::MaxIterationsReached)
    ));
    let g = registered[0].global_transform;
    assert!((g.translation[0] - 1.5).abs() < 1e-2, "g = {:?}", g.translation);
    Ok(())
}
