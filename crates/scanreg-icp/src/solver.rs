use scanreg_3d::{rigid::RigidTransform, transforms::axis_angle_to_rotation_matrix};

use crate::{correspondence::Correspondence, error::RegistrationError};

/// Map a point and its curvature into the 4d feature space used for matching.
pub type FeatureMap = fn(&[f64; 3], f64) -> [f64; 4];

/// The default feature layout, `(x, y, z, curvature)`.
pub fn xyz_curvature(point: &[f64; 3], curvature: f64) -> [f64; 4] {
    [point[0], point[1], point[2], curvature]
}

/// Minimum correspondence count to constrain the six degrees of freedom.
pub const MIN_CORRESPONDENCES: usize = 6;

/// Outcome of a rigid solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveResult {
    /// The estimated source-to-target transform.
    pub transform: RigidTransform,
    /// Norm of the last Gauss-Newton update step.
    pub last_step: f64,
    /// Number of iterations actually run.
    pub iterations: usize,
}

/// Estimate the rigid transform that maps the matched source points onto
/// their target counterparts.
///
/// Minimizes the weighted point-to-point error with Gauss-Newton, linearizing
/// the rotation as a small axis-angle update each iteration. The per-axis
/// weights scale the x, y, and z residuals; the fourth weight belongs to the
/// curvature channel, which is invariant under rigid motion and therefore does
/// not enter the update.
///
/// Returns [`RegistrationError::DegenerateCorrespondences`] when fewer than
/// [`MIN_CORRESPONDENCES`] pairs are given or the normal equations are
/// rank-deficient.
pub fn solve_rigid_transform(
    correspondences: &[Correspondence],
    source_points: &[[f64; 3]],
    target_points: &[[f64; 3]],
    weights: &[f64; 4],
    epsilon: f64,
    max_iterations: usize,
) -> Result<SolveResult, RegistrationError> {
    if correspondences.len() < MIN_CORRESPONDENCES {
        return Err(RegistrationError::DegenerateCorrespondences {
            found: correspondences.len(),
        });
    }

    let mut transform = RigidTransform::IDENTITY;
    let mut last_step = 0.0;
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;

        let mut hessian = [[0.0; 6]; 6];
        let mut gradient = [0.0; 6];

        for correspondence in correspondences {
            let p = transform.transform_point(&source_points[correspondence.source]);
            let q = target_points[correspondence.target];

            let residual = [
                weights[0] * (p[0] - q[0]),
                weights[1] * (p[1] - q[1]),
                weights[2] * (p[2] - q[2]),
            ];

            // rows of the Jacobian of the residual w.r.t. (rx, ry, rz, tx, ty, tz)
            let jacobian = [
                [
                    0.0,
                    weights[0] * p[2],
                    -weights[0] * p[1],
                    weights[0],
                    0.0,
                    0.0,
                ],
                [
                    -weights[1] * p[2],
                    0.0,
                    weights[1] * p[0],
                    0.0,
                    weights[1],
                    0.0,
                ],
                [
                    weights[2] * p[1],
                    -weights[2] * p[0],
                    0.0,
                    0.0,
                    0.0,
                    weights[2],
                ],
            ];

            for (row, r) in jacobian.iter().zip(residual.iter()) {
                for i in 0..6 {
                    gradient[i] += row[i] * r;
                    for j in 0..6 {
                        hessian[i][j] += row[i] * row[j];
                    }
                }
            }
        }

        let mut rhs = [0.0; 6];
        for (v, g) in rhs.iter_mut().zip(gradient.iter()) {
            *v = -g;
        }
        let delta = solve_cholesky6(&hessian, &rhs).ok_or(
            RegistrationError::DegenerateCorrespondences {
                found: correspondences.len(),
            },
        )?;

        let step = step_transform(&delta);
        transform = step.compose(&transform);

        last_step = delta.iter().map(|v| v * v).sum::<f64>().sqrt();
        if last_step < epsilon {
            break;
        }
    }

    Ok(SolveResult {
        transform,
        last_step,
        iterations,
    })
}

/// Turn a small update vector `(rx, ry, rz, tx, ty, tz)` into a transform.
fn step_transform(delta: &[f64; 6]) -> RigidTransform {
    let axis = [delta[0], delta[1], delta[2]];
    let angle = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    let translation = [delta[3], delta[4], delta[5]];

    if angle < 1e-12 {
        return RigidTransform::new(RigidTransform::IDENTITY.rotation, translation);
    }
    match axis_angle_to_rotation_matrix(&axis, angle) {
        Ok(rotation) => RigidTransform::new(rotation, translation),
        Err(_) => RigidTransform::new(RigidTransform::IDENTITY.rotation, translation),
    }
}

/// Solve the symmetric positive definite system `A x = b` in place.
///
/// Returns `None` when a pivot collapses, which means the correspondences do
/// not constrain all six degrees of freedom.
fn solve_cholesky6(a: &[[f64; 6]; 6], b: &[f64; 6]) -> Option<[f64; 6]> {
    let mut l = [[0.0; 6]; 6];
    for i in 0..6 {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 1e-12 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // forward substitution L y = b
    let mut y = [0.0; 6];
    for i in 0..6 {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i][k] * y[k];
        }
        y[i] = sum / l[i][i];
    }

    // back substitution L^T x = y
    let mut x = [0.0; 6];
    for i in (0..6).rev() {
        let mut sum = y[i];
        for k in (i + 1)..6 {
            sum -= l[k][i] * x[k];
        }
        x[i] = sum / l[i][i];
    }
    Some(x)
}
