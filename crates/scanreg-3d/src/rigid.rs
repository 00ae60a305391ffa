use crate::linalg::matmul33;

/// A rigid transform as a rotation matrix plus a translation vector.
///
/// The rotation block must stay orthonormal with determinant close to +1;
/// a violation indicates a solver bug, not valid output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Row-major rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Translation vector.
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0, 0.0, 0.0],
    };

    /// Create a new rigid transform from a rotation matrix and translation vector.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Compose two transforms; `a.compose(&b)` applies `b` first, then `a`.
    pub fn compose(&self, rhs: &RigidTransform) -> RigidTransform {
        let rotation = matmul33(&self.rotation, &rhs.rotation);
        let mut translation = self.translation;
        for (i, t) in translation.iter_mut().enumerate() {
            *t += self.rotation[i][0] * rhs.translation[0]
                + self.rotation[i][1] * rhs.translation[1]
                + self.rotation[i][2] * rhs.translation[2];
        }
        RigidTransform::new(rotation, translation)
    }

    /// Invert the transform; `R' = R^T`, `t' = -R^T t`.
    pub fn inverse(&self) -> RigidTransform {
        let mut rotation = [[0.0; 3]; 3];
        for (i, row) in rotation.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val = self.rotation[j][i];
            }
        }
        let mut translation = [0.0; 3];
        for (i, t) in translation.iter_mut().enumerate() {
            *t = -(rotation[i][0] * self.translation[0]
                + rotation[i][1] * self.translation[1]
                + rotation[i][2] * self.translation[2]);
        }
        RigidTransform::new(rotation, translation)
    }

    /// Apply the transform to a single point.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let mut out = self.translation;
        for (i, v) in out.iter_mut().enumerate() {
            *v += self.rotation[i][0] * point[0]
                + self.rotation[i][1] * point[1]
                + self.rotation[i][2] * point[2];
        }
        out
    }

    /// The homogeneous 4x4 matrix view of the transform.
    pub fn to_matrix4(&self) -> [[f64; 4]; 4] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            [r[0][0], r[0][1], r[0][2], t[0]],
            [r[1][0], r[1][1], r[1][2], t[1]],
            [r[2][0], r[2][1], r[2][2], t[2]],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    /// Geodesic angle of the rotation block, i.e. its distance from identity.
    pub fn rotation_angle(&self) -> f64 {
        let trace = self.rotation[0][0] + self.rotation[1][1] + self.rotation[2][2];
        ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos()
    }

    /// Euclidean norm of the translation vector.
    pub fn translation_norm(&self) -> f64 {
        self.translation.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Rotation angle and translation distance between two transforms.
    ///
    /// Rotation and translation are measured separately so callers can apply
    /// independent convergence thresholds to each.
    pub fn delta(&self, other: &RigidTransform) -> (f64, f64) {
        let relative = self.compose(&other.inverse());
        let translation_delta = self
            .translation
            .iter()
            .zip(other.translation.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        (relative.rotation_angle(), translation_delta)
    }

    /// Check the rotation block for orthonormality within `tolerance`.
    pub fn is_rotation_orthonormal(&self, tolerance: f64) -> bool {
        let rt_r = matmul33(&self.inverse().rotation, &self.rotation);
        for (i, row) in rt_r.iter().enumerate() {
            for (j, val) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                if (val - expected).abs() > tolerance {
                    return false;
                }
            }
        }
        let det = determinant33(&self.rotation);
        (det - 1.0).abs() <= tolerance
    }
}

fn determinant33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}
