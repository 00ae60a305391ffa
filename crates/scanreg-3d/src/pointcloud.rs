/// A point cloud with points and optional per-point normals and curvatures.
///
/// Clouds are never mutated in place; every pipeline stage that changes the
/// geometry produces a new cloud.
#[derive(Debug, Clone)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The unit surface normals of the points.
    normals: Option<Vec<[f64; 3]>>,
    // The surface flatness of each point in [0, 1].
    curvatures: Option<Vec<f64>>,
}

impl PointCloud {
    /// Create a new point cloud from points, normals (optional), and curvatures (optional).
    pub fn new(
        points: Vec<[f64; 3]>,
        normals: Option<Vec<[f64; 3]>>,
        curvatures: Option<Vec<f64>>,
    ) -> Self {
        Self {
            points,
            normals,
            curvatures,
        }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the normals of the points in the point cloud.
    pub fn normals(&self) -> Option<&[[f64; 3]]> {
        self.normals.as_deref()
    }

    /// Get as reference the curvatures of the points in the point cloud.
    pub fn curvatures(&self) -> Option<&[f64]> {
        self.curvatures.as_deref()
    }

    /// Create a new cloud with the points of `other` appended to the points of `self`.
    ///
    /// Normals and curvatures are carried over only when both clouds have them,
    /// otherwise the merged cloud drops the channel.
    pub fn concatenate(&self, other: &PointCloud) -> PointCloud {
        let mut points = Vec::with_capacity(self.len() + other.len());
        points.extend_from_slice(&self.points);
        points.extend_from_slice(&other.points);

        let normals = match (&self.normals, &other.normals) {
            (Some(a), Some(b)) => {
                let mut n = Vec::with_capacity(a.len() + b.len());
                n.extend_from_slice(a);
                n.extend_from_slice(b);
                Some(n)
            }
            _ => None,
        };

        let curvatures = match (&self.curvatures, &other.curvatures) {
            (Some(a), Some(b)) => {
                let mut c = Vec::with_capacity(a.len() + b.len());
                c.extend_from_slice(a);
                c.extend_from_slice(b);
                Some(c)
            }
            _ => None,
        };

        PointCloud::new(points, normals, curvatures)
    }

    /// Create a new cloud without points that contain NaN or infinite coordinates.
    ///
    /// Normals and curvatures stay aligned with the surviving points.
    pub fn without_non_finite(&self) -> PointCloud {
        let keep = self
            .points
            .iter()
            .map(|p| p.iter().all(|v| v.is_finite()))
            .collect::<Vec<_>>();

        let points = self
            .points
            .iter()
            .zip(keep.iter())
            .filter(|(_, k)| **k)
            .map(|(p, _)| *p)
            .collect::<Vec<_>>();

        let normals = self.normals.as_ref().map(|normals| {
            normals
                .iter()
                .zip(keep.iter())
                .filter(|(_, k)| **k)
                .map(|(n, _)| *n)
                .collect()
        });

        let curvatures = self.curvatures.as_ref().map(|curvatures| {
            curvatures
                .iter()
                .zip(keep.iter())
                .filter(|(_, k)| **k)
                .map(|(c, _)| *c)
                .collect()
        });

        PointCloud::new(points, normals, curvatures)
    }
}
