/// Error types for the registration module.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistrationError {
    /// The point cloud holds no points
    #[error("The point cloud holds no points")]
    EmptyPointCloud,

    /// Not enough neighbors to estimate a surface normal anywhere in the cloud
    #[error("Normal estimation needs at least {required} neighbors, found {found}")]
    InsufficientNeighbors {
        /// Minimum neighborhood size for a covariance fit.
        required: usize,
        /// Largest neighborhood available in the cloud.
        found: usize,
    },

    /// Too few correspondences to constrain a rigid transform
    #[error("Rigid solve needs at least 6 correspondences, found {found}")]
    DegenerateCorrespondences {
        /// Number of correspondences available.
        found: usize,
    },

    /// A registration sequence needs at least two scans
    #[error("Sequence registration needs at least 2 scans, found {0}")]
    EmptySequence(usize),
}
