#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::RegistrationError;

/// Incremental alignment loop.
pub mod align;
pub use align::{
    align_pair, align_pair_observed, AlignmentContext, AlignmentStatus, IterationSnapshot,
    PairAlignment,
};

/// Nearest-neighbor correspondence search.
pub mod correspondence;
pub use correspondence::{find_correspondences, Correspondence};

/// Immutable spatial index over a point set.
pub mod index;
pub use index::SpatialIndex;

/// Surface normal and curvature estimation.
pub mod normal;
pub use normal::estimate_normals;

/// Sequence registration and global transform composition.
pub mod pipeline;
pub use pipeline::{register_sequence, PairOutcome, RegisteredPair, Scan};

/// Pose-seeded initial alignment guess.
pub mod seed;
pub use seed::pose_seeded_guess;

/// Weighted rigid transform solver.
pub mod solver;
pub use solver::{solve_rigid_transform, xyz_curvature, FeatureMap, SolveResult};
