#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// I/O utilities for reading and writing scan data.
pub mod io;

/// Linear algebra utilities.
pub mod linalg;

/// Point cloud container.
pub mod pointcloud;

/// Planar sensor poses.
pub mod pose;

/// Rigid transforms.
pub mod rigid;

/// 3D transform helpers.
pub mod transforms;

/// Vector helpers.
pub mod vector;

/// Voxel grid downsampling.
pub mod voxel_grid;
