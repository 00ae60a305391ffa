/// Binary PCD reading and writing.
pub mod pcd;

/// Planar pose file reading.
pub mod pose;
