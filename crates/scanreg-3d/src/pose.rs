/// An approximate planar sensor pose, supplied externally as a read-only hint.
///
/// The heading unit is whatever the producing source used; callers convert to
/// radians before seeding an alignment with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2d {
    /// x position.
    pub x: f64,
    /// y position.
    pub y: f64,
    /// Heading about the z axis.
    pub heading: f64,
}

impl Pose2d {
    /// Create a new planar pose.
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// The same pose with the heading converted from degrees to radians.
    pub fn heading_to_radians(&self) -> Pose2d {
        Pose2d::new(self.x, self.y, self.heading.to_radians())
    }
}
