/// Simple 3D vector with x, y, and z coordinates as double precision floats.
#[derive(Debug, Clone, Copy, Default)]
pub struct DVec3 {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
    /// z coordinate
    pub z: f64,
}

impl DVec3 {
    /// Create a new DVec3 from an array of 3 f64 values.
    pub fn from_array(array: &[f64; 3]) -> Self {
        Self {
            x: array[0],
            y: array[1],
            z: array[2],
        }
    }

    /// Convert the vector back to an array of 3 f64 values.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Add another vector to this one in place.
    pub fn add_assign(&mut self, other: &DVec3) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }

    /// Scale the vector by a scalar.
    pub fn scaled(self, s: f64) -> DVec3 {
        DVec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dvec3_from_array() {
        let vec = DVec3::from_array(&[1.0, 2.0, 3.0]);
        assert_eq!(vec.x, 1.0);
        assert_eq!(vec.y, 2.0);
        assert_eq!(vec.z, 3.0);
        assert_eq!(vec.to_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_dvec3_accumulate() {
        let mut acc = DVec3::default();
        acc.add_assign(&DVec3::from_array(&[1.0, 2.0, 3.0]));
        acc.add_assign(&DVec3::from_array(&[3.0, 2.0, 1.0]));
        assert_eq!(acc.scaled(0.5).to_array(), [2.0, 2.0, 2.0]);
    }
}
