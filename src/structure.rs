/// 3D coordinate vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another coordinate
    pub fn squared_distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Calculate Euclidean distance to another coordinate
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        self.squared_distance_to(other).sqrt()
    }
}

/// One docked conformation: atom coordinates in file order.
///
/// Position `i` in every pose of a file refers to the same atom.
pub type Pose = Vec<Coordinate>;

/// All poses extracted from one docking log, in file order
pub type PoseSet = Vec<Pose>;
