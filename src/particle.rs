use crate::units::C_LIGHT;
use crate::Vec3;

/// A photon history being tracked through the geometry.
#[derive(Debug, Clone)]
pub struct Photon {
    pub position: Vec3,
    pub direction: Vec3,
    pub energy: f64,
    pub weight: f64,
    /// Global time since emission
    pub time: f64,
    pub alive: bool,
}

impl Photon {
    pub fn new(position: Vec3, direction: Vec3, energy: f64, weight: f64) -> Self {
        Self {
            position,
            direction,
            energy,
            weight,
            time: 0.0,
            alive: true,
        }
    }

    /// Advance along the current direction at the speed of light.
    pub fn move_by(&mut self, distance: f64) {
        self.position += self.direction * distance;
        self.time += distance / C_LIGHT;
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photon_construction() {
        let p = Photon::new(Vec3::new(0.0, 1.0, 2.0), Vec3::new(1.0, 0.0, 0.0), 0.662, 0.5);
        assert_eq!(p.position, Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(p.direction, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p.energy, 0.662);
        assert_eq!(p.weight, 0.5);
        assert_eq!(p.time, 0.0);
        assert!(p.alive);
    }

    #[test]
    fn test_move_by_advances_time() {
        let mut p = Photon::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 1.0, 1.0);
        p.move_by(C_LIGHT);
        assert!((p.position.z - C_LIGHT).abs() < 1e-9);
        assert!((p.time - 1.0).abs() < 1e-12);
        p.kill();
        assert!(!p.alive);
    }
}
