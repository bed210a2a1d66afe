use crate::Vec3;
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Energy deposited in one detector copy during one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Total deposited energy (MeV)
    pub edep: f64,
    /// Energy-weighted mean position of the deposits (mm)
    pub position: Vec3,
    /// Global time of the first deposit (ns)
    pub time: f64,
    /// Weight of the primary that produced the event
    pub weight: f64,
}

impl Hit {
    pub fn new(edep: f64, position: Vec3, time: f64, weight: f64) -> Self {
        Hit {
            edep,
            position,
            time,
            weight,
        }
    }

    /// Fold a further deposit into the hit, moving the position to the
    /// energy-weighted centroid.
    pub fn add_dep_e_and_position(&mut self, edep: f64, position: &Vec3) {
        let total = self.edep + edep;
        if total <= 0.0 {
            return;
        }
        self.position = (self.position * self.edep + position * edep) / total;
        self.edep = total;
    }
}

impl AddAssign<&Hit> for Hit {
    fn add_assign(&mut self, other: &Hit) {
        self.add_dep_e_and_position(other.edep, &other.position);
    }
}

/// Hits of one event keyed by detector copy number, ascending.
pub type HitsMap = BTreeMap<i32, Hit>;
