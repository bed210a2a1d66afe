//! Sensitive detector: turns deposits on sensitive volumes into per-copy hits.

use crate::geometry::Touchable;
use crate::hit::{Hit, HitsMap};
use crate::Vec3;

/// One energy-depositing step inside a sensitive volume.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub edep: f64,
    /// Pre-step location in the geometry tree
    pub touchable: &'a Touchable,
    pub post_position: Vec3,
    pub global_time: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CcSensitiveDetector {
    name: String,
    collection: String,
    copy_depth: usize,
}

impl CcSensitiveDetector {
    pub fn new(name: &str, collection: &str, copy_depth: usize) -> Self {
        CcSensitiveDetector {
            name: name.to_string(),
            collection: collection.to_string(),
            copy_depth,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Touchable depth of the level whose copy number identifies the detector.
    pub fn copy_depth(&self) -> usize {
        self.copy_depth
    }

    /// Merge a step into the event's hits. Returns false for a zero deposit.
    pub fn process_hits(&self, step: &Step<'_>, hits: &mut HitsMap) -> bool {
        if step.edep == 0.0 {
            return false;
        }
        let copy_no = step.touchable.replica_number(self.copy_depth);
        hits.entry(copy_no)
            .and_modify(|hit| hit.add_dep_e_and_position(step.edep, &step.post_position))
            .or_insert_with(|| Hit::new(step.edep, step.post_position, step.global_time, step.weight));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Transform};
    use crate::solid::Solid;

    fn camera_like() -> Geometry {
        let mut g = Geometry::new();
        let world = g.add_logical("World", Solid::new_box(100.0, 100.0, 100.0), 0);
        let housing = g.add_logical("Housing", Solid::new_box(10.0, 10.0, 10.0), 0);
        let crystal = g.add_logical("Crystal", Solid::new_box(5.0, 5.0, 5.0), 0);
        g.place_world("World", world);
        g.place("Scatter", housing, world, Transform::from_translation(Vec3::new(0.0, 0.0, 20.0)), 0);
        g.place("Absorber", housing, world, Transform::from_translation(Vec3::new(0.0, 0.0, -20.0)), 1);
        g.place("Crystal", crystal, housing, Transform::identity(), 0);
        g
    }

    #[test]
    fn test_zero_deposit_creates_no_hit() {
        let g = camera_like();
        let touchable = g.locate(&Vec3::new(0.0, 0.0, 20.0)).unwrap();
        let sd = CcSensitiveDetector::new("LACC", "CCData", 1);
        let mut hits = HitsMap::new();
        let step = Step {
            edep: 0.0,
            touchable: &touchable,
            post_position: Vec3::new(0.0, 0.0, 20.0),
            global_time: 1.0,
            weight: 1.0,
        };
        assert!(!sd.process_hits(&step, &mut hits));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_hits_keyed_by_copy_at_depth() {
        let g = camera_like();
        let sd = CcSensitiveDetector::new("LACC", "CCData", 1);
        let mut hits = HitsMap::new();

        let deposits = [
            (Vec3::new(1.0, 0.0, -20.0), 0.3, 2.0),
            (Vec3::new(0.0, 0.0, 20.0), 1.0, 1.0),
            (Vec3::new(4.0, 0.0, 20.0), 3.0, 1.5),
        ];
        for (point, edep, time) in deposits {
            let touchable = g.locate(&point).unwrap();
            let step = Step {
                edep,
                touchable: &touchable,
                post_position: point,
                global_time: time,
                weight: 0.5,
            };
            assert!(sd.process_hits(&step, &mut hits));
        }

        let keys: Vec<i32> = hits.keys().copied().collect();
        assert_eq!(keys, vec![0, 1]);
        let scatter = hits[&0];
        assert!((scatter.edep - 4.0).abs() < 1e-12);
        assert!((scatter.position - Vec3::new(3.0, 0.0, 20.0)).norm() < 1e-12);
        assert_eq!(scatter.time, 1.0);
        assert_eq!(hits[&1].weight, 0.5);
    }
}
