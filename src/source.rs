//! Primary photon source: a uniform point in an active fuel rod pellet.

use crate::assembly::SpentFuelAssembly;
use crate::bounding_box::BoundingBox;
use crate::geometry::{Geometry, Transform};
use crate::particle::Photon;
use crate::stats::AngularDistribution;
use crate::units::{M, MEV};
use crate::Vec3;
use nalgebra::Rotation3;
use rand::Rng;

/// Rod height at which the primary weight is 1.
pub const REFERENCE_HEIGHT: f64 = 4.0 * M;
pub const DEFAULT_ENERGY: f64 = 0.662 * MEV;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DirectionMode {
    #[default]
    Isotropic,
    /// Restrict emission to the cone enclosing a named placement's bounding box.
    TowardVolume { name: String, margin: f64 },
}

/// World-frame origin and bounding box of a placement used as emission target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetVolume {
    pub origin: Vec3,
    pub bounds: BoundingBox,
}

impl TargetVolume {
    /// Look up the placement named `name`; None (with a warning) when it does not exist.
    pub fn resolve(geometry: &Geometry, name: &str, margin: f64) -> Option<Self> {
        let Some(id) = geometry.physical_volume(name) else {
            tracing::warn!("Invalid physical volume '{}', sampling isotropically", name);
            return None;
        };
        let transform = geometry.global_transform(id);
        let solid = &geometry.logical(geometry.placements[id].logical).solid;
        let bounds = solid.bounding_limits().expanded(margin.max(0.0)).transformed(&transform);
        Some(TargetVolume {
            origin: transform.translation,
            bounds,
        })
    }
}

/// Direction from `reference` into the cone that encloses `target`, scaling `weight`
/// by the cone's share of the full sphere. Isotropic with unchanged weight when
/// there is no target, the reference is inside it, or the cone opens past 90°.
pub fn sample_direction_from_to<R: Rng + ?Sized>(
    reference: &Vec3,
    target: Option<&TargetVolume>,
    weight: &mut f64,
    rng: &mut R,
) -> Vec3 {
    let Some(target) = target else {
        return AngularDistribution::Isotropic.sample(rng);
    };
    let axis = target.origin - *reference;
    if target.bounds.contains(reference) || axis.norm() == 0.0 {
        return AngularDistribution::Isotropic.sample(rng);
    }

    let max_theta = target
        .bounds
        .corners()
        .iter()
        .map(|corner| axis.angle(&(corner - reference)))
        .fold(0.0, f64::max);
    let cos_theta = max_theta.cos();
    if cos_theta <= 0.0 {
        return AngularDistribution::Isotropic.sample(rng);
    }

    // solid angle 2π(1 - cosθ) over 4π
    *weight *= (1.0 - cos_theta) / 2.0;
    let direction = AngularDistribution::new_cone(cos_theta).sample(rng);
    match Rotation3::rotation_between(&Vec3::z(), &axis) {
        Some(rotation) => rotation * direction,
        // anti-parallel to +z
        None => -direction,
    }
}

/// Generates one photon per event from the active rods of an assembly.
#[derive(Debug, Clone)]
pub struct PrimaryGenerator {
    pub energy: f64,
    pub reference_height: f64,
    direction: DirectionMode,
    placement: Transform,
    target: Option<TargetVolume>,
}

impl Default for PrimaryGenerator {
    fn default() -> Self {
        PrimaryGenerator {
            energy: DEFAULT_ENERGY,
            reference_height: REFERENCE_HEIGHT,
            direction: DirectionMode::Isotropic,
            placement: Transform::identity(),
            target: None,
        }
    }
}

impl PrimaryGenerator {
    pub fn new(energy: f64, direction: DirectionMode) -> Self {
        PrimaryGenerator {
            energy,
            direction,
            ..Default::default()
        }
    }

    pub fn direction_mode(&self) -> &DirectionMode {
        &self.direction
    }

    pub fn set_direction_mode(&mut self, direction: DirectionMode) {
        self.direction = direction;
        self.target = None;
    }

    pub fn target(&self) -> Option<&TargetVolume> {
        self.target.as_ref()
    }

    /// Resolve the assembly placement and the target volume against the geometry.
    /// Returns false when the assembly is not placed.
    pub fn prepare(&mut self, geometry: &Geometry, assembly_name: &str) -> bool {
        self.target = match &self.direction {
            DirectionMode::Isotropic => None,
            DirectionMode::TowardVolume { name, margin } => TargetVolume::resolve(geometry, name, *margin),
        };
        match geometry.physical_volume(assembly_name) {
            Some(id) => {
                self.placement = geometry.global_transform(id);
                true
            }
            None => {
                tracing::warn!("No placement named '{}' for the source", assembly_name);
                false
            }
        }
    }

    /// Sample a primary photon; None when the assembly has no active rod.
    pub fn generate<R: Rng + ?Sized>(&self, assembly: &SpentFuelAssembly, rng: &mut R) -> Option<Photon> {
        let rod = assembly.fuel_rod();
        let mut weight = rod.height() / self.reference_height;

        let rod_id = assembly.status().sample_rod_id(rng)?;
        let point = rod.sample_point(rng);
        let local = assembly.fuel_rod_location(rod_id as i32) + point;
        let position = self.placement.to_global(&local);

        let direction = sample_direction_from_to(&position, self.target.as_ref(), &mut weight, rng);
        Some(Photon::new(position, direction, self.energy, weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::Materials;
    use crate::solid::Solid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn target_box() -> TargetVolume {
        TargetVolume {
            origin: Vec3::new(0.0, 0.0, -30.0),
            bounds: BoundingBox::new(Vec3::new(-25.0, -25.0, -60.0), Vec3::new(25.0, 25.0, 0.0)),
        }
    }

    #[test]
    fn test_isotropic_without_target() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut weight = 0.5;
        let d = sample_direction_from_to(&Vec3::new(0.0, 0.0, 1000.0), None, &mut weight, &mut rng);
        assert!((d.norm() - 1.0).abs() < 1e-12);
        assert_eq!(weight, 0.5);
    }

    #[test]
    fn test_cone_toward_volume() {
        let mut rng = StdRng::seed_from_u64(3);
        let target = target_box();
        let reference = Vec3::new(0.0, 0.0, 1000.0);
        let axis = (target.origin - reference).normalize();
        let cos_max = target
            .bounds
            .corners()
            .iter()
            .map(|c| (c - reference).normalize().dot(&axis))
            .fold(1.0, f64::min);

        for _ in 0..2000 {
            let mut weight = 1.0;
            let d = sample_direction_from_to(&reference, Some(&target), &mut weight, &mut rng);
            assert!((d.norm() - 1.0).abs() < 1e-9);
            assert!(d.dot(&axis) >= cos_max - 1e-9);
            assert!((weight - (1.0 - cos_max) / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_toward_volume_anti_parallel_axis() {
        let mut rng = StdRng::seed_from_u64(5);
        let target = target_box();
        let mut weight = 1.0;
        let d = sample_direction_from_to(&Vec3::new(0.0, 0.0, 500.0), Some(&target), &mut weight, &mut rng);
        assert!(d.z < 0.0);
        assert!(weight < 1.0);
    }

    #[test]
    fn test_reference_inside_box_is_isotropic() {
        let mut rng = StdRng::seed_from_u64(7);
        let target = target_box();
        let mut weight = 1.0;
        let mut upward = 0;
        for _ in 0..1000 {
            let d = sample_direction_from_to(&Vec3::new(0.0, 0.0, -10.0), Some(&target), &mut weight, &mut rng);
            if d.z > 0.0 {
                upward += 1;
            }
        }
        assert_eq!(weight, 1.0);
        assert!(upward > 400 && upward < 600);
    }

    #[test]
    fn test_resolve_unknown_volume() {
        let geometry = Geometry::new();
        assert!(TargetVolume::resolve(&geometry, "ComptonCamera", 0.0).is_none());
    }

    #[test]
    fn test_resolve_with_margin() {
        let mut geometry = Geometry::new();
        let world = geometry.add_logical("World", Solid::new_box(1000.0, 1000.0, 1000.0), 0);
        let camera = geometry.add_logical("TestCC1", Solid::new_box(25.0, 25.0, 30.0), 0);
        geometry.place_world("World", world);
        geometry.place(
            "ComptonCamera",
            camera,
            world,
            Transform::from_translation(Vec3::new(0.0, 0.0, -30.0)),
            0,
        );
        let target = TargetVolume::resolve(&geometry, "ComptonCamera", 5.0).unwrap();
        assert_eq!(target.origin, Vec3::new(0.0, 0.0, -30.0));
        assert!((target.bounds.upper_right - Vec3::new(30.0, 30.0, 5.0)).norm() < 1e-9);
        assert!((target.bounds.lower_left - Vec3::new(-30.0, -30.0, -65.0)).norm() < 1e-9);
    }

    #[test]
    fn test_generate_inside_active_rod() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut geometry = Geometry::new();
        let mut materials = Materials::new();
        let air = materials.find_or_build("G4_AIR").unwrap();
        let world = geometry.add_logical("World", Solid::new_box(5000.0, 5000.0, 5000.0), air);
        geometry.place_world("World", world);
        let mut assembly =
            SpentFuelAssembly::build("SpentFuelAssembly", air, 2, 2, 12.85, &mut geometry, &mut materials).unwrap();
        let placement = Vec3::new(0.0, 0.0, 2100.0);
        geometry.place(
            "SpentFuelAssembly",
            assembly.logical_volume(),
            world,
            Transform::from_translation(placement),
            0,
        );
        assembly.status_mut().set_active_rods(&[3]);

        let mut generator = PrimaryGenerator::default();
        assert!(generator.prepare(&geometry, "SpentFuelAssembly"));
        let rod_center = assembly.fuel_rod_location(3) + placement;
        for _ in 0..1000 {
            let photon = generator.generate(&assembly, &mut rng).unwrap();
            let offset = photon.position - rod_center;
            assert!((offset.x * offset.x + offset.y * offset.y).sqrt() <= assembly.fuel_rod().pellet_radius());
            assert!(offset.z.abs() <= 2000.0 + 1e-9);
            assert_eq!(photon.weight, 1.0);
            assert_eq!(photon.energy, DEFAULT_ENERGY);
            let touchable = geometry.locate(&photon.position).unwrap();
            assert_eq!(geometry.logical(touchable.logical()).name, "FuelPellet");
            assert_eq!(touchable.replica_number(2), 3);
        }

        assembly.status_mut().set_active_rods(&[]);
        assert!(generator.generate(&assembly, &mut rng).is_none());
    }

    #[test]
    fn test_prepare_missing_assembly() {
        let geometry = Geometry::new();
        let mut generator = PrimaryGenerator::new(
            1.0,
            DirectionMode::TowardVolume {
                name: "ComptonCamera".to_string(),
                margin: 0.0,
            },
        );
        assert!(!generator.prepare(&geometry, "SpentFuelAssembly"));
        assert!(generator.target().is_none());
    }
}
