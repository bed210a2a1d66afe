//! Builds the world: the spent fuel assembly above a Compton camera, in air.

use crate::assembly::SpentFuelAssembly;
use crate::camera::{CameraModel, ComptonCamera, LACC_SC2AB_DISTANCE};
use crate::config::{Orientation, RunConfig};
use crate::error::{CcError, Result};
use crate::fast_rng::FastRng;
use crate::geometry::{Geometry, Transform};
use crate::materials::Materials;
use crate::registry::Registry;
use crate::sensitive::CcSensitiveDetector;
use crate::solid::Solid;
use crate::units::{CM, M, MM};
use crate::Vec3;
use nalgebra::{Rotation3, Vector3};

pub const WORLD_SIZE: f64 = 10.0 * M;
/// Placement name of the camera, the usual source target.
pub const CAMERA_PLACEMENT: &str = "ComptonCamera";
pub const SENSITIVE_DETECTOR_NAME: &str = "LACC";
pub const HITS_COLLECTION_NAME: &str = "CCData";

/// Everything the event loop reads: geometry, materials, the registered
/// assembly and camera, and the sensitive detector attached to the camera.
#[derive(Debug, Clone)]
pub struct Setup {
    pub geometry: Geometry,
    pub materials: Materials,
    pub registry: Registry,
    pub sensitive: CcSensitiveDetector,
    pub assembly_name: String,
    pub camera_name: String,
}

impl Setup {
    pub fn assembly(&self) -> Option<&SpentFuelAssembly> {
        self.registry.assembly(&self.assembly_name)
    }

    pub fn assembly_mut(&mut self) -> Option<&mut SpentFuelAssembly> {
        self.registry.assembly_mut(&self.assembly_name)
    }

    pub fn camera(&self) -> Option<&ComptonCamera> {
        self.registry.camera(&self.camera_name)
    }
}

pub struct DetectorConstruction;

impl DetectorConstruction {
    /// `seed` drives the random choice of active rods when an activation ratio is used.
    pub fn construct(config: &RunConfig, seed: u64) -> Result<Setup> {
        let mut geometry = Geometry::new();
        let mut materials = Materials::new();
        let mut registry = Registry::new();

        // World
        let air = materials.find_or_build("G4_AIR")?;
        let world = geometry.add_logical(
            "World",
            Solid::new_box(WORLD_SIZE / 2.0, WORLD_SIZE / 2.0, WORLD_SIZE / 2.0),
            air,
        );
        geometry.place_world("World", world);

        // Spent fuel assembly
        let cfg = &config.assembly;
        if cfg.nx == 0 || cfg.ny == 0 || cfg.interval_mm <= 0.0 {
            return Err(CcError::Geometry(format!(
                "invalid fuel rod lattice {}x{} at {} mm",
                cfg.nx, cfg.ny, cfg.interval_mm
            )));
        }
        let surrounding = materials.find_or_build(&cfg.surrounding_material)?;
        let mut assembly = SpentFuelAssembly::build(
            &cfg.name,
            surrounding,
            cfg.nx,
            cfg.ny,
            cfg.interval_mm * MM,
            &mut geometry,
            &mut materials,
        )?;
        match &cfg.active_rods {
            Some(ids) => assembly.status_mut().set_active_rods(ids),
            None => {
                let mut rng = FastRng::new(seed);
                assembly.status_mut().set_activation_ratio(cfg.activation_ratio, &mut rng);
            }
        }
        log_status(&assembly);

        let half = match &geometry.logical(assembly.logical_volume()).solid {
            Solid::Box { half } => *half,
            other => other.bounding_limits().width / 2.0,
        };
        let surface = cfg.surface_distance_mm * MM;
        let placement = match cfg.orientation {
            Orientation::Vertical => Transform::from_translation(Vec3::new(0.0, 0.0, surface + half.z)),
            Orientation::Horizontal => Transform::new(
                Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2),
                Vec3::new(0.0, 0.0, surface + half.y),
            ),
        };
        geometry.place(&cfg.name, assembly.logical_volume(), world, placement, 0);

        // Compton camera, top plane at z = 0
        let model = CameraModel::parse(&config.camera.model)?;
        let sc2ab = config.camera.sc2ab_distance_mm.map(|d| d * MM).unwrap_or(match model {
            CameraModel::TestCc1 => 5.0 * CM,
            CameraModel::Lacc => LACC_SC2AB_DISTANCE,
        });
        let camera = ComptonCamera::build(
            model,
            sc2ab,
            config.camera.scatter_thickness_mm * MM,
            config.camera.absorber_thickness_mm * MM,
            &mut geometry,
            &mut materials,
        )?;
        geometry.place(
            CAMERA_PLACEMENT,
            camera.logical_volume(),
            world,
            Transform::from_translation(Vec3::new(0.0, 0.0, -camera.height() / 2.0)),
            0,
        );

        let sensitive = CcSensitiveDetector::new(SENSITIVE_DETECTOR_NAME, HITS_COLLECTION_NAME, camera.copy_depth());
        let assembly_name = assembly.name().to_string();
        let camera_name = camera.name().to_string();
        registry.register_assembly(assembly);
        registry.register_camera(camera);
        tracing::info!(
            "Constructed {} and {} ({} logical volumes, {} materials)",
            assembly_name,
            camera_name,
            geometry.logicals.len(),
            materials.len()
        );

        Ok(Setup {
            geometry,
            materials,
            registry,
            sensitive,
            assembly_name,
            camera_name,
        })
    }
}

/// Log the active rod map, one line per lattice row.
pub fn log_status(assembly: &SpentFuelAssembly) {
    let mut buffer = Vec::new();
    if assembly.status().write_status(&mut buffer).is_ok() {
        for line in String::from_utf8_lossy(&buffer).lines() {
            tracing::info!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblyConfig;

    #[test]
    fn test_default_setup() {
        let setup = DetectorConstruction::construct(&RunConfig::default(), 1).unwrap();
        let assembly = setup.assembly().unwrap();
        assert_eq!(assembly.status().active_count(), 256);
        assert_eq!(setup.camera().unwrap().name(), "TestCC1");
        assert_eq!(setup.sensitive.copy_depth(), 0);
        assert_eq!(setup.sensitive.collection_name(), "CCData");

        // assembly 100 mm above the camera top plane, rods 4 m long
        let id = setup.geometry.physical_volume("SpentFuelAssembly").unwrap();
        let t = setup.geometry.global_transform(id);
        assert!((t.translation.z - 2100.0).abs() < 1e-9);
        let camera_id = setup.geometry.physical_volume(CAMERA_PLACEMENT).unwrap();
        assert!((setup.geometry.global_transform(camera_id).translation.z + 30.0).abs() < 1e-9);

        let in_scatter = setup.geometry.locate(&Vec3::new(0.0, 0.0, -5.0)).unwrap();
        assert!(setup.geometry.logical(in_scatter.logical()).sensitive);
        assert_eq!(in_scatter.replica_number(0), 0);
        let in_absorber = setup.geometry.locate(&Vec3::new(0.0, 0.0, -55.0)).unwrap();
        assert_eq!(in_absorber.replica_number(0), 1);
    }

    #[test]
    fn test_horizontal_assembly() {
        let config = RunConfig {
            assembly: AssemblyConfig {
                orientation: Orientation::Horizontal,
                ..AssemblyConfig::default()
            },
            ..RunConfig::default()
        };
        let setup = DetectorConstruction::construct(&config, 1).unwrap();
        let id = setup.geometry.physical_volume("SpentFuelAssembly").unwrap();
        let half_y = 12.85 * 7.5 + 4.85;
        assert!((setup.geometry.global_transform(id).translation.z - (100.0 + half_y)).abs() < 1e-9);
        // rods now lie along y
        let touchable = setup.geometry.locate(&Vec3::new(0.0, 1500.0, 100.0 + half_y)).unwrap();
        assert_ne!(touchable.levels.len(), 1);
    }

    #[test]
    fn test_activation_ratio_and_explicit_rods() {
        let mut config = RunConfig::default();
        config.assembly.activation_ratio = 0.5;
        let setup = DetectorConstruction::construct(&config, 3).unwrap();
        assert_eq!(setup.assembly().unwrap().status().active_count(), 128);

        config.assembly.active_rods = Some(vec![0, 255, 300]);
        let setup = DetectorConstruction::construct(&config, 3).unwrap();
        assert_eq!(setup.assembly().unwrap().status().active_ids(), &[0, 255]);
    }

    #[test]
    fn test_lacc_setup() {
        let mut config = RunConfig::default();
        config.camera.model = "lacc".to_string();
        let setup = DetectorConstruction::construct(&config, 1).unwrap();
        let camera = setup.camera().unwrap();
        assert!((camera.sc2ab_distance() - 250.0).abs() < 1e-9);
        assert_eq!(setup.sensitive.copy_depth(), 3);
    }

    #[test]
    fn test_bad_inputs() {
        let mut config = RunConfig::default();
        config.camera.model = "pinhole".to_string();
        assert!(matches!(
            DetectorConstruction::construct(&config, 1),
            Err(CcError::UnknownCameraModel(_))
        ));

        let mut config = RunConfig::default();
        config.assembly.nx = 0;
        assert!(matches!(DetectorConstruction::construct(&config, 1), Err(CcError::Geometry(_))));

        let mut config = RunConfig::default();
        config.assembly.surrounding_material = "Kryptonite".to_string();
        assert!(matches!(
            DetectorConstruction::construct(&config, 1),
            Err(CcError::UnknownMaterial(_))
        ));
    }
}
