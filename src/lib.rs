//! Monte Carlo transport of gamma rays from a spent nuclear fuel assembly into a
//! two-plane Compton camera, with per-event hit records written to a text file.

pub mod assembly;
pub mod bounding_box;
pub mod camera;
pub mod commands;
pub mod config;
pub mod construction;
pub mod error;
pub mod fast_rng;
pub mod geometry;
pub mod hit;
pub mod material;
pub mod materials;
pub mod model;
pub mod particle;
pub mod physics;
pub mod recorder;
pub mod registry;
pub mod sensitive;
pub mod settings;
pub mod solid;
pub mod source;
pub mod stats;
pub mod units;

/// Three-vector in mm (positions) or unitless (directions).
pub type Vec3 = nalgebra::Vector3<f64>;

pub use assembly::{FuelRod, FuelRodStatus, SpentFuelAssembly};
pub use camera::{CameraModel, ComptonCamera, Detector, DetectorModel};
pub use commands::{Command, Session};
pub use config::RunConfig;
pub use construction::{DetectorConstruction, Setup};
pub use error::{CcError, Result};
pub use geometry::{Geometry, Touchable, Transform};
pub use hit::{Hit, HitsMap};
pub use material::Material;
pub use materials::Materials;
pub use model::{Model, RunSummary};
pub use physics::PhysicsList;
pub use recorder::EventRecorder;
pub use registry::Registry;
pub use sensitive::{CcSensitiveDetector, Step};
pub use settings::Settings;
pub use source::{DirectionMode, PrimaryGenerator};
