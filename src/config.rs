//! Run configuration read from a TOML file. Every field has a default, so an
//! empty file (or no file) gives the stock 16x16 assembly above the TestCC1 camera.

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub output: PathBuf,
    pub assembly: AssemblyConfig,
    pub camera: CameraConfig,
    pub source: SourceConfig,
    pub run: RunSection,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            output: PathBuf::from("output/data.txt"),
            assembly: AssemblyConfig::default(),
            camera: CameraConfig::default(),
            source: SourceConfig::default(),
            run: RunSection::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded run configuration from {}", path.as_ref().display());
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Rods along z
    #[default]
    Vertical,
    /// Rods along y, the assembly rotated 90° about x
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyConfig {
    pub name: String,
    pub nx: usize,
    pub ny: usize,
    pub interval_mm: f64,
    /// Gap between the camera top plane and the near face of the assembly
    pub surface_distance_mm: f64,
    pub orientation: Orientation,
    pub surrounding_material: String,
    pub activation_ratio: f64,
    /// Explicit active rod ids; takes precedence over `activation_ratio`
    pub active_rods: Option<Vec<usize>>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            name: "SpentFuelAssembly".to_string(),
            nx: 16,
            ny: 16,
            interval_mm: 12.85,
            surface_distance_mm: 100.0,
            orientation: Orientation::Vertical,
            surrounding_material: "G4_AIR".to_string(),
            activation_ratio: 1.0,
            active_rods: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub model: String,
    /// Defaults to 50 mm for test_cc1 and 250 mm for lacc
    pub sc2ab_distance_mm: Option<f64>,
    pub scatter_thickness_mm: f64,
    pub absorber_thickness_mm: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            model: "test_cc1".to_string(),
            sc2ab_distance_mm: None,
            scatter_thickness_mm: 20.0,
            absorber_thickness_mm: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub energy_mev: f64,
    pub reference_height_mm: f64,
    /// Placement name to aim at; isotropic emission when unset
    pub target: Option<String>,
    pub margin_mm: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            energy_mev: 0.662,
            reference_height_mm: 4000.0,
            target: None,
            margin_mm: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub threads: usize,
    pub seed: Option<u64>,
    pub physics: String,
    /// Events between progress logs; one tenth of the run when unset
    pub print_progress: Option<u64>,
    pub min_hits: usize,
}

impl Default for RunSection {
    fn default() -> Self {
        RunSection {
            threads: 1,
            seed: None,
            physics: "standard".to_string(),
            print_progress: None,
            min_hits: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CcError;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(RunConfig::from_toml_str("").unwrap(), RunConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = RunConfig::from_toml_str(
            r#"
            output = "out/lacc.txt"

            [assembly]
            nx = 4
            ny = 2
            orientation = "horizontal"
            active_rods = [0, 7]

            [camera]
            model = "lacc"

            [run]
            threads = 4
            seed = 42
            physics = "compton-only"
            "#,
        )
        .unwrap();
        assert_eq!(config.output, PathBuf::from("out/lacc.txt"));
        assert_eq!(config.assembly.nx, 4);
        assert_eq!(config.assembly.interval_mm, 12.85);
        assert_eq!(config.assembly.orientation, Orientation::Horizontal);
        assert_eq!(config.assembly.active_rods, Some(vec![0, 7]));
        assert_eq!(config.camera.model, "lacc");
        assert_eq!(config.camera.sc2ab_distance_mm, None);
        assert_eq!(config.run.seed, Some(42));
        assert_eq!(config.run.min_hits, 1);
        assert_eq!(config.source.energy_mev, 0.662);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = RunConfig::from_toml_str("[run]\nthread = 2\n").unwrap_err();
        assert!(matches!(err, CcError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "[source]\nenergy_mev = 1.332\ntarget = \"ComptonCamera\"\n").unwrap();
        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.source.energy_mev, 1.332);
        assert_eq!(config.source.target.as_deref(), Some("ComptonCamera"));
        assert!(matches!(
            RunConfig::from_file(dir.path().join("missing.toml")),
            Err(CcError::Io(_))
        ));
    }
}
