//! Two-plane Compton cameras: a scatter detector above an absorber detector.

use crate::error::{CcError, Result};
use crate::geometry::{Geometry, GridParameterisation, LogicalId, Transform};
use crate::materials::Materials;
use crate::solid::Solid;
use crate::units::{CM, MM};
use crate::Vec3;

pub const GAGG_CRYSTAL_WIDTH: f64 = 5.0 * CM;
pub const GAGG_CRYSTAL_THICKNESS: f64 = 10.0 * MM;

pub const LACC_SCATTER_THICKNESS: f64 = 2.0 * CM;
pub const LACC_ABSORBER_THICKNESS: f64 = 3.0 * CM;
pub const LACC_SC2AB_DISTANCE: f64 = 25.0 * CM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModel {
    TestCc1,
    Lacc,
}

impl CameraModel {
    pub fn from_str_option(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "test_cc1" | "testcc1" => Some(CameraModel::TestCc1),
            "lacc" => Some(CameraModel::Lacc),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str_option(s).ok_or_else(|| CcError::UnknownCameraModel(s.to_string()))
    }

    /// Default camera name, also the name of its logical volume.
    pub fn name(&self) -> &'static str {
        match self {
            CameraModel::TestCc1 => "TestCC1",
            CameraModel::Lacc => "LACC",
        }
    }

    /// Touchable depth from the sensitive volume up to the scatter/absorber placement.
    pub fn copy_depth(&self) -> usize {
        match self {
            CameraModel::TestCc1 => 0,
            // Crystal > PaintSide > FrontHousing > Scatter|Absorber
            CameraModel::Lacc => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorModel {
    /// Bare 50 x 50 mm GAGG:Ce crystal
    Gagg,
    /// Large-area NaI(Tl) detector with front housing and PMT rear housing
    LaScint { crystal_thickness: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    model: DetectorModel,
    logical: LogicalId,
    crystal: LogicalId,
    photocathode: Option<LogicalId>,
    dimensions: Vec3,
}

impl Detector {
    pub fn gagg(geometry: &mut Geometry, materials: &mut Materials) -> Result<Self> {
        let solid = Solid::new_box(
            GAGG_CRYSTAL_WIDTH / 2.0,
            GAGG_CRYSTAL_WIDTH / 2.0,
            GAGG_CRYSTAL_THICKNESS / 2.0,
        );
        let gagg = materials.find_or_build("GAGGCe")?;
        let dimensions = solid.bounding_limits().width;
        let logical = geometry.add_logical("GAGGDetector", solid, gagg);
        Ok(Detector {
            model: DetectorModel::Gagg,
            logical,
            crystal: logical,
            photocathode: None,
            dimensions,
        })
    }

    pub fn la_scint(
        crystal_thickness: f64,
        geometry: &mut Geometry,
        materials: &mut Materials,
    ) -> Result<Self> {
        // - LAScintDetector
        // | - FrontHousing
        // | - RearHousing
        let (front, crystal) = front_housing(crystal_thickness, geometry, materials)?;
        let (rear, photocathode) = rear_housing(geometry, materials)?;

        let front_height = 2.0 * geometry.logical(front).solid.half_z();
        let rear_height = 2.0 * geometry.logical(rear).solid.half_z();
        let width = 2.0 * geometry.logical(front).solid.half_x();
        let height = front_height + rear_height;

        let air = materials.find_or_build("G4_AIR")?;
        let solid = Solid::new_box(width / 2.0, width / 2.0, height / 2.0);
        let dimensions = solid.bounding_limits().width;
        let logical = geometry.add_logical("LAScintDetector", solid, air);
        geometry.place("FrontHousing", front, logical, z_shift(height / 2.0 - front_height / 2.0), 0);
        geometry.place("RearHousing", rear, logical, z_shift(-height / 2.0 + rear_height / 2.0), 0);

        Ok(Detector {
            model: DetectorModel::LaScint { crystal_thickness },
            logical,
            crystal,
            photocathode: Some(photocathode),
            dimensions,
        })
    }

    pub fn model(&self) -> DetectorModel {
        self.model
    }

    pub fn logical_volume(&self) -> LogicalId {
        self.logical
    }

    /// Scintillator volume; the whole detector for a bare crystal.
    pub fn crystal_volume(&self) -> LogicalId {
        self.crystal
    }

    pub fn photocathode_volume(&self) -> Option<LogicalId> {
        self.photocathode
    }

    /// Full outer lengths of the detector envelope.
    pub fn dimensions(&self) -> Vec3 {
        self.dimensions
    }
}

fn z_shift(z: f64) -> Transform {
    Transform::from_translation(Vec3::new(0.0, 0.0, z))
}

fn front_housing(
    crystal_thickness: f64,
    geometry: &mut Geometry,
    materials: &mut Materials,
) -> Result<(LogicalId, LogicalId)> {
    // - FrontHousing (1.5 mm aluminium)
    // | - PaintFront
    // | - PaintSide
    // | | - Crystal
    // | - OpticalGlue
    // | - OpticalWindow
    // | - OpticalGrease
    let crystal_width = 270.0 * MM;
    let paint_thickness = 2.5 * MM;
    let glue_thickness = 0.5 * MM;
    let window_width = 307.0 * MM;
    let window_thickness = 10.0 * MM;
    let grease_thickness = 1.0 * MM;
    let housing_width = 400.0 * MM;
    let aluminium_thickness = 1.5 * MM;
    let height = aluminium_thickness
        + paint_thickness
        + crystal_thickness
        + glue_thickness
        + window_thickness
        + grease_thickness;

    let nai = materials.find_or_build("NaITl")?;
    let mgo = materials.find_or_build("G4_MAGNESIUM_OXIDE")?;
    let bc630 = materials.find_or_build("BC630")?;
    let silica = materials.find_or_build("FusedSilica")?;
    let aluminium = materials.find_or_build("G4_Al")?;

    let painted_half = crystal_width / 2.0 + paint_thickness;
    let crystal = geometry.add_logical(
        "Crystal",
        Solid::new_box(crystal_width / 2.0, crystal_width / 2.0, crystal_thickness / 2.0),
        nai,
    );
    let paint_side = geometry.add_logical(
        "PaintSide",
        Solid::new_box(painted_half, painted_half, crystal_thickness / 2.0),
        mgo,
    );
    let paint_front = geometry.add_logical(
        "PaintFront",
        Solid::new_box(painted_half, painted_half, paint_thickness / 2.0),
        mgo,
    );
    let glue = geometry.add_logical(
        "OpticalGlue",
        Solid::new_box(painted_half, painted_half, glue_thickness / 2.0),
        bc630,
    );
    let window = geometry.add_logical(
        "OpticalWindow",
        Solid::new_box(window_width / 2.0, window_width / 2.0, window_thickness / 2.0),
        silica,
    );
    let grease = geometry.add_logical(
        "OpticalGrease",
        Solid::new_box(window_width / 2.0, window_width / 2.0, grease_thickness / 2.0),
        bc630,
    );
    let housing = geometry.add_logical(
        "FrontHousing",
        Solid::new_box(housing_width / 2.0, housing_width / 2.0, height / 2.0),
        aluminium,
    );

    let top = height / 2.0 - aluminium_thickness;
    let bottom = -height / 2.0;
    geometry.place("Crystal", crystal, paint_side, Transform::identity(), 0);
    geometry.place("PaintFront", paint_front, housing, z_shift(top - paint_thickness / 2.0), 0);
    geometry.place(
        "PaintSide",
        paint_side,
        housing,
        z_shift(top - paint_thickness - crystal_thickness / 2.0),
        0,
    );
    geometry.place(
        "OpticalGlue",
        glue,
        housing,
        z_shift(bottom + grease_thickness + window_thickness + glue_thickness / 2.0),
        0,
    );
    geometry.place(
        "OpticalWindow",
        window,
        housing,
        z_shift(bottom + grease_thickness + window_thickness / 2.0),
        0,
    );
    geometry.place("OpticalGrease", grease, housing, z_shift(bottom + grease_thickness / 2.0), 0);

    Ok((housing, crystal))
}

fn rear_housing(geometry: &mut Geometry, materials: &mut Materials) -> Result<(LogicalId, LogicalId)> {
    // - RearHousing (1.5 mm aluminium)
    // | - RearInnerVoid
    // | | - PMT (6x6)
    // | | | - PMTFrontBase > PMTFrontVoid > PMTPhotoCathode
    // | | | - PMTRearBase > PMTRearVoid
    // | | | - PMTTail1, PMTPCB, PMTTail2
    // | | - Pillar (6x2)
    // | | - Holder (6)
    let cathode_width = 48.0 * MM;
    let cathode_thickness = 0.5 * MM;
    let glass_thickness = 1.5 * MM;
    let front_base_width = 51.0 * MM;
    let front_base_height = 50.0 * MM;
    let rear_base_height = 58.0 * MM;
    let tail_diameter = 26.0 * MM;
    let tail_height = 18.5 * MM;
    let pcb_thickness = 1.5 * MM;
    let pmt_height = front_base_height + rear_base_height + tail_height + pcb_thickness + tail_height;
    let pmt_pitch = 52.2 * MM;
    let pillar_diameter = 9.5 * MM;
    let pillar_spacing = 5.0 * pmt_pitch + front_base_width + 2.0 * 6.1 * MM + pillar_diameter;
    let holder_width = 350.0 * MM;
    let holder_length = 20.0 * MM;
    let holder_height = 6.5 * MM;
    let housing_width = 355.0 * MM;
    let housing_height = 200.0 * MM;
    let housing_thickness = 1.5 * MM;

    let air = materials.find_or_build("G4_AIR")?;
    let cathode_material = materials.find_or_build("BialkaliCathode")?;
    let pyrex = materials.find_or_build("G4_Pyrex_Glass")?;
    let polyethylene = materials.find_or_build("G4_POLYETHYLENE")?;
    let aluminium = materials.find_or_build("G4_Al")?;

    let cathode = geometry.add_logical(
        "PMTPhotoCathode",
        Solid::new_box(cathode_width / 2.0, cathode_width / 2.0, cathode_thickness / 2.0),
        cathode_material,
    );
    let front_void = geometry.add_logical(
        "PMTFrontVoid",
        Solid::new_box(
            front_base_width / 2.0 - glass_thickness,
            front_base_width / 2.0 - glass_thickness,
            (front_base_height - glass_thickness) / 2.0,
        ),
        air,
    );
    let front_base = geometry.add_logical(
        "PMTFrontBase",
        Solid::new_box(front_base_width / 2.0, front_base_width / 2.0, front_base_height / 2.0),
        pyrex,
    );
    let rear_void = geometry.add_logical(
        "PMTRearVoid",
        Solid::new_tube(front_base_width / 2.0 - glass_thickness, (rear_base_height - glass_thickness) / 2.0),
        air,
    );
    let rear_base = geometry.add_logical(
        "PMTRearBase",
        Solid::new_tube(front_base_width / 2.0, rear_base_height / 2.0),
        pyrex,
    );
    let tail = geometry.add_logical(
        "PMTTail",
        Solid::new_tube(tail_diameter / 2.0, tail_height / 2.0),
        polyethylene,
    );
    let pcb = geometry.add_logical(
        "PMTPCB",
        Solid::new_tube(front_base_width / 2.0, pcb_thickness / 2.0),
        polyethylene,
    );
    let pmt = geometry.add_logical(
        "PMT",
        Solid::new_box(front_base_width / 2.0, front_base_width / 2.0, pmt_height / 2.0),
        air,
    );
    let pillar = geometry.add_logical(
        "Pillar",
        Solid::new_tube(pillar_diameter / 2.0, pmt_height / 2.0),
        aluminium,
    );
    let holder = geometry.add_logical(
        "Holder",
        Solid::new_box(holder_width / 2.0, holder_length / 2.0, holder_height / 2.0),
        aluminium,
    );
    let inner_void = geometry.add_logical(
        "RearInnerVoid",
        Solid::new_box(
            housing_width / 2.0 - housing_thickness,
            housing_width / 2.0 - housing_thickness,
            (housing_height - housing_thickness) / 2.0,
        ),
        air,
    );
    let housing = geometry.add_logical(
        "RearHousing",
        Solid::new_box(housing_width / 2.0, housing_width / 2.0, housing_height / 2.0),
        aluminium,
    );

    geometry.place(
        "PMTPhotoCathode",
        cathode,
        front_void,
        z_shift((front_base_height - glass_thickness) / 2.0 - cathode_thickness / 2.0),
        0,
    );
    geometry.place("PMTFrontVoid", front_void, front_base, z_shift(-glass_thickness / 2.0), 0);
    geometry.place("PMTRearVoid", rear_void, rear_base, z_shift(glass_thickness / 2.0), 0);
    geometry.place("PMTFrontBase", front_base, pmt, z_shift(pmt_height / 2.0 - front_base_height / 2.0), 0);
    geometry.place(
        "PMTRearBase",
        rear_base,
        pmt,
        z_shift(pmt_height / 2.0 - front_base_height - rear_base_height / 2.0),
        0,
    );
    geometry.place(
        "PMTTail1",
        tail,
        pmt,
        z_shift(-pmt_height / 2.0 + tail_height + pcb_thickness + tail_height / 2.0),
        0,
    );
    geometry.place("PMTPCB", pcb, pmt, z_shift(-pmt_height / 2.0 + tail_height + pcb_thickness / 2.0), 0);
    geometry.place("PMTTail2", tail, pmt, z_shift(-pmt_height / 2.0 + tail_height / 2.0), 0);

    let rows = 6;
    let pmt_z = (housing_height - housing_thickness) / 2.0 - pmt_height / 2.0;
    let grid = GridParameterisation::with_origin(rows, rows, pmt_pitch, Vec3::new(0.0, 0.0, pmt_z));
    geometry.place_grid("PMT", pmt, inner_void, grid);

    for i in 0..rows {
        let row_y = (rows as f64 - 1.0) / 2.0 * pmt_pitch - pmt_pitch * i as f64;
        geometry.place(
            "Pillar",
            pillar,
            inner_void,
            Transform::from_translation(Vec3::new(-pillar_spacing / 2.0, row_y, pmt_z)),
            0,
        );
        geometry.place(
            "Pillar",
            pillar,
            inner_void,
            Transform::from_translation(Vec3::new(pillar_spacing / 2.0, row_y, pmt_z)),
            0,
        );
        geometry.place(
            "Holder",
            holder,
            inner_void,
            Transform::from_translation(Vec3::new(
                0.0,
                row_y,
                (housing_height - housing_thickness) / 2.0 - pmt_height - holder_height / 2.0,
            )),
            0,
        );
    }
    geometry.place("RearInnerVoid", inner_void, housing, z_shift(housing_thickness / 2.0), 0);

    Ok((housing, cathode))
}

/// A scatter detector (copy 0) stacked above an absorber detector (copy 1)
/// inside an air box whose top face is the scatter's front face.
#[derive(Debug, Clone)]
pub struct ComptonCamera {
    name: String,
    model: CameraModel,
    logical: LogicalId,
    scatter: Detector,
    absorber: Detector,
    sc2ab_distance: f64,
    height: f64,
}

impl ComptonCamera {
    pub fn build(
        model: CameraModel,
        sc2ab_distance: f64,
        scatter_thickness: f64,
        absorber_thickness: f64,
        geometry: &mut Geometry,
        materials: &mut Materials,
    ) -> Result<Self> {
        match model {
            CameraModel::TestCc1 => Self::test_cc1(model.name(), sc2ab_distance, geometry, materials),
            CameraModel::Lacc => Self::lacc(
                model.name(),
                scatter_thickness,
                absorber_thickness,
                sc2ab_distance,
                geometry,
                materials,
            ),
        }
    }

    /// Two GAGG crystals at least 5 cm apart.
    pub fn test_cc1(
        name: &str,
        sc2ab_distance: f64,
        geometry: &mut Geometry,
        materials: &mut Materials,
    ) -> Result<Self> {
        let scatter = Detector::gagg(geometry, materials)?;
        let absorber = Detector::gagg(geometry, materials)?;
        Self::stack(name, CameraModel::TestCc1, scatter, absorber, sc2ab_distance, geometry, materials)
    }

    pub fn lacc(
        name: &str,
        scatter_thickness: f64,
        absorber_thickness: f64,
        sc2ab_distance: f64,
        geometry: &mut Geometry,
        materials: &mut Materials,
    ) -> Result<Self> {
        let scatter = Detector::la_scint(scatter_thickness, geometry, materials)?;
        let absorber = Detector::la_scint(absorber_thickness, geometry, materials)?;
        Self::stack(name, CameraModel::Lacc, scatter, absorber, sc2ab_distance, geometry, materials)
    }

    fn stack(
        name: &str,
        model: CameraModel,
        scatter: Detector,
        absorber: Detector,
        sc2ab_distance: f64,
        geometry: &mut Geometry,
        materials: &mut Materials,
    ) -> Result<Self> {
        // - Camera
        // | - Scatter
        // | - Absorber
        let sc = scatter.dimensions();
        let ab = absorber.dimensions();
        let sc2ab_distance = sc2ab_distance.max(sc.z);
        let width = sc.x.max(ab.x);
        let length = sc.y.max(ab.y);
        let height = sc2ab_distance + ab.z;

        let air = materials.find_or_build("G4_AIR")?;
        let logical = geometry.add_logical(name, Solid::new_box(width / 2.0, length / 2.0, height / 2.0), air);
        geometry.place("Scatter", scatter.logical_volume(), logical, z_shift(height / 2.0 - sc.z / 2.0), 0);
        geometry.place("Absorber", absorber.logical_volume(), logical, z_shift(-height / 2.0 + ab.z / 2.0), 1);
        geometry.set_sensitive(scatter.crystal_volume());
        geometry.set_sensitive(absorber.crystal_volume());
        tracing::debug!(
            "Built {} with scatter-to-absorber distance {} mm (height {} mm)",
            name,
            sc2ab_distance,
            height
        );

        Ok(ComptonCamera {
            name: name.to_string(),
            model,
            logical,
            scatter,
            absorber,
            sc2ab_distance,
            height,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> CameraModel {
        self.model
    }

    pub fn logical_volume(&self) -> LogicalId {
        self.logical
    }

    pub fn scatter(&self) -> &Detector {
        &self.scatter
    }

    pub fn absorber(&self) -> &Detector {
        &self.absorber
    }

    /// Front-to-front distance, never smaller than the scatter thickness.
    pub fn sc2ab_distance(&self) -> f64 {
        self.sc2ab_distance
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn copy_depth(&self) -> usize {
        self.model.copy_depth()
    }

    pub fn detector(&self, copy_no: i32) -> Option<&Detector> {
        match copy_no {
            0 => Some(&self.scatter),
            1 => Some(&self.absorber),
            _ => None,
        }
    }

    /// Centre of detector `copy_no` in the camera frame; zero vector when out of range.
    pub fn detector_center(&self, copy_no: i32) -> Vec3 {
        match self.detector(copy_no) {
            Some(detector) => {
                let half = detector.dimensions().z / 2.0;
                let z = if copy_no == 0 {
                    self.height / 2.0 - half
                } else {
                    -self.height / 2.0 + half
                };
                Vec3::new(0.0, 0.0, z)
            }
            None => {
                tracing::warn!("{} has no detector with copy number {}", self.name, copy_no);
                Vec3::zeros()
            }
        }
    }
}
