//! Spent fuel assembly: a square lattice of identical fuel rods and the set of
//! rods that currently emit.

use crate::error::Result;
use crate::geometry::{Geometry, GridParameterisation, LogicalId, Transform};
use crate::material::MaterialId;
use crate::materials::Materials;
use crate::solid::Solid;
use crate::stats::sample_point_in_disk;
use crate::units::{CM, M, MM};
use crate::Vec3;
use rand::Rng;
use std::io::Write;

pub const CLADDING_DIAMETER: f64 = 9.7 * MM;
pub const CLADDING_HEIGHT: f64 = 4.0 * M;
pub const HE_GAP_DIAMETER: f64 = 8.43 * MM;
pub const FUEL_PELLET_DIAMETER: f64 = 8.26 * MM;

pub const DEFAULT_GRID: usize = 16;
pub const DEFAULT_INTERVAL: f64 = 1.285 * CM;

/// One fuel rod: Zircaloy cladding around a helium gap around the LEU pellet.
#[derive(Debug, Clone)]
pub struct FuelRod {
    cladding: LogicalId,
    pellet: LogicalId,
    cladding_solid: Solid,
    pellet_radius: f64,
    pellet_height: f64,
}

impl FuelRod {
    pub fn build(geometry: &mut Geometry, materials: &mut Materials) -> Result<Self> {
        // - Cladding
        // | - HeGap
        // | | - FuelPellet
        let cladding_solid = Solid::new_tube(CLADDING_DIAMETER / 2.0, CLADDING_HEIGHT / 2.0);
        let zir4 = materials.find_or_build("Zir4")?;
        let cladding = geometry.add_logical("Cladding", cladding_solid.clone(), zir4);

        let he_gas = materials.find_or_build("HeGas")?;
        let he_gap = geometry.add_logical(
            "HeGap",
            Solid::new_tube(HE_GAP_DIAMETER / 2.0, CLADDING_HEIGHT / 2.0),
            he_gas,
        );
        geometry.place("HeGap", he_gap, cladding, Transform::identity(), 0);

        let leu = materials.find_or_build("mLEU")?;
        let pellet = geometry.add_logical(
            "FuelPellet",
            Solid::new_tube(FUEL_PELLET_DIAMETER / 2.0, CLADDING_HEIGHT / 2.0),
            leu,
        );
        geometry.place("FuelPellet", pellet, he_gap, Transform::identity(), 0);

        Ok(FuelRod {
            cladding,
            pellet,
            cladding_solid,
            pellet_radius: FUEL_PELLET_DIAMETER / 2.0,
            pellet_height: CLADDING_HEIGHT,
        })
    }

    pub fn logical_volume(&self) -> LogicalId {
        self.cladding
    }

    pub fn pellet_volume(&self) -> LogicalId {
        self.pellet
    }

    pub fn radius(&self) -> f64 {
        self.cladding_solid.half_x()
    }

    pub fn height(&self) -> f64 {
        2.0 * self.cladding_solid.half_z()
    }

    pub fn pellet_radius(&self) -> f64 {
        self.pellet_radius
    }

    pub fn pellet_height(&self) -> f64 {
        self.pellet_height
    }

    /// Uniform point inside the fuel pellet, in the rod frame.
    pub fn sample_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let (x, y) = sample_point_in_disk(self.pellet_radius, rng);
        let z = rng.gen::<f64>() * self.pellet_height - self.pellet_height / 2.0;
        Vec3::new(x, y, z)
    }
}

/// Which rods of an nx × ny lattice are active sources.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelRodStatus {
    nx: usize,
    ny: usize,
    active: Vec<usize>,
}

impl FuelRodStatus {
    /// All rods active
    pub fn new(nx: usize, ny: usize) -> Self {
        FuelRodStatus {
            nx,
            ny,
            active: (0..nx * ny).collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.nx * self.ny
    }

    pub fn active_ids(&self) -> &[usize] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, id: usize) -> bool {
        self.active.contains(&id)
    }

    /// Keep a uniformly random subset of floor(total * ratio) rods.
    ///
    /// A ratio outside [0, 1] leaves the status unchanged.
    pub fn set_activation_ratio<R: Rng + ?Sized>(&mut self, ratio: f64, rng: &mut R) {
        if !(0.0..=1.0).contains(&ratio) {
            tracing::warn!("Fuel rod activation ratio {} is out of range (must be 0-1)", ratio);
            return;
        }
        let total = self.total();
        let amount = ((total as f64) * ratio).floor() as usize;
        let mut ids = rand::seq::index::sample(rng, total, amount.min(total)).into_vec();
        ids.sort_unstable();
        self.active = ids;
    }

    /// Replace the active set with an explicit id list.
    pub fn set_active_rods(&mut self, ids: &[usize]) {
        let total = self.total();
        let mut active: Vec<usize> = Vec::with_capacity(ids.len());
        for &id in ids {
            if id >= total {
                tracing::warn!("Fuel rod id {} is out of range (must be < {}), ignored", id, total);
            } else if !active.contains(&id) {
                active.push(id);
            }
        }
        self.active = active;
    }

    /// Uniform draw from the active rods; None when no rod is active.
    pub fn sample_rod_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.active.is_empty() {
            return None;
        }
        let idx = (rng.gen::<f64>() * self.active.len() as f64).floor() as usize;
        self.active.get(idx.min(self.active.len() - 1)).copied()
    }

    /// Write the active-rod map as commented 0/1 rows, one per lattice row.
    pub fn write_status<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let mut flags = vec![0u8; self.total()];
        for &id in &self.active {
            flags[id] = 1;
        }
        writeln!(out, "# active fuel rods: {}/{}", self.active.len(), self.total())?;
        for j in 0..self.ny {
            write!(out, "# ")?;
            for i in 0..self.nx {
                write!(out, "{} ", flags[i + self.nx * j])?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// The assembly box holding an nx × ny grid of fuel rods.
#[derive(Debug, Clone)]
pub struct SpentFuelAssembly {
    name: String,
    nx: usize,
    ny: usize,
    interval: f64,
    rod: FuelRod,
    logical: LogicalId,
    grid: GridParameterisation,
    status: FuelRodStatus,
}

impl SpentFuelAssembly {
    pub fn build(
        name: &str,
        surrounding: MaterialId,
        nx: usize,
        ny: usize,
        interval: f64,
        geometry: &mut Geometry,
        materials: &mut Materials,
    ) -> Result<Self> {
        // - SpentFuelAssembly
        // | - FuelRod (nx*ny)
        let rod = FuelRod::build(geometry, materials)?;
        let solid = Solid::new_box(
            interval * (nx as f64 - 1.0) / 2.0 + rod.radius(),
            interval * (ny as f64 - 1.0) / 2.0 + rod.radius(),
            rod.height() / 2.0,
        );
        let logical = geometry.add_logical(name, solid, surrounding);
        let grid = GridParameterisation::new(nx, ny, interval);
        geometry.place_grid("FuelRod", rod.logical_volume(), logical, grid.clone());
        tracing::debug!("Built {} with {}x{} fuel rods at {} mm pitch", name, nx, ny, interval);

        Ok(SpentFuelAssembly {
            name: name.to_string(),
            nx,
            ny,
            interval,
            rod,
            logical,
            grid,
            status: FuelRodStatus::new(nx, ny),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_volume(&self) -> LogicalId {
        self.logical
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn fuel_rod(&self) -> &FuelRod {
        &self.rod
    }

    pub fn status(&self) -> &FuelRodStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut FuelRodStatus {
        &mut self.status
    }

    /// Centre of rod `copy_no` in the assembly frame; zero vector when out of range.
    pub fn fuel_rod_location(&self, copy_no: i32) -> Vec3 {
        if copy_no < 0 || copy_no as usize >= self.nx * self.ny {
            tracing::warn!("Fuel rod copy number {} is out of range", copy_no);
            return Vec3::zeros();
        }
        self.grid.translation(copy_no as usize)
    }
}
