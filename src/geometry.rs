use crate::material::MaterialId;
use crate::solid::Solid;
use crate::Vec3;
use nalgebra::Rotation3;
use std::io::Write;

pub type LogicalId = usize;
pub type PlacementId = usize;

/// Rigid transform taking local coordinates to the mother frame: `R * p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Rotation3<f64>,
    pub translation: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Transform {
            rotation: Rotation3::identity(),
            translation: Vec3::zeros(),
        }
    }

    pub fn new(rotation: Rotation3<f64>, translation: Vec3) -> Self {
        Transform {
            rotation,
            translation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Transform {
            rotation: Rotation3::identity(),
            translation,
        }
    }

    pub fn to_global(&self, p: &Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    pub fn to_local(&self, p: &Vec3) -> Vec3 {
        self.rotation.inverse() * (p - self.translation)
    }

    pub fn direction_to_local(&self, d: &Vec3) -> Vec3 {
        self.rotation.inverse() * d
    }

    /// `self` applied after `inner`, i.e. the transform of a daughter placed with `inner`.
    pub fn then(&self, inner: &Transform) -> Transform {
        Transform {
            rotation: self.rotation * inner.rotation,
            translation: self.rotation * inner.translation + self.translation,
        }
    }
}

/// Positions of a regular nx × ny array of identical daughters in the xy plane.
///
/// Copy number `i` sits at column `i % nx`, row `i / nx`; the array is centred on
/// `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridParameterisation {
    pub nx: usize,
    pub ny: usize,
    pub interval: f64,
    pub origin: Vec3,
    start_x: f64,
    start_y: f64,
}

impl GridParameterisation {
    pub fn new(nx: usize, ny: usize, interval: f64) -> Self {
        Self::with_origin(nx, ny, interval, Vec3::zeros())
    }

    pub fn with_origin(nx: usize, ny: usize, interval: f64, origin: Vec3) -> Self {
        GridParameterisation {
            nx,
            ny,
            interval,
            origin,
            start_x: -((nx as f64 - 1.0) / 2.0) * interval,
            start_y: -((ny as f64 - 1.0) / 2.0) * interval,
        }
    }

    pub fn copies(&self) -> usize {
        self.nx * self.ny
    }

    /// Translation of copy `copy_no`; callers are expected to range-check.
    pub fn translation(&self, copy_no: usize) -> Vec3 {
        let x_idx = copy_no % self.nx;
        let y_idx = copy_no / self.nx;
        Vec3::new(
            self.start_x + x_idx as f64 * self.interval,
            self.start_y + y_idx as f64 * self.interval,
            0.0,
        ) + self.origin
    }

    /// The only copy whose cell of the lattice contains `p`, if any.
    pub fn nearest_copy(&self, p: &Vec3) -> Option<usize> {
        if self.interval <= 0.0 {
            return None;
        }
        let ix = ((p.x - self.origin.x - self.start_x) / self.interval).round();
        let iy = ((p.y - self.origin.y - self.start_y) / self.interval).round();
        if ix < 0.0 || iy < 0.0 || ix >= self.nx as f64 || iy >= self.ny as f64 {
            return None;
        }
        Some(iy as usize * self.nx + ix as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementLayout {
    Single { transform: Transform, copy_no: i32 },
    Grid(GridParameterisation),
}

/// A volume template: shape, fill and daughters.
#[derive(Debug, Clone)]
pub struct LogicalVolume {
    pub name: String,
    pub solid: Solid,
    pub material: MaterialId,
    pub daughters: Vec<PlacementId>,
    pub sensitive: bool,
}

/// A placed instance (or array of instances) of a logical volume inside a mother.
#[derive(Debug, Clone)]
pub struct Placement {
    pub name: String,
    pub logical: LogicalId,
    pub mother: Option<LogicalId>,
    pub layout: PlacementLayout,
}

/// One level of a located point: which placement and copy, and its global frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub placement: PlacementId,
    pub logical: LogicalId,
    pub copy_no: i32,
    pub transform: Transform,
}

/// The placement path from the world down to the volume containing a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Touchable {
    pub levels: Vec<Level>,
}

impl Touchable {
    pub fn deepest(&self) -> &Level {
        // locate never returns an empty path
        &self.levels[self.levels.len() - 1]
    }

    pub fn logical(&self) -> LogicalId {
        self.deepest().logical
    }

    /// Copy number `depth` levels above the deepest volume; 0 is the volume itself.
    pub fn replica_number(&self, depth: usize) -> i32 {
        if depth >= self.levels.len() {
            return 0;
        }
        self.levels[self.levels.len() - 1 - depth].copy_no
    }
}

/// Arena of logical volumes and placements forming the geometry tree
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub logicals: Vec<LogicalVolume>,
    pub placements: Vec<Placement>,
    pub world: Option<PlacementId>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_logical(&mut self, name: &str, solid: Solid, material: MaterialId) -> LogicalId {
        self.logicals.push(LogicalVolume {
            name: name.to_string(),
            solid,
            material,
            daughters: Vec::new(),
            sensitive: false,
        });
        self.logicals.len() - 1
    }

    pub fn logical(&self, id: LogicalId) -> &LogicalVolume {
        &self.logicals[id]
    }

    pub fn set_sensitive(&mut self, id: LogicalId) {
        self.logicals[id].sensitive = true;
    }

    pub fn place_world(&mut self, name: &str, logical: LogicalId) -> PlacementId {
        self.placements.push(Placement {
            name: name.to_string(),
            logical,
            mother: None,
            layout: PlacementLayout::Single {
                transform: Transform::identity(),
                copy_no: 0,
            },
        });
        let id = self.placements.len() - 1;
        self.world = Some(id);
        id
    }

    pub fn place(
        &mut self,
        name: &str,
        logical: LogicalId,
        mother: LogicalId,
        transform: Transform,
        copy_no: i32,
    ) -> PlacementId {
        self.push_daughter(name, logical, mother, PlacementLayout::Single { transform, copy_no })
    }

    pub fn place_grid(
        &mut self,
        name: &str,
        logical: LogicalId,
        mother: LogicalId,
        grid: GridParameterisation,
    ) -> PlacementId {
        self.push_daughter(name, logical, mother, PlacementLayout::Grid(grid))
    }

    fn push_daughter(
        &mut self,
        name: &str,
        logical: LogicalId,
        mother: LogicalId,
        layout: PlacementLayout,
    ) -> PlacementId {
        self.placements.push(Placement {
            name: name.to_string(),
            logical,
            mother: Some(mother),
            layout,
        });
        let id = self.placements.len() - 1;
        self.logicals[mother].daughters.push(id);
        id
    }

    /// First placement registered under `name`
    pub fn physical_volume(&self, name: &str) -> Option<PlacementId> {
        self.placements.iter().position(|p| p.name == name)
    }

    /// Global transform of a placement, following the first instance of each mother.
    pub fn global_transform(&self, id: PlacementId) -> Transform {
        let placement = &self.placements[id];
        let local = match &placement.layout {
            PlacementLayout::Single { transform, .. } => *transform,
            PlacementLayout::Grid(grid) => Transform::from_translation(grid.translation(0)),
        };
        match placement.mother {
            None => local,
            Some(mother) => match self.placements.iter().position(|p| p.logical == mother) {
                Some(parent) => self.global_transform(parent).then(&local),
                None => local,
            },
        }
    }

    /// Find the deepest volume containing a global point.
    pub fn locate(&self, point: &Vec3) -> Option<Touchable> {
        let world_id = self.world?;
        let world = &self.placements[world_id];
        if !self.logicals[world.logical].solid.contains(point) {
            return None;
        }
        let mut levels = vec![Level {
            placement: world_id,
            logical: world.logical,
            copy_no: 0,
            transform: Transform::identity(),
        }];

        'descend: loop {
            let (current_logical, mother_transform) = {
                let current = &levels[levels.len() - 1];
                (current.logical, current.transform)
            };
            let local = mother_transform.to_local(point);
            for &daughter_id in &self.logicals[current_logical].daughters {
                let daughter = &self.placements[daughter_id];
                let solid = &self.logicals[daughter.logical].solid;
                let candidate = match &daughter.layout {
                    PlacementLayout::Single { transform, copy_no } => Some((*transform, *copy_no)),
                    PlacementLayout::Grid(grid) => grid.nearest_copy(&local).map(|c| {
                        (Transform::from_translation(grid.translation(c)), c as i32)
                    }),
                };
                if let Some((transform, copy_no)) = candidate {
                    if solid.contains(&transform.to_local(&local)) {
                        levels.push(Level {
                            placement: daughter_id,
                            logical: daughter.logical,
                            copy_no,
                            transform: mother_transform.then(&transform),
                        });
                        continue 'descend;
                    }
                }
            }
            break;
        }
        Some(Touchable { levels })
    }

    /// Distance from `point` along `direction` to the next boundary of the deepest
    /// volume of `touchable` or of any of its daughters.
    pub fn distance_to_boundary(&self, touchable: &Touchable, point: &Vec3, direction: &Vec3) -> f64 {
        let level = touchable.deepest();
        let logical = &self.logicals[level.logical];
        let p = level.transform.to_local(point);
        let d = level.transform.direction_to_local(direction);
        let mut distance = logical.solid.distance_to_out(&p, &d);

        for &daughter_id in &logical.daughters {
            let daughter = &self.placements[daughter_id];
            let solid = &self.logicals[daughter.logical].solid;
            match &daughter.layout {
                PlacementLayout::Single { transform, .. } => {
                    let pd = transform.to_local(&p);
                    let dd = transform.direction_to_local(&d);
                    if let Some(t) = solid.distance_to_in(&pd, &dd) {
                        distance = distance.min(t);
                    }
                }
                PlacementLayout::Grid(grid) => {
                    for copy in 0..grid.copies() {
                        let pd = p - grid.translation(copy);
                        if let Some(t) = solid.distance_to_in(&pd, &d) {
                            distance = distance.min(t);
                        }
                    }
                }
            }
        }
        distance
    }

    /// Print the placement tree below a placement, found by its own name or by
    /// the name of its logical volume.
    pub fn write_tree<W: Write>(&self, name: &str, out: &mut W) -> std::io::Result<bool> {
        let found = self
            .physical_volume(name)
            .or_else(|| self.placements.iter().position(|p| self.logicals[p.logical].name == name));
        let Some(id) = found else {
            return Ok(false);
        };
        self.write_subtree(id, 0, out)?;
        Ok(true)
    }

    fn write_subtree<W: Write>(&self, id: PlacementId, depth: usize, out: &mut W) -> std::io::Result<()> {
        let placement = &self.placements[id];
        let logical = &self.logicals[placement.logical];
        let count = match &placement.layout {
            PlacementLayout::Single { copy_no, .. } => format!("copy {}", copy_no),
            PlacementLayout::Grid(grid) => format!("{} copies", grid.copies()),
        };
        writeln!(out, "{}\"{}\":{} / \"{}\"", "  ".repeat(depth), placement.name, count, logical.name)?;
        for &daughter in &logical.daughters {
            self.write_subtree(daughter, depth + 1, out)?;
        }
        Ok(())
    }
}
