use crate::bounding_box::BoundingBox;
use crate::Vec3;

/// Points within this distance of a surface count as on it.
pub const SURFACE_TOLERANCE: f64 = 1e-9;

/// Primitive solids, each described in its own local frame centred on the origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Solid {
    /// Axis-aligned box given by its half lengths.
    Box { half: Vec3 },
    /// Solid cylinder along z.
    Tube { radius: f64, half_z: f64 },
}

impl Solid {
    pub fn new_box(half_x: f64, half_y: f64, half_z: f64) -> Self {
        Solid::Box {
            half: Vec3::new(half_x, half_y, half_z),
        }
    }

    pub fn new_tube(radius: f64, half_z: f64) -> Self {
        Solid::Tube { radius, half_z }
    }

    pub fn half_z(&self) -> f64 {
        match self {
            Solid::Box { half } => half.z,
            Solid::Tube { half_z, .. } => *half_z,
        }
    }

    /// Half extent along x (the radius for a tube).
    pub fn half_x(&self) -> f64 {
        match self {
            Solid::Box { half } => half.x,
            Solid::Tube { radius, .. } => *radius,
        }
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        match self {
            Solid::Box { half } => (0..3).all(|i| p[i].abs() <= half[i] + SURFACE_TOLERANCE),
            Solid::Tube { radius, half_z } => {
                p.z.abs() <= half_z + SURFACE_TOLERANCE
                    && p.x * p.x + p.y * p.y <= (radius + SURFACE_TOLERANCE).powi(2)
            }
        }
    }

    pub fn bounding_limits(&self) -> BoundingBox {
        let half = match self {
            Solid::Box { half } => *half,
            Solid::Tube { radius, half_z } => Vec3::new(*radius, *radius, *half_z),
        };
        BoundingBox::new(-half, half)
    }

    /// Distance along `d` from an inside point `p` to the surface.
    pub fn distance_to_out(&self, p: &Vec3, d: &Vec3) -> f64 {
        match self {
            Solid::Box { half } => (0..3)
                .map(|i| slab_exit(p[i], d[i], half[i]))
                .fold(f64::INFINITY, f64::min)
                .max(0.0),
            Solid::Tube { radius, half_z } => {
                let axial = slab_exit(p.z, d.z, *half_z);
                let radial = match cylinder_interval(p, d, *radius) {
                    Some((_, t_exit)) => t_exit,
                    None => f64::INFINITY,
                };
                axial.min(radial).max(0.0)
            }
        }
    }

    /// Distance along `d` from an outside point `p` to the surface, if the ray enters.
    pub fn distance_to_in(&self, p: &Vec3, d: &Vec3) -> Option<f64> {
        match self {
            Solid::Box { half } => {
                let mut t_enter = f64::NEG_INFINITY;
                let mut t_exit = f64::INFINITY;
                for i in 0..3 {
                    let (lo, hi) = slab_interval(p[i], d[i], half[i])?;
                    t_enter = t_enter.max(lo);
                    t_exit = t_exit.min(hi);
                }
                entry_distance(t_enter, t_exit)
            }
            Solid::Tube { radius, half_z } => {
                let (z_lo, z_hi) = slab_interval(p.z, d.z, *half_z)?;
                let (r_lo, r_hi) = cylinder_interval(p, d, *radius)?;
                entry_distance(z_lo.max(r_lo), z_hi.min(r_hi))
            }
        }
    }
}

fn slab_exit(p: f64, d: f64, half: f64) -> f64 {
    if d > 0.0 {
        (half - p) / d
    } else if d < 0.0 {
        (-half - p) / d
    } else {
        f64::INFINITY
    }
}

/// Parameter interval in which the ray lies between the two slab planes.
fn slab_interval(p: f64, d: f64, half: f64) -> Option<(f64, f64)> {
    if d == 0.0 {
        if p.abs() <= half {
            Some((f64::NEG_INFINITY, f64::INFINITY))
        } else {
            None
        }
    } else {
        let t1 = (-half - p) / d;
        let t2 = (half - p) / d;
        Some((t1.min(t2), t1.max(t2)))
    }
}

/// Parameter interval in which the ray lies inside the infinite z-cylinder.
fn cylinder_interval(p: &Vec3, d: &Vec3, radius: f64) -> Option<(f64, f64)> {
    let a = d.x * d.x + d.y * d.y;
    let c = p.x * p.x + p.y * p.y - radius * radius;
    if a < 1e-14 {
        // parallel to the axis
        return if c <= 0.0 {
            Some((f64::NEG_INFINITY, f64::INFINITY))
        } else {
            None
        };
    }
    let b = 2.0 * (p.x * d.x + p.y * d.y);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    Some(((-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)))
}

fn entry_distance(t_enter: f64, t_exit: f64) -> Option<f64> {
    if t_exit > t_enter && t_enter >= -SURFACE_TOLERANCE && t_exit > SURFACE_TOLERANCE {
        Some(t_enter.max(0.0))
    } else {
        None
    }
}
