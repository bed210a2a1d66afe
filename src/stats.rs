use crate::Vec3;
use rand::Rng;

/// Angular distribution types - simplified enum approach
#[derive(Debug, Clone, PartialEq)]
pub enum AngularDistribution {
    Isotropic,
    /// Uniform within a cone of half-angle acos(cos_max) around +z
    Cone { cos_max: f64 },
}

impl AngularDistribution {
    pub fn new_cone(cos_max: f64) -> Self {
        Self::Cone {
            cos_max: cos_max.clamp(-1.0, 1.0),
        }
    }

    /// Sample a direction from this distribution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match self {
            AngularDistribution::Isotropic => sample_cone(-1.0, rng),
            AngularDistribution::Cone { cos_max } => sample_cone(*cos_max, rng),
        }
    }
}

/// Direction with cos(theta) uniform in [cos_max, 1] about +z; cos_max = -1 is isotropic.
fn sample_cone<R: Rng + ?Sized>(cos_max: f64, rng: &mut R) -> Vec3 {
    let xi1: f64 = rng.gen();
    let xi2: f64 = rng.gen();

    let mu = 1.0 - xi1 * (1.0 - cos_max); // cosine of polar angle
    let phi = 2.0 * std::f64::consts::PI * xi2; // azimuthal angle

    let sqrt_one_minus_mu2 = (1.0 - mu * mu).max(0.0).sqrt();
    Vec3::new(sqrt_one_minus_mu2 * phi.cos(), sqrt_one_minus_mu2 * phi.sin(), mu)
}

/// Uniform point in a disk of the given radius, without rejection.
pub fn sample_point_in_disk<R: Rng + ?Sized>(radius: f64, rng: &mut R) -> (f64, f64) {
    let r = radius * rng.gen::<f64>().sqrt();
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    (r * phi.cos(), r * phi.sin())
}
