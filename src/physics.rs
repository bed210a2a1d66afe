// Photon interaction physics for Monte Carlo transport

use crate::particle::Photon;
use crate::units::{BARN_CM2, CLASSIC_ELECTRON_RADIUS_CM, ELECTRON_MASS_C2, KEV};
use crate::Vec3;
use rand::Rng;

/// Photons below this energy deposit what is left at their current position.
pub const LOW_ENERGY_CUT: f64 = 1.0 * KEV;

/// 4√2 α⁴ σ_T in barn, prefactor of the K-shell photoelectric cross section.
const K_SHELL_PREFACTOR_BARN: f64 = 1.0671e-8;

/// Selectable set of photon processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhysicsList {
    /// Compton scattering and photoelectric absorption
    #[default]
    Standard,
    /// Compton scattering only
    ComptonOnly,
}

impl PhysicsList {
    /// Parse a physics list name, returning None for unknown names
    pub fn from_str_option(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "" => Some(PhysicsList::Standard),
            "compton-only" | "compton_only" | "compton" => Some(PhysicsList::ComptonOnly),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PhysicsList::Standard => "standard",
            PhysicsList::ComptonOnly => "compton-only",
        }
    }

    pub fn photoelectric_enabled(&self) -> bool {
        matches!(self, PhysicsList::Standard)
    }
}

/// Total Klein–Nishina cross section per free electron, in cm².
pub fn klein_nishina_cross_section(energy: f64) -> f64 {
    let k = energy / ELECTRON_MASS_C2;
    if k <= 0.0 {
        return 0.0;
    }
    let r_e2 = CLASSIC_ELECTRON_RADIUS_CM * CLASSIC_ELECTRON_RADIUS_CM;
    let one_2k = 1.0 + 2.0 * k;
    let log_term = one_2k.ln();
    let term1 = (1.0 + k) / (k * k) * (2.0 * (1.0 + k) / one_2k - log_term / k);
    let term2 = log_term / (2.0 * k);
    let term3 = (1.0 + 3.0 * k) / (one_2k * one_2k);
    2.0 * std::f64::consts::PI * r_e2 * (term1 + term2 - term3)
}

/// K-shell photoelectric cross section per atom (Born approximation), in cm².
pub fn photoelectric_cross_section(z: u32, energy: f64) -> f64 {
    if energy <= 0.0 {
        return 0.0;
    }
    let ratio = ELECTRON_MASS_C2 / energy;
    K_SHELL_PREFACTOR_BARN * (z as f64).powi(5) * ratio.powf(3.5) * BARN_CM2
}

/// Sample the scattered photon energy fraction and polar angle from Klein–Nishina.
///
/// Returns `(epsilon, cos_theta)` where the scattered energy is `epsilon * energy`.
pub fn sample_klein_nishina<R: Rng + ?Sized>(energy: f64, rng: &mut R) -> (f64, f64) {
    let e0_m = energy / ELECTRON_MASS_C2;
    let eps0 = 1.0 / (1.0 + 2.0 * e0_m);
    let eps0_sq = eps0 * eps0;
    let alpha1 = -eps0.ln();
    let alpha2 = alpha1 + 0.5 * (1.0 - eps0_sq);

    loop {
        let (epsilon, epsilon_sq) = if alpha1 > alpha2 * rng.gen::<f64>() {
            let e = (-alpha1 * rng.gen::<f64>()).exp();
            (e, e * e)
        } else {
            let e_sq = eps0_sq + (1.0 - eps0_sq) * rng.gen::<f64>();
            (e_sq.sqrt(), e_sq)
        };
        let one_cost = (1.0 - epsilon) / (epsilon * e0_m);
        let sin_t2 = one_cost * (2.0 - one_cost);
        let g_reject = 1.0 - epsilon * sin_t2 / (1.0 + epsilon_sq);
        if g_reject >= rng.gen::<f64>() {
            return (epsilon, 1.0 - one_cost);
        }
    }
}

/// Rotate a direction vector by angle theta (cos(theta)=mu) around arbitrary axis
/// This rotates u_old to a new direction with cosine mu relative to original
pub fn rotate_direction_3d(u_old: &Vec3, mu: f64, phi: f64) -> Vec3 {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Find a perpendicular vector to u_old
    let perp = if u_old.x.abs() < 0.99 {
        Vec3::new(1.0, 0.0, 0.0).cross(u_old).normalize()
    } else {
        Vec3::new(0.0, 1.0, 0.0).cross(u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    (mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho).normalize()
}

/// Compton-scatter a photon in place and return the energy given to the electron,
/// which is deposited locally. A scattered photon below the cut is absorbed as well.
pub fn compton_scatter<R: Rng + ?Sized>(photon: &mut Photon, rng: &mut R) -> f64 {
    let (epsilon, cos_theta) = sample_klein_nishina(photon.energy, rng);
    let scattered = epsilon * photon.energy;
    let mut deposit = photon.energy - scattered;
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    photon.direction = rotate_direction_3d(&photon.direction, cos_theta, phi);
    photon.energy = scattered;
    if scattered < LOW_ENERGY_CUT {
        deposit += scattered;
        photon.kill();
    }
    deposit
}

/// Absorb the photon and return its full energy as the local deposit.
pub fn photoelectric_absorb(photon: &mut Photon) -> f64 {
    let deposit = photon.energy;
    photon.energy = 0.0;
    photon.kill();
    deposit
}
