use crate::physics::{klein_nishina_cross_section, photoelectric_cross_section, PhysicsList};
use crate::units::{AVOGADRO, CM};

pub type MaterialId = usize;

/// A chemical element with its mean molar mass in g/mol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub z: u32,
    pub a: f64,
}

const ELEMENTS: &[Element] = &[
    Element { symbol: "H", z: 1, a: 1.008 },
    Element { symbol: "He", z: 2, a: 4.0026 },
    Element { symbol: "B", z: 5, a: 10.81 },
    Element { symbol: "C", z: 6, a: 12.011 },
    Element { symbol: "N", z: 7, a: 14.007 },
    Element { symbol: "O", z: 8, a: 15.999 },
    Element { symbol: "Na", z: 11, a: 22.990 },
    Element { symbol: "Mg", z: 12, a: 24.305 },
    Element { symbol: "Al", z: 13, a: 26.982 },
    Element { symbol: "Si", z: 14, a: 28.085 },
    Element { symbol: "Ar", z: 18, a: 39.948 },
    Element { symbol: "K", z: 19, a: 39.098 },
    Element { symbol: "Cr", z: 24, a: 51.996 },
    Element { symbol: "Fe", z: 26, a: 55.845 },
    Element { symbol: "Co", z: 27, a: 58.933 },
    Element { symbol: "Cu", z: 29, a: 63.546 },
    Element { symbol: "Ga", z: 31, a: 69.723 },
    Element { symbol: "Rb", z: 37, a: 85.468 },
    Element { symbol: "Zr", z: 40, a: 91.224 },
    Element { symbol: "Sn", z: 50, a: 118.71 },
    Element { symbol: "Sb", z: 51, a: 121.76 },
    Element { symbol: "I", z: 53, a: 126.90 },
    Element { symbol: "Cs", z: 55, a: 132.91 },
    Element { symbol: "Ce", z: 58, a: 140.12 },
    Element { symbol: "Gd", z: 64, a: 157.25 },
    Element { symbol: "W", z: 74, a: 183.84 },
    Element { symbol: "Tl", z: 81, a: 204.38 },
    Element { symbol: "Pb", z: 82, a: 207.2 },
    Element { symbol: "U", z: 92, a: 238.03 },
];

impl Element {
    pub fn by_symbol(symbol: &str) -> Option<Element> {
        ELEMENTS.iter().find(|e| e.symbol == symbol).copied()
    }

    /// Uranium with the given U-235 atom fraction, the rest U-238.
    pub fn enriched_uranium(u235_fraction: f64) -> Element {
        Element {
            symbol: "U",
            z: 92,
            a: u235_fraction * 235.04 + (1.0 - u235_fraction) * 238.05,
        }
    }
}

/// Macroscopic photon attenuation coefficients at one energy, per mm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhotonXs {
    pub compton: f64,
    pub photoelectric: f64,
}

impl PhotonXs {
    pub fn total(&self) -> f64 {
        self.compton + self.photoelectric
    }
}

/// A homogeneous material given by density (g/cm3) and element mass fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub density: f64,
    pub components: Vec<(Element, f64)>,
}

impl Material {
    /// Build from element mass fractions; fractions are renormalised to one.
    pub fn from_mass_fractions(name: &str, density: f64, components: &[(Element, f64)]) -> Self {
        let total: f64 = components.iter().map(|(_, w)| w).sum();
        let components = components
            .iter()
            .map(|(e, w)| (*e, if total > 0.0 { w / total } else { 0.0 }))
            .collect();
        Material {
            name: name.to_string(),
            density,
            components,
        }
    }

    /// Build from a chemical formula given as atom counts.
    pub fn from_atom_counts(name: &str, density: f64, atoms: &[(Element, f64)]) -> Self {
        let masses: Vec<(Element, f64)> = atoms.iter().map(|(e, n)| (*e, n * e.a)).collect();
        Self::from_mass_fractions(name, density, &masses)
    }

    /// Mix existing materials and extra elements by mass fraction.
    pub fn mixture(
        name: &str,
        density: f64,
        materials: &[(&Material, f64)],
        elements: &[(Element, f64)],
    ) -> Self {
        let mut components: Vec<(Element, f64)> = Vec::new();
        let mut add = |element: Element, w: f64| {
            match components.iter_mut().find(|(e, _)| e.symbol == element.symbol && e.a == element.a) {
                Some((_, existing)) => *existing += w,
                None => components.push((element, w)),
            }
        };
        for (material, fraction) in materials {
            for (element, w) in &material.components {
                add(*element, w * fraction);
            }
        }
        for (element, w) in elements {
            add(*element, *w);
        }
        Self::from_mass_fractions(name, density, &components)
    }

    /// Electrons per cm3
    pub fn electron_density(&self) -> f64 {
        self.density
            * AVOGADRO
            * self
                .components
                .iter()
                .map(|(e, w)| w * e.z as f64 / e.a)
                .sum::<f64>()
    }

    /// Attenuation coefficients at `energy` for the processes of `physics`.
    pub fn photon_xs(&self, energy: f64, physics: PhysicsList) -> PhotonXs {
        let per_cm_to_per_mm = 1.0 / CM;
        let compton = self.electron_density() * klein_nishina_cross_section(energy) * per_cm_to_per_mm;
        let photoelectric = if physics.photoelectric_enabled() {
            self.density
                * AVOGADRO
                * self
                    .components
                    .iter()
                    .map(|(e, w)| w / e.a * photoelectric_cross_section(e.z, energy))
                    .sum::<f64>()
                * per_cm_to_per_mm
        } else {
            0.0
        };
        PhotonXs {
            compton,
            photoelectric,
        }
    }

    /// Sample the distance to the next interaction; None when the material is transparent.
    pub fn sample_distance_to_collision<R: rand::Rng + ?Sized>(
        &self,
        xs: &PhotonXs,
        rng: &mut R,
    ) -> Option<f64> {
        let mu = xs.total();
        if mu <= 0.0 {
            return None;
        }
        let xi: f64 = 1.0 - rng.gen::<f64>();
        Some(-xi.ln() / mu)
    }
}
