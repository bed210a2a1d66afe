use crate::error::{CcError, Result};
use crate::material::{Element, Material, MaterialId};

/// Container for the [`Material`] instances referenced by the geometry.
///
/// Materials are referenced by index ([`MaterialId`]). Named built-in
/// compositions are created on first request by [`Materials::find_or_build`]
/// and reused afterwards.
#[derive(Debug, Clone, Default)]
pub struct Materials {
    materials: Vec<Material>,
}

impl Materials {
    /// Create a new empty materials collection
    pub fn new() -> Self {
        Materials {
            materials: Vec::new(),
        }
    }

    /// Append a material to the collection and return its id
    pub fn append(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// Look up a material by name, building it from the built-in catalogue if needed.
    pub fn find_or_build(&mut self, name: &str) -> Result<MaterialId> {
        if let Some(id) = self.find(name) {
            return Ok(id);
        }
        let material = builtin(name)?;
        tracing::debug!("Built material {} ({} g/cm3)", name, material.density);
        Ok(self.append(material))
    }
}

fn el(symbol: &str) -> Result<Element> {
    Element::by_symbol(symbol).ok_or_else(|| CcError::UnknownMaterial(format!("element {}", symbol)))
}

fn atoms(name: &str, density: f64, formula: &[(&str, f64)]) -> Result<Material> {
    let counts = formula
        .iter()
        .map(|(s, n)| Ok((el(s)?, *n)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Material::from_atom_counts(name, density, &counts))
}

fn mass(name: &str, density: f64, fractions: &[(&str, f64)]) -> Result<Material> {
    let components = fractions
        .iter()
        .map(|(s, w)| Ok((el(s)?, *w)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Material::from_mass_fractions(name, density, &components))
}

/// Built-in compositions used by the fuel assembly and detector geometry.
fn builtin(name: &str) -> Result<Material> {
    match name {
        "G4_Galactic" => mass(name, 1e-25, &[("H", 1.0)]),
        "G4_AIR" => mass(
            name,
            1.20479e-3,
            &[("C", 0.000124), ("N", 0.755268), ("O", 0.231781), ("Ar", 0.012827)],
        ),
        "G4_WATER" => atoms(name, 1.0, &[("H", 2.0), ("O", 1.0)]),
        "G4_Al" => mass(name, 2.699, &[("Al", 1.0)]),
        "G4_Cu" => mass(name, 8.96, &[("Cu", 1.0)]),
        "G4_W" => mass(name, 19.3, &[("W", 1.0)]),
        "G4_Pb" => mass(name, 11.35, &[("Pb", 1.0)]),
        "G4_He" => mass(name, 1.66322e-4, &[("He", 1.0)]),
        "G4_MAGNESIUM_OXIDE" => atoms(name, 3.58, &[("Mg", 1.0), ("O", 1.0)]),
        "G4_POLYETHYLENE" => atoms(name, 0.94, &[("C", 2.0), ("H", 4.0)]),
        "G4_Pyrex_Glass" => mass(
            name,
            2.23,
            &[
                ("B", 0.040064),
                ("O", 0.539562),
                ("Na", 0.028191),
                ("Al", 0.011644),
                ("Si", 0.37722),
                ("K", 0.003321),
            ],
        ),
        "G4_SODIUM_IODIDE" => atoms(name, 3.667, &[("Na", 1.0), ("I", 1.0)]),
        "NaITl" => {
            let nai = builtin("G4_SODIUM_IODIDE")?;
            Ok(Material::mixture(name, 3.67, &[(&nai, 0.996)], &[(el("Tl")?, 0.004)]))
        }
        "GAGGCe" => {
            let gagg = atoms("GAGG", 6.63, &[("Gd", 3.0), ("Al", 2.0), ("Ga", 3.0), ("O", 12.0)])?;
            Ok(Material::mixture(name, 6.63, &[(&gagg, 0.99)], &[(el("Ce")?, 0.01)]))
        }
        "mLEU" => Ok(Material::from_mass_fractions(
            name,
            10.52,
            &[(Element::enriched_uranium(0.042), 1.0)],
        )),
        "mNU" => Ok(Material::from_mass_fractions(
            name,
            10.43,
            &[(Element::enriched_uranium(0.0074), 1.0)],
        )),
        "Zir4" => mass(
            name,
            6.56,
            &[
                ("O", 0.001196),
                ("Cr", 0.000997),
                ("Fe", 0.001994),
                ("Zr", 0.981858),
                ("Sn", 0.01395),
            ],
        ),
        // 20 bar fill gas
        "HeGas" => mass(name, 1.842e-3, &[("He", 1.0)]),
        "SUS" => mass(name, 7.7, &[("C", 0.04), ("Fe", 0.88), ("Co", 0.08)]),
        "FusedSilica" => atoms(name, 2.201, &[("Si", 1.0), ("O", 2.0)]),
        "Polydimethylsiloxane" => atoms(name, 0.97, &[("Si", 1.0), ("O", 1.0), ("C", 2.0), ("H", 6.0)]),
        "BC630" => {
            let pdms = builtin("Polydimethylsiloxane")?;
            let silica = builtin("FusedSilica")?;
            Ok(Material::mixture(name, 1.06, &[(&pdms, 0.95), (&silica, 0.05)], &[]))
        }
        "BialkaliCathode" => atoms(name, 3.0, &[("Sb", 1.0), ("Rb", 1.0), ("Cs", 1.0)]),
        _ => Err(CcError::UnknownMaterial(name.to_string())),
    }
}
