//! Internal unit system: lengths in mm, energies in MeV, times in ns.

pub const MM: f64 = 1.0;
pub const CM: f64 = 10.0 * MM;
pub const M: f64 = 1000.0 * MM;

pub const MEV: f64 = 1.0;
pub const KEV: f64 = 1e-3 * MEV;
pub const EV: f64 = 1e-6 * MEV;

pub const NS: f64 = 1.0;

pub const DEG: f64 = std::f64::consts::PI / 180.0;

/// Speed of light in mm/ns
pub const C_LIGHT: f64 = 299.792458 * MM / NS;

/// Electron rest mass energy
pub const ELECTRON_MASS_C2: f64 = 0.51099895 * MEV;

/// Classical electron radius in cm
pub const CLASSIC_ELECTRON_RADIUS_CM: f64 = 2.8179403262e-13;

pub const AVOGADRO: f64 = 6.02214076e23;

pub const BARN_CM2: f64 = 1e-24;

/// Parse an energy unit keyword as used in macro files.
pub fn energy_unit(keyword: &str) -> Option<f64> {
    match keyword {
        "eV" => Some(EV),
        "keV" => Some(KEV),
        "MeV" => Some(MEV),
        "GeV" => Some(1e3 * MEV),
        _ => None,
    }
}

/// Parse a length unit keyword as used in macro files.
pub fn length_unit(keyword: &str) -> Option<f64> {
    match keyword {
        "mm" => Some(MM),
        "cm" => Some(CM),
        "m" => Some(M),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_units() {
        assert_eq!(energy_unit("keV"), Some(1e-3));
        assert_eq!(energy_unit("MeV"), Some(1.0));
        assert_eq!(energy_unit("furlong"), None);
    }

    #[test]
    fn test_length_units() {
        assert_eq!(length_unit("cm"), Some(10.0));
        assert_eq!(length_unit("m"), Some(1000.0));
    }
}
