//! Material models used by the extrusion rules.
//!
//! Optical properties are given at telecom wavelengths; every dielectric
//! additionally carries its low-frequency relative permittivity, which the
//! CPW sizing in [`crate::utils::cpw`] uses.

use serde::{Deserialize, Serialize};

/// Optical or electrical model of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialModel {
    /// Non-dispersive refractive index.
    ConstantIndex {
        /// Refractive index.
        index: f64,
    },
    /// Single-pole Sellmeier model `n² = ε∞ + A·λ²/(λ² − B²)`, λ in µm.
    Sellmeier {
        /// High-frequency permittivity ε∞.
        eps_inf: f64,
        /// Oscillator strength A.
        strength: f64,
        /// Resonance wavelength B (µm).
        resonance: f64,
    },
    /// Non-dispersive relative permittivity.
    Permittivity {
        /// Relative permittivity.
        permittivity: f64,
    },
    /// Metal described by its DC conductivity.
    Conductor {
        /// Conductivity (S/m).
        conductivity: f64,
    },
}

/// A named material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Material model.
    pub model: MaterialModel,
    /// Relative permittivity at RF frequencies (`None` for conductors).
    pub rf_permittivity: Option<f64>,
}

impl Material {
    /// Returns the refractive index at `wavelength` (µm), if the material
    /// has an optical model.
    #[must_use]
    pub fn refractive_index(&self, wavelength: f64) -> Option<f64> {
        match self.model {
            MaterialModel::ConstantIndex { index } => Some(index),
            MaterialModel::Sellmeier {
                eps_inf,
                strength,
                resonance,
            } => {
                let l2 = wavelength * wavelength;
                let n2 = eps_inf + strength * l2 / (l2 - resonance * resonance);
                (n2 > 0.0).then(|| n2.sqrt())
            }
            MaterialModel::Permittivity { permittivity } => Some(permittivity.sqrt()),
            MaterialModel::Conductor { .. } => None,
        }
    }
}

/// Silicon dioxide: buried oxide and cladding.
pub const SIO2: &str = "SiO2";
/// Crystalline silicon substrate.
pub const SI: &str = "cSi";
/// Lithium niobate thin film.
pub const LINBO3: &str = "LiNbO3";
/// Gold electrodes.
pub const AU: &str = "Au";
/// Air above the top cladding opening.
pub const OPENING: &str = "Opening";

/// RF relative permittivity of silicon dioxide.
pub const SIO2_RF_PERMITTIVITY: f64 = 3.9;
/// RF relative permittivity of crystalline silicon.
pub const SI_RF_PERMITTIVITY: f64 = 11.7;
/// RF relative permittivity of lithium niobate (extraordinary axis).
pub const LINBO3_RF_PERMITTIVITY: f64 = 28.0;

/// Returns the LNOI400 material set.
#[must_use]
pub fn lnoi400_materials() -> Vec<Material> {
    vec![
        Material {
            name: SIO2.to_string(),
            model: MaterialModel::ConstantIndex { index: 1.444 },
            rf_permittivity: Some(SIO2_RF_PERMITTIVITY),
        },
        Material {
            name: SI.to_string(),
            model: MaterialModel::ConstantIndex { index: 3.48 },
            rf_permittivity: Some(SI_RF_PERMITTIVITY),
        },
        // Ordinary axis; x-cut films are used with TE modes along it.
        Material {
            name: LINBO3.to_string(),
            model: MaterialModel::Sellmeier {
                eps_inf: 1.834,
                strength: 3.0,
                resonance: 0.203_15,
            },
            rf_permittivity: Some(LINBO3_RF_PERMITTIVITY),
        },
        Material {
            name: AU.to_string(),
            model: MaterialModel::Conductor {
                conductivity: 4.1e7,
            },
            rf_permittivity: None,
        },
        Material {
            name: OPENING.to_string(),
            model: MaterialModel::Permittivity { permittivity: 1.0 },
            rf_permittivity: Some(1.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(name: &str) -> Material {
        lnoi400_materials()
            .into_iter()
            .find(|m| m.name == name)
            .unwrap()
    }

    #[test]
    fn lithium_niobate_index_at_1550() {
        let n = get(LINBO3).refractive_index(1.55).unwrap();
        assert!((n - 2.21).abs() < 0.01, "n = {n}");
    }

    #[test]
    fn conductor_has_no_index() {
        let au = get(AU);
        assert!(au.refractive_index(1.55).is_none());
        assert!(au.rf_permittivity.is_none());
    }

    #[test]
    fn opening_is_vacuum() {
        let n = get(OPENING).refractive_index(1.0).unwrap();
        assert!((n - 1.0).abs() < f64::EPSILON);
    }
}
