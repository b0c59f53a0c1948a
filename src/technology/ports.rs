//! Standard port cross-sections.
//!
//! A [`PortSpec`] describes the cross-section a port expects on the other
//! side: the drawn path profiles, the port width and z limits used by the
//! mode solver of the host, and the mode count.

use serde::{Deserialize, Serialize};

/// Whether a port carries an optical mode or an electrical signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Guided optical mode.
    Optical,
    /// Quasi-TEM electrical signal.
    Electrical,
}

/// One drawn strip of a cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathProfile {
    /// Strip width (µm).
    pub width: f64,
    /// Lateral offset of the strip centre from the port centre (µm).
    pub offset: f64,
    /// Layer the strip is drawn on.
    pub layer: String,
}

impl PathProfile {
    /// Creates a profile.
    #[must_use]
    pub fn new(width: f64, offset: f64, layer: &str) -> Self {
        Self {
            width,
            offset,
            layer: layer.to_string(),
        }
    }
}

/// A standard port cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Human readable description.
    pub description: String,
    /// Port kind.
    pub kind: PortKind,
    /// Port width (µm).
    pub width: f64,
    /// Vertical extent of the port (µm).
    pub limits: (f64, f64),
    /// Number of modes to compute.
    pub num_modes: u32,
    /// Effective index used as mode-solver target.
    pub target_neff: f64,
    /// Drawn strips making up the cross-section.
    pub path_profiles: Vec<PathProfile>,
}

impl PortSpec {
    /// The narrowest centred profile: the waveguide core.
    #[must_use]
    pub fn core(&self) -> Option<&PathProfile> {
        self.centred().min_by(|a, b| a.width.total_cmp(&b.width))
    }

    /// The widest centred profile: the slab/cladding around the core.
    #[must_use]
    pub fn cladding(&self) -> Option<&PathProfile> {
        self.centred().max_by(|a, b| a.width.total_cmp(&b.width))
    }

    fn centred(&self) -> impl Iterator<Item = &PathProfile> {
        self.path_profiles.iter().filter(|p| p.offset == 0.0)
    }

    /// Returns a copy with every profile widened by `added_width`.
    #[must_use]
    pub fn widened(&self, added_width: f64) -> Self {
        let mut spec = self.clone();
        for profile in &mut spec.path_profiles {
            profile.width += added_width;
        }
        spec
    }

    /// Returns `true` if the port carries an electrical signal.
    #[must_use]
    pub fn is_electrical(&self) -> bool {
        self.kind == PortKind::Electrical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rib() -> PortSpec {
        PortSpec {
            description: "rib".into(),
            kind: PortKind::Optical,
            width: 6.0,
            limits: (-1.5, 1.9),
            num_modes: 2,
            target_neff: 2.2,
            path_profiles: vec![
                PathProfile::new(1.0, 0.0, "CORE"),
                PathProfile::new(10.0, 0.0, "SLAB"),
            ],
        }
    }

    #[test]
    fn core_and_cladding() {
        let spec = rib();
        assert_eq!(spec.core().unwrap().layer, "CORE");
        assert_eq!(spec.cladding().unwrap().layer, "SLAB");
        assert!(!spec.is_electrical());
    }

    #[test]
    fn widening_keeps_layers() {
        let spec = rib().widened(1.5);
        assert!((spec.core().unwrap().width - 2.5).abs() < 1e-12);
        assert!((spec.cladding().unwrap().width - 11.5).abs() < 1e-12);
    }
}
