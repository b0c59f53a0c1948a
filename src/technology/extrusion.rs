//! Extrusion rules: which material fills which z range under which mask.

use serde::{Deserialize, Serialize};

/// Sentinel for unbounded z extents (µm).
pub const Z_INF: f64 = 1.0e6;

/// Boolean expression over mask layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "layers", rename_all = "snake_case")]
pub enum Mask {
    /// The whole chip area.
    Bounds,
    /// Union of the listed layers.
    Union(Vec<String>),
    /// Union of the first set minus union of the second.
    Difference(Vec<String>, Vec<String>),
}

impl Mask {
    /// Returns `true` if `layer` contributes positively to the mask.
    #[must_use]
    pub fn draws(&self, layer: &str) -> bool {
        match self {
            Self::Bounds => false,
            Self::Union(layers) | Self::Difference(layers, _) => layers.iter().any(|l| l == layer),
        }
    }

    /// Returns every layer named in the mask.
    #[must_use]
    pub fn layers(&self) -> Vec<&str> {
        match self {
            Self::Bounds => Vec::new(),
            Self::Union(a) => a.iter().map(String::as_str).collect(),
            Self::Difference(a, b) => a.iter().chain(b).map(String::as_str).collect(),
        }
    }
}

/// A single extrusion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionRule {
    /// Mask selecting the extruded area.
    pub mask: Mask,
    /// Name of the material filling the extrusion.
    pub material: String,
    /// Bottom of the extrusion (µm).
    pub z_min: f64,
    /// Top of the extrusion (µm).
    pub z_max: f64,
    /// Sidewall angle in degrees; positive values widen towards the bottom.
    pub sidewall_angle: f64,
    /// Whether this rule may stack with other rules of the same mask.
    #[serde(default)]
    pub multi_level: bool,
}

impl ExtrusionRule {
    /// Creates a rule with vertical sidewalls.
    #[must_use]
    pub fn new(mask: Mask, material: &str, z_range: (f64, f64)) -> Self {
        Self {
            mask,
            material: material.to_string(),
            z_min: z_range.0,
            z_max: z_range.1,
            sidewall_angle: 0.0,
            multi_level: false,
        }
    }

    /// Sets the sidewall angle.
    #[must_use]
    pub fn with_sidewall(mut self, angle: f64) -> Self {
        self.sidewall_angle = angle;
        self
    }

    /// Height of the extrusion.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.z_max - self.z_min
    }

    /// Returns `true` if the z ranges of both rules intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.z_min < other.z_max && other.z_min < self.z_max
    }
}

/// Returns index pairs of rules sharing a mask whose z ranges overlap,
/// ignoring pairs where either rule is declared multi-level.
#[must_use]
pub fn overlapping_rules(rules: &[ExtrusionRule]) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    for (i, a) in rules.iter().enumerate() {
        for (j, b) in rules.iter().enumerate().skip(i + 1) {
            if a.mask == b.mask && !(a.multi_level || b.multi_level) && a.overlaps(b) {
                found.push((i, j));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = ExtrusionRule::new(Mask::Bounds, "A", (0.0, 1.0));
        let b = ExtrusionRule::new(Mask::Bounds, "B", (1.0, 2.0));
        assert!(!a.overlaps(&b));
        assert!(overlapping_rules(&[a, b]).is_empty());
    }

    #[test]
    fn overlap_is_reported_per_mask() {
        let a = ExtrusionRule::new(Mask::Bounds, "A", (0.0, 1.0));
        let b = ExtrusionRule::new(Mask::Union(vec!["X".into()]), "B", (0.5, 2.0));
        let c = ExtrusionRule::new(Mask::Bounds, "C", (0.5, 2.0));
        assert_eq!(overlapping_rules(&[a.clone(), b, c.clone()]), vec![(0, 2)]);

        let mut c = c;
        c.multi_level = true;
        assert!(overlapping_rules(&[a, c]).is_empty());
    }

    #[test]
    fn mask_layers() {
        let m = Mask::Difference(vec!["A".into()], vec!["B".into()]);
        assert!(m.draws("A"));
        assert!(!m.draws("B"));
        assert_eq!(m.layers(), vec!["A", "B"]);
        assert!(!Mask::Bounds.draws("A"));
    }
}
