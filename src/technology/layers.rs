//! Mask layers of the LNOI400 process.

use serde::{Deserialize, Serialize};

/// What a mask layer is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPurpose {
    /// Partial LN etch defining ridge waveguide cores.
    RidgeCore,
    /// Full LN etch defining the slab around waveguides.
    Slab,
    /// Negative slab etch (regions where the slab is removed).
    SlabNegative,
    /// Text etched into LN.
    Label,
    /// Usable floorplan area.
    ChipContour,
    /// Final chip boundary including the exclusion zone.
    ChipExclusion,
    /// Metal transmission lines.
    Metal,
    /// Metal heaters.
    Heater,
    /// Alignment markers etched into LN.
    Alignment,
    /// Layout annotations, never fabricated.
    Documentation,
}

impl LayerPurpose {
    /// Returns `true` for layers that end up on the wafer.
    #[must_use]
    pub const fn is_fabricated(&self) -> bool {
        !matches!(self, Self::Documentation)
    }
}

/// A named mask layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer name used throughout the library.
    pub name: String,
    /// GDS layer number.
    pub layer: u16,
    /// GDS datatype.
    pub datatype: u16,
    /// Layer purpose.
    pub purpose: LayerPurpose,
    /// Human readable description.
    pub description: String,
    /// Display colour as `#RRGGBBAA`.
    pub color: String,
    /// Display fill pattern.
    pub pattern: String,
}

impl Layer {
    fn new(
        name: &str,
        gds: (u16, u16),
        purpose: LayerPurpose,
        description: &str,
        color: &str,
        pattern: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            layer: gds.0,
            datatype: gds.1,
            purpose,
            description: description.to_string(),
            color: color.to_string(),
            pattern: pattern.to_string(),
        }
    }

    /// Returns the GDS `(layer, datatype)` pair.
    #[must_use]
    pub const fn gds(&self) -> (u16, u16) {
        (self.layer, self.datatype)
    }
}

/// Ridge waveguide cores, partially etched LN.
pub const LN_STRIP: &str = "LN_STRIP";
/// Slab kept around the ridges inside `RIB_NEGATIVE` windows.
pub const LN_RIB: &str = "LN_RIB";
/// Slab etch window; the slab is removed there except under `LN_RIB`.
pub const RIB_NEGATIVE: &str = "RIB_NEGATIVE";
/// Text labels etched into LN.
pub const LABELS: &str = "LABELS";
/// Usable floorplan area.
pub const CHIP_CONTOUR: &str = "CHIP_CONTOUR";
/// Final chip boundary.
pub const CHIP_EXCLUSION_ZONE: &str = "CHIP_EXCLUSION_ZONE";
/// Transmission line metal.
pub const TL: &str = "TL";
/// Heater metal.
pub const HT: &str = "HT";
/// Alignment marks.
pub const ALIGN: &str = "ALIGN";
/// Documentation only, not fabricated.
pub const DOC: &str = "DOC";

/// Returns the LNOI400 layer table, in GDS order.
#[must_use]
pub fn lnoi400_layers() -> Vec<Layer> {
    use LayerPurpose as P;
    vec![
        Layer::new(LN_STRIP, (2, 0), P::RidgeCore, "LN etch (ridge)", "#7d57de18", "//"),
        Layer::new(LN_RIB, (3, 0), P::Slab, "LN etch (full)", "#00008018", "\\"),
        Layer::new(RIB_NEGATIVE, (3, 1), P::SlabNegative, "Slab etch negative", "#6750bf18", "\\"),
        Layer::new(LABELS, (4, 0), P::Label, "Labels (LN etch)", "#5179b518", "/"),
        Layer::new(CHIP_CONTOUR, (6, 0), P::ChipContour, "Usable floorplan area", "#ffc6b818", "\\"),
        Layer::new(
            CHIP_EXCLUSION_ZONE,
            (6, 1),
            P::ChipExclusion,
            "Final chip boundaries",
            "#00fe9c18",
            "/",
        ),
        Layer::new(TL, (21, 0), P::Metal, "Metal transmission lines", "#3503fc18", "\\"),
        Layer::new(HT, (21, 1), P::Heater, "Metal heaters", "#3503fc18", "."),
        Layer::new(ALIGN, (31, 0), P::Alignment, "Alignment markers (LN etch)", "#5179b518", "/"),
        Layer::new(
            DOC,
            (201, 0),
            P::Documentation,
            "Labels for GDS layout (not fabricated)",
            "#80a8ff18",
            ".",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gds_pairs_are_unique() {
        let layers = lnoi400_layers();
        for (i, a) in layers.iter().enumerate() {
            for b in &layers[i + 1..] {
                assert_ne!(a.gds(), b.gds(), "{} and {} share a GDS pair", a.name, b.name);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn documentation_is_not_fabricated() {
        let doc = lnoi400_layers().into_iter().find(|l| l.name == DOC).unwrap();
        assert_eq!(doc.gds(), (201, 0));
        assert!(!doc.purpose.is_fabricated());
    }
}
