//! LNOI400 technology description.
//!
//! A [`Technology`] bundles everything the host needs to turn 2D layouts
//! into 3D structures and to set up ports: mask layers, materials,
//! extrusion rules and the standard port cross-sections. It is derived
//! deterministically from a flat set of [`TechnologyParams`].
//!
//! # Example
//!
//! ```
//! use lnoi400_pdk::technology::TechnologyParams;
//!
//! let tech = TechnologyParams::default().build().unwrap();
//! assert_eq!(tech.name(), "LNOI400");
//! assert!(tech.port_spec("RWG1000").is_some());
//! ```

mod default;
pub mod extrusion;
pub mod layers;
pub mod materials;
pub mod ports;

pub use default::{default_technology, set_default_technology, with_technology, ScopedTechnology};
pub use extrusion::{ExtrusionRule, Mask, Z_INF};
pub use layers::{Layer, LayerPurpose};
pub use materials::{Material, MaterialModel};
pub use ports::{PathProfile, PortKind, PortSpec};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Bound, ValidationError};
use crate::utils::cpw::{cpw_port_spec, CpwStack};

/// Technology name.
pub const TECHNOLOGY_NAME: &str = "LNOI400";

/// Fabrication parameters of the LNOI400 process.
///
/// Lengths are in µm, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TechnologyParams {
    /// Thickness of the LN film.
    pub ln_thickness: f64,
    /// LN left after the ridge etch.
    pub slab_thickness: f64,
    /// Sidewall angle of etched LN.
    pub sidewall_angle: f64,
    /// Buried oxide thickness.
    pub box_thickness: f64,
    /// Metal thickness.
    pub tl_thickness: f64,
    /// Oxide between the LN film and the metal.
    pub tl_separation: f64,
    /// Oxide on top of the metal when the top opening is enabled.
    pub cladding_thickness: f64,
    /// Extrude the silicon handle below the buried oxide.
    pub include_substrate: bool,
    /// Replace the background above the cladding with air.
    pub include_top_opening: bool,
}

impl Default for TechnologyParams {
    fn default() -> Self {
        Self {
            ln_thickness: 0.4,
            slab_thickness: 0.2,
            sidewall_angle: 13.0,
            box_thickness: 4.7,
            tl_thickness: 0.9,
            tl_separation: 1.0,
            cladding_thickness: 0.0,
            include_substrate: false,
            include_top_opening: false,
        }
    }
}

const fn min(limit: f64, inclusive: bool) -> Bound {
    Bound::Min { limit, inclusive }
}

const fn max(limit: f64, inclusive: bool) -> Bound {
    Bound::Max { limit, inclusive }
}

impl TechnologyParams {
    /// Returns every numeric parameter with its valid range.
    fn ranges(&self) -> [(&'static str, f64, [Bound; 2]); 7] {
        [
            ("ln_thickness", self.ln_thickness, [min(0.0, false), max(2.0, true)]),
            (
                "slab_thickness",
                self.slab_thickness,
                [min(0.0, true), max(self.ln_thickness, false)],
            ),
            ("sidewall_angle", self.sidewall_angle, [min(0.0, true), max(45.0, false)]),
            ("box_thickness", self.box_thickness, [min(0.0, false), max(20.0, true)]),
            ("tl_thickness", self.tl_thickness, [min(0.0, false), max(5.0, true)]),
            ("tl_separation", self.tl_separation, [min(0.0, true), max(10.0, true)]),
            (
                "cladding_thickness",
                self.cladding_thickness,
                [min(0.0, true), max(20.0, true)],
            ),
        ]
    }

    /// Validates all parameters.
    ///
    /// # Errors
    ///
    /// Returns the first parameter found outside its range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (parameter, value, bounds) in self.ranges() {
            for bound in std::iter::once(Bound::Finite).chain(bounds) {
                if !bound.admits(value) {
                    return Err(ValidationError {
                        parameter,
                        value,
                        bound,
                    });
                }
            }
        }
        Ok(())
    }

    /// Height of the bottom of the metal layer.
    #[must_use]
    pub fn metal_bottom(&self) -> f64 {
        self.ln_thickness + self.tl_separation
    }

    /// Height of the top of the metal layer.
    #[must_use]
    pub fn metal_top(&self) -> f64 {
        self.metal_bottom() + self.tl_thickness
    }

    /// Validates the parameters and builds the technology.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any parameter is out of range.
    pub fn build(&self) -> Result<Technology, ValidationError> {
        lnoi400(self)
    }
}

/// Per-layer manufacturability limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignRules {
    /// Minimum feature width per layer (µm).
    pub min_feature: IndexMap<String, f64>,
}

impl DesignRules {
    fn derive(rules: &[ExtrusionRule], params: &TechnologyParams) -> Self {
        let mut min_feature: IndexMap<String, f64> = IndexMap::new();
        for rule in rules.iter().filter(|r| r.sidewall_angle != 0.0) {
            let width = 2.0 * rule.thickness() * rule.sidewall_angle.abs().to_radians().tan();
            for layer in rule.mask.layers() {
                let entry = min_feature.entry(layer.to_string()).or_insert(0.0);
                *entry = entry.max(width);
            }
        }
        for metal in [layers::TL, layers::HT] {
            min_feature.insert(metal.to_string(), params.tl_thickness);
        }
        Self { min_feature }
    }
}

/// An immutable process description.
///
/// Share it behind an [`Arc`](std::sync::Arc); nothing in the crate mutates
/// a technology after [`lnoi400`] returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Technology {
    name: String,
    version: String,
    parameters: TechnologyParams,
    layers: IndexMap<String, Layer>,
    materials: IndexMap<String, Material>,
    extrusion_rules: Vec<ExtrusionRule>,
    ports: IndexMap<String, PortSpec>,
    background_material: String,
    design_rules: DesignRules,
}

impl Technology {
    /// Technology name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Technology version; tracks the library version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parameters the technology was built from.
    #[must_use]
    pub const fn parameters(&self) -> &TechnologyParams {
        &self.parameters
    }

    /// All layers, keyed by name.
    #[must_use]
    pub const fn layers(&self) -> &IndexMap<String, Layer> {
        &self.layers
    }

    /// Looks up a layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// All materials, keyed by name.
    #[must_use]
    pub const fn materials(&self) -> &IndexMap<String, Material> {
        &self.materials
    }

    /// Looks up a material by name.
    #[must_use]
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Extrusion rules, in application order.
    #[must_use]
    pub fn extrusion_rules(&self) -> &[ExtrusionRule] {
        &self.extrusion_rules
    }

    /// All standard port specifications, keyed by name.
    #[must_use]
    pub const fn port_specs(&self) -> &IndexMap<String, PortSpec> {
        &self.ports
    }

    /// Looks up a port specification by name.
    #[must_use]
    pub fn port_spec(&self, name: &str) -> Option<&PortSpec> {
        self.ports.get(name)
    }

    /// Name of the standard port specification equal to `spec`, if any.
    #[must_use]
    pub fn port_spec_name(&self, spec: &PortSpec) -> Option<&str> {
        self.ports
            .iter()
            .find(|(_, s)| *s == spec)
            .map(|(name, _)| name.as_str())
    }

    /// Material filling everything not covered by an extrusion.
    #[must_use]
    pub fn background_material(&self) -> &str {
        &self.background_material
    }

    /// Derived design rules.
    #[must_use]
    pub const fn design_rules(&self) -> &DesignRules {
        &self.design_rules
    }

    /// Minimum manufacturable feature width on `layer` (0 if unconstrained).
    #[must_use]
    pub fn min_feature_width(&self, layer: &str) -> f64 {
        self.design_rules
            .min_feature
            .get(layer)
            .copied()
            .unwrap_or(0.0)
    }

    /// Dielectric stack seen by transmission lines on the metal layer.
    #[must_use]
    pub fn cpw_stack(&self) -> CpwStack {
        CpwStack::from_params(&self.parameters)
    }
}

/// Builds the LNOI400 technology.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first parameter outside its
/// valid range; nothing is built in that case.
pub fn lnoi400(params: &TechnologyParams) -> Result<Technology, ValidationError> {
    params.validate()?;

    let layers: IndexMap<String, Layer> = layers::lnoi400_layers()
        .into_iter()
        .map(|l| (l.name.clone(), l))
        .collect();
    let materials: IndexMap<String, Material> = materials::lnoi400_materials()
        .into_iter()
        .map(|m| (m.name.clone(), m))
        .collect();

    let extrusion_rules = extrusion_rules(params);
    debug_assert!(extrusion::overlapping_rules(&extrusion_rules).is_empty());
    let design_rules = DesignRules::derive(&extrusion_rules, params);
    let ports = port_specs(params);

    debug!(
        rules = extrusion_rules.len(),
        ports = ports.len(),
        "built {TECHNOLOGY_NAME} technology"
    );

    Ok(Technology {
        name: TECHNOLOGY_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        parameters: params.clone(),
        layers,
        materials,
        extrusion_rules,
        ports,
        background_material: materials::SIO2.to_string(),
        design_rules,
    })
}

fn extrusion_rules(p: &TechnologyParams) -> Vec<ExtrusionRule> {
    use layers::{ALIGN, HT, LABELS, LN_RIB, LN_STRIP, RIB_NEGATIVE, TL};
    use materials::{AU, LINBO3, OPENING, SI, SIO2};

    let names = |l: &[&str]| l.iter().map(ToString::to_string).collect::<Vec<_>>();
    let z_tl = p.metal_bottom();
    let z_top = p.metal_top();

    let mut rules = vec![
        ExtrusionRule::new(Mask::Bounds, LINBO3, (0.0, p.slab_thickness)),
        ExtrusionRule::new(
            Mask::Union(names(&[LN_STRIP, LABELS, ALIGN])),
            LINBO3,
            (0.0, p.ln_thickness),
        )
        .with_sidewall(p.sidewall_angle),
        ExtrusionRule::new(
            Mask::Difference(names(&[RIB_NEGATIVE]), names(&[LN_RIB])),
            SIO2,
            (0.0, p.ln_thickness),
        )
        .with_sidewall(-p.sidewall_angle),
        ExtrusionRule::new(Mask::Union(names(&[TL])), AU, (z_tl, z_top)),
        ExtrusionRule::new(Mask::Union(names(&[HT])), AU, (z_tl, z_top)),
    ];
    if p.include_substrate {
        rules.push(ExtrusionRule::new(Mask::Bounds, SI, (-Z_INF, -p.box_thickness)));
    }
    if p.include_top_opening {
        rules.push(ExtrusionRule::new(
            Mask::Bounds,
            OPENING,
            (z_top + p.cladding_thickness, Z_INF),
        ));
    }
    rules
}

fn optical_spec(
    description: &str,
    width: f64,
    limits: (f64, f64),
    num_modes: u32,
    profiles: Vec<PathProfile>,
) -> PortSpec {
    PortSpec {
        description: description.to_string(),
        kind: PortKind::Optical,
        width,
        limits,
        num_modes,
        target_neff: 2.2,
        path_profiles: profiles,
    }
}

fn port_specs(p: &TechnologyParams) -> IndexMap<String, PortSpec> {
    use layers::{LN_RIB, LN_STRIP, RIB_NEGATIVE, TL};

    let rwg_gap = p.box_thickness.min(1.5);
    let rwg_limits = (-rwg_gap, p.ln_thickness + rwg_gap);
    let swg_gap = p.box_thickness.min(2.1);
    let swg_limits = (-swg_gap, p.slab_thickness + swg_gap);
    let stack = CpwStack::from_params(p);

    let mut ports = IndexMap::new();
    ports.insert(
        "RWG1000".to_string(),
        optical_spec(
            "LN single mode ridge waveguide for C-band, TE mode",
            6.0,
            rwg_limits,
            2,
            vec![PathProfile::new(1.0, 0.0, LN_STRIP), PathProfile::new(10.0, 0.0, LN_RIB)],
        ),
    );
    ports.insert(
        "RWG3000".to_string(),
        optical_spec(
            "LN multimode ridge waveguide for C-band, TE mode",
            8.0,
            rwg_limits,
            5,
            vec![PathProfile::new(3.0, 0.0, LN_STRIP), PathProfile::new(12.0, 0.0, LN_RIB)],
        ),
    );
    ports.insert(
        "SWG250".to_string(),
        optical_spec(
            "LN strip waveguide for C-band, TE mode",
            10.0,
            swg_limits,
            1,
            vec![
                PathProfile::new(0.25, 0.0, LN_RIB),
                PathProfile::new(12.0, 0.0, RIB_NEGATIVE),
            ],
        ),
    );
    ports.insert(
        "UniCPW".to_string(),
        cpw_port_spec(&stack, "Coplanar transmission line", 15.0, 5.0, 250.0, TL),
    );
    ports.insert(
        "UniCPW-EO".to_string(),
        cpw_port_spec(
            &stack,
            "Coplanar transmission line for electro-optic modulation",
            10.0,
            4.0,
            180.0,
            TL,
        ),
    );
    ports
}
