//! Coplanar waveguide (CPW) sizing.
//!
//! The line impedance follows the quasi-static conformal-mapping model of a
//! finite-ground CPW over a layered dielectric: the capacitance of each
//! dielectric layer is added as a partial capacitance (Gevorgian), complete
//! elliptic integrals are evaluated through the arithmetic-geometric mean,
//! and the metal thickness is accounted for with Gupta's correction.
//!
//! # Example
//!
//! ```
//! use lnoi400_pdk::technology::default_technology;
//! use lnoi400_pdk::utils::cpw::{cpw_spec, CpwTarget};
//!
//! let tech = default_technology();
//! let spec = cpw_spec(&CpwTarget::new(50.0, 10.0, 180.0), &tech).unwrap();
//! assert!((spec.impedance - 50.0).abs() < 0.05);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{check_min_feature, ensure_positive, ParameterError, ParameterResult};
use crate::technology::materials::{LINBO3_RF_PERMITTIVITY, SIO2_RF_PERMITTIVITY, SI_RF_PERMITTIVITY};
use crate::technology::{layers, PathProfile, PortKind, PortSpec, Technology, TechnologyParams};

/// Largest gap considered when sizing a line (µm).
pub const MAX_CPW_GAP: f64 = 100.0;

/// Relative impedance tolerance guaranteed by [`cpw_spec`].
pub const IMPEDANCE_TOLERANCE: f64 = 1e-3;

/// Smallest gap tried on layers without a minimum feature width (µm).
const MIN_GAP: f64 = 1e-3;

const BISECTION_STEPS: usize = 200;

/// A dielectric layer of finite thickness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dielectric {
    /// Layer thickness (µm).
    pub thickness: f64,
    /// Relative permittivity at RF.
    pub permittivity: f64,
}

/// Dielectric environment of the metal layer.
///
/// Layers are listed from the metal outwards; each side ends in a
/// half-space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpwStack {
    /// Layers below the metal.
    pub below: Vec<Dielectric>,
    /// Permittivity of the half-space below the last layer.
    pub substrate_permittivity: f64,
    /// Layers above the metal.
    pub above: Vec<Dielectric>,
    /// Permittivity of the half-space above the last layer.
    pub cover_permittivity: f64,
    /// Height of the bottom of the metal (µm).
    pub metal_bottom: f64,
    /// Metal thickness (µm).
    pub metal_thickness: f64,
}

impl CpwStack {
    /// Stack seen by the TL/HT metal of the LNOI400 process.
    #[must_use]
    pub fn from_params(p: &TechnologyParams) -> Self {
        let below = vec![
            Dielectric {
                thickness: p.tl_separation,
                permittivity: SIO2_RF_PERMITTIVITY,
            },
            Dielectric {
                thickness: p.ln_thickness,
                permittivity: LINBO3_RF_PERMITTIVITY,
            },
            Dielectric {
                thickness: p.box_thickness,
                permittivity: SIO2_RF_PERMITTIVITY,
            },
        ];
        let substrate_permittivity = if p.include_substrate {
            SI_RF_PERMITTIVITY
        } else {
            SIO2_RF_PERMITTIVITY
        };
        let (above, cover_permittivity) = if p.include_top_opening {
            (
                vec![Dielectric {
                    thickness: p.cladding_thickness,
                    permittivity: SIO2_RF_PERMITTIVITY,
                }],
                1.0,
            )
        } else {
            (Vec::new(), SIO2_RF_PERMITTIVITY)
        };
        Self {
            below,
            substrate_permittivity,
            above,
            cover_permittivity,
            metal_bottom: p.metal_bottom(),
            metal_thickness: p.tl_thickness,
        }
    }

    /// Characteristic impedance and effective permittivity of a line.
    ///
    /// All dimensions must be positive.
    #[must_use]
    pub fn analyze(&self, signal_width: f64, gap: f64, ground_width: f64) -> LineParameters {
        let a = 0.5 * signal_width;
        let b = a + gap;
        let c = b + ground_width;
        let q0 = modulus_ratio(free_modulus(a, b, c));

        let filling = partial_capacitance(&self.below, self.substrate_permittivity, a, b, c, q0)
            + partial_capacitance(&self.above, self.cover_permittivity, a, b, c, q0);
        let mut eps = filling / (2.0 * q0);

        let t = self.metal_thickness;
        let q = if t > 0.0 {
            let delta = (1.25 * t / PI * (1.0 + (4.0 * PI * signal_width / t).ln()))
                .max(0.0)
                .min(0.5 * gap);
            let x = 0.7 * t / gap;
            eps -= (eps - 1.0) * x / (q0 + x);
            modulus_ratio(free_modulus(a + 0.5 * delta, b - 0.5 * delta, c))
        } else {
            q0
        };

        LineParameters {
            impedance: 30.0 * PI / eps.sqrt() / q,
            effective_permittivity: eps,
        }
    }
}

/// Electrical parameters of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineParameters {
    /// Characteristic impedance (Ω).
    pub impedance: f64,
    /// Effective relative permittivity.
    pub effective_permittivity: f64,
}

/// Sum of partial capacitances of one side, in units of 2ε₀.
fn partial_capacitance(layers: &[Dielectric], outer: f64, a: f64, b: f64, c: f64, q0: f64) -> f64 {
    let layers: Vec<&Dielectric> = layers.iter().filter(|l| l.thickness > 0.0).collect();
    let mut sum = outer * q0;
    let mut height = 0.0;
    for (i, layer) in layers.iter().enumerate() {
        height += layer.thickness;
        let next = layers.get(i + 1).map_or(outer, |l| l.permittivity);
        sum += (layer.permittivity - next) * modulus_ratio(layer_modulus(a, b, c, height));
    }
    sum
}

/// Modulus of a finite-ground CPW in a homogeneous half-space.
fn free_modulus(a: f64, b: f64, c: f64) -> f64 {
    (a / b) * ((1.0 - (b / c).powi(2)) / (1.0 - (a / c).powi(2))).sqrt()
}

/// Modulus of a finite-ground CPW over a layer of thickness `h`.
fn layer_modulus(a: f64, b: f64, c: f64, h: f64) -> f64 {
    let x = PI / (2.0 * h);
    let r_ab = sinh_ratio(a * x, b * x);
    let r_bc = sinh_ratio(b * x, c * x);
    let r_ac = sinh_ratio(a * x, c * x);
    r_ab * ((1.0 - r_bc * r_bc) / (1.0 - r_ac * r_ac)).sqrt()
}

/// `sinh(x) / sinh(y)` for positive arguments, without overflow.
fn sinh_ratio(x: f64, y: f64) -> f64 {
    (x - y).exp() * (-(-2.0 * x).exp_m1()) / (-(-2.0 * y).exp_m1())
}

/// `K(k) / K(k')` for the complete elliptic integral of the first kind.
fn modulus_ratio(k: f64) -> f64 {
    let k_prime = ((1.0 - k) * (1.0 + k)).sqrt();
    agm(1.0, k) / agm(1.0, k_prime)
}

fn agm(mut a: f64, mut b: f64) -> f64 {
    for _ in 0..64 {
        if (a - b).abs() <= 1e-15 * a {
            break;
        }
        (a, b) = (0.5 * (a + b), (a * b).sqrt());
    }
    a
}

/// Requested line properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpwTarget {
    /// Characteristic impedance (Ω).
    pub impedance: f64,
    /// Signal conductor width (µm).
    pub signal_width: f64,
    /// Width of each ground conductor (µm).
    pub ground_width: f64,
    /// Metal layer.
    pub layer: String,
}

impl CpwTarget {
    /// Target on the transmission-line metal layer.
    #[must_use]
    pub fn new(impedance: f64, signal_width: f64, ground_width: f64) -> Self {
        Self {
            impedance,
            signal_width,
            ground_width,
            layer: layers::TL.to_string(),
        }
    }
}

/// A sized coplanar waveguide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpwSpec {
    /// Signal conductor width (µm).
    pub signal_width: f64,
    /// Gap between signal and grounds (µm).
    pub gap: f64,
    /// Width of each ground conductor (µm).
    pub ground_width: f64,
    /// Metal layer.
    pub layer: String,
    /// Characteristic impedance (Ω).
    pub impedance: f64,
    /// Effective relative permittivity.
    pub effective_permittivity: f64,
    /// Target the line was sized for, if any.
    pub target: Option<CpwTarget>,
}

impl CpwSpec {
    /// Analyses a line of given dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is not positive, is narrower than the
    /// layer's minimum feature, or the layer is unknown.
    pub fn from_dimensions(
        signal_width: f64,
        gap: f64,
        ground_width: f64,
        layer: &str,
        tech: &Technology,
    ) -> ParameterResult<Self> {
        check_layer(layer, tech)?;
        for (parameter, value) in [
            ("signal_width", signal_width),
            ("gap", gap),
            ("ground_width", ground_width),
        ] {
            ensure_positive(parameter, value)?;
            check_min_feature(tech, parameter, value, layer)?;
        }
        let line = tech.cpw_stack().analyze(signal_width, gap, ground_width);
        Ok(Self {
            signal_width,
            gap,
            ground_width,
            layer: layer.to_string(),
            impedance: line.impedance,
            effective_permittivity: line.effective_permittivity,
            target: None,
        })
    }

    /// Port specification of the line.
    #[must_use]
    pub fn port_spec(&self, tech: &Technology) -> PortSpec {
        let description = format!(
            "CPW {}/{}/{} µm, {:.1} Ω",
            self.signal_width, self.gap, self.ground_width, self.impedance
        );
        cpw_port_spec(
            &tech.cpw_stack(),
            &description,
            self.signal_width,
            self.gap,
            self.ground_width,
            &self.layer,
        )
    }
}

fn check_layer(layer: &str, tech: &Technology) -> ParameterResult<()> {
    if tech.layer(layer).is_none() {
        return Err(ParameterError::UnknownLayer {
            name: layer.to_string(),
        });
    }
    Ok(())
}

/// Sizes the gap of a CPW to match `target.impedance`.
///
/// The gap is searched between the layer's minimum feature width and
/// [`MAX_CPW_GAP`]; the resulting impedance is within
/// [`IMPEDANCE_TOLERANCE`] of the target.
///
/// # Errors
///
/// Returns [`ParameterError::Unrealizable`] if no gap in that range reaches
/// the target, or another [`ParameterError`] for invalid widths or layer.
pub fn cpw_spec(target: &CpwTarget, tech: &Technology) -> ParameterResult<CpwSpec> {
    ensure_positive("impedance", target.impedance)?;
    ensure_positive("signal_width", target.signal_width)?;
    ensure_positive("ground_width", target.ground_width)?;
    check_layer(&target.layer, tech)?;
    check_min_feature(tech, "signal_width", target.signal_width, &target.layer)?;
    check_min_feature(tech, "ground_width", target.ground_width, &target.layer)?;

    let stack = tech.cpw_stack();
    let z = |gap: f64| stack.analyze(target.signal_width, gap, target.ground_width);

    let mut lo = tech.min_feature_width(&target.layer).max(MIN_GAP);
    let mut hi = MAX_CPW_GAP;
    let z_lo = z(lo).impedance;
    let z_hi = z(hi).impedance;
    let tolerance = IMPEDANCE_TOLERANCE * target.impedance;
    if target.impedance < z_lo - tolerance || target.impedance > z_hi + tolerance {
        return Err(ParameterError::Unrealizable {
            message: format!(
                "{} Ω with a {} µm signal and {} µm grounds on {} (realizable range {z_lo:.2} to {z_hi:.2} Ω)",
                target.impedance, target.signal_width, target.ground_width, target.layer
            ),
        });
    }

    let mut gap = if (target.impedance - z_lo).abs() <= (target.impedance - z_hi).abs() {
        lo
    } else {
        hi
    };
    for _ in 0..BISECTION_STEPS {
        if (z(gap).impedance - target.impedance).abs() <= 0.1 * tolerance {
            break;
        }
        gap = 0.5 * (lo + hi);
        if z(gap).impedance < target.impedance {
            lo = gap;
        } else {
            hi = gap;
        }
    }

    let line = z(gap);
    debug!(
        impedance = line.impedance,
        gap,
        eps_eff = line.effective_permittivity,
        "sized CPW"
    );
    Ok(CpwSpec {
        signal_width: target.signal_width,
        gap,
        ground_width: target.ground_width,
        layer: target.layer.clone(),
        impedance: line.impedance,
        effective_permittivity: line.effective_permittivity,
        target: Some(target.clone()),
    })
}

/// Builds the port specification of a CPW on `layer`.
///
/// Profiles are the signal conductor followed by the two grounds; the port
/// spans the full line width.
#[must_use]
pub fn cpw_port_spec(
    stack: &CpwStack,
    description: &str,
    signal_width: f64,
    gap: f64,
    ground_width: f64,
    layer: &str,
) -> PortSpec {
    let offset = 0.5 * (signal_width + ground_width) + gap;
    let width = signal_width + 2.0 * (gap + ground_width);
    let margin = 0.5 * width;
    let line = stack.analyze(signal_width, gap, ground_width);
    PortSpec {
        description: description.to_string(),
        kind: PortKind::Electrical,
        width,
        limits: (
            stack.metal_bottom - margin,
            stack.metal_bottom + stack.metal_thickness + margin,
        ),
        num_modes: 1,
        target_neff: line.effective_permittivity.sqrt(),
        path_profiles: vec![
            PathProfile::new(signal_width, 0.0, layer),
            PathProfile::new(ground_width, offset, layer),
            PathProfile::new(ground_width, -offset, layer),
        ],
    }
}

/// Geometry of a CPW port specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpwInfo {
    /// Signal conductor width (µm).
    pub signal_width: f64,
    /// Gap between signal and grounds (µm).
    pub gap: f64,
    /// Width of each ground conductor (µm).
    pub ground_width: f64,
    /// Distance between the signal centre and each ground centre (µm).
    pub ground_offset: f64,
    /// Metal layer.
    pub layer: String,
}

/// Extracts the CPW geometry from a port specification.
///
/// # Errors
///
/// Returns [`ParameterError::Constraint`] if `spec` is not a CPW: a centred
/// signal strip with a ground strip on either side.
pub fn cpw_info(spec: &PortSpec) -> ParameterResult<CpwInfo> {
    let not_cpw = || {
        ParameterError::constraint(
            "tl_port_spec",
            format!("'{}' is not a coplanar waveguide", spec.description),
        )
    };
    if spec.kind != PortKind::Electrical {
        return Err(not_cpw());
    }
    let signal = spec
        .path_profiles
        .iter()
        .find(|p| p.offset == 0.0)
        .ok_or_else(not_cpw)?;
    let ground = spec
        .path_profiles
        .iter()
        .find(|p| p.offset > 0.0)
        .ok_or_else(not_cpw)?;
    if !spec
        .path_profiles
        .iter()
        .any(|p| p.offset == -ground.offset && p.width == ground.width)
    {
        return Err(not_cpw());
    }
    let gap = ground.offset - 0.5 * (signal.width + ground.width);
    if gap <= 0.0 {
        return Err(not_cpw());
    }
    Ok(CpwInfo {
        signal_width: signal.width,
        gap,
        ground_width: ground.width,
        ground_offset: ground.offset,
        layer: signal.layer.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech() -> Technology {
        TechnologyParams::default().build().unwrap()
    }

    #[test]
    fn elliptic_ratio_is_one_at_symmetric_modulus() {
        let k = std::f64::consts::FRAC_1_SQRT_2;
        assert!((modulus_ratio(k) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sinh_ratio_survives_large_arguments() {
        let r = sinh_ratio(1000.0, 1001.0);
        assert!((r - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn thick_layer_approaches_half_space() {
        let (a, b, c) = (5.0, 9.0, 189.0);
        let k = layer_modulus(a, b, c, 1.0e6);
        assert!((k - free_modulus(a, b, c)).abs() < 1e-6);
    }

    #[test]
    fn homogeneous_stack_has_material_permittivity() {
        let stack = CpwStack {
            below: Vec::new(),
            substrate_permittivity: 3.9,
            above: Vec::new(),
            cover_permittivity: 3.9,
            metal_bottom: 0.0,
            metal_thickness: 0.0,
        };
        let line = stack.analyze(10.0, 4.0, 180.0);
        assert!((line.effective_permittivity - 3.9).abs() < 1e-12);
    }

    #[test]
    fn impedance_grows_with_gap() {
        let stack = tech().cpw_stack();
        let narrow = stack.analyze(10.0, 2.0, 180.0).impedance;
        let wide = stack.analyze(10.0, 20.0, 180.0).impedance;
        assert!(narrow < wide);
    }

    #[test]
    fn top_opening_lowers_permittivity() {
        let open = TechnologyParams {
            include_top_opening: true,
            ..TechnologyParams::default()
        }
        .build()
        .unwrap();
        let closed = tech().cpw_stack().analyze(10.0, 4.0, 180.0);
        let opened = open.cpw_stack().analyze(10.0, 4.0, 180.0);
        assert!(opened.effective_permittivity < closed.effective_permittivity);
        assert!(opened.impedance > closed.impedance);
    }

    #[test]
    fn sized_line_meets_tolerance() {
        let tech = tech();
        let spec = cpw_spec(&CpwTarget::new(50.0, 10.0, 180.0), &tech).unwrap();
        assert!((spec.impedance - 50.0).abs() <= 50.0 * IMPEDANCE_TOLERANCE);
        assert!(spec.gap > 4.0 && spec.gap < 10.0, "gap = {}", spec.gap);
        let again = CpwSpec::from_dimensions(10.0, spec.gap, 180.0, "TL", &tech).unwrap();
        assert!((again.impedance - spec.impedance).abs() < 1e-9);
    }

    #[test]
    fn unrealizable_targets() {
        let tech = tech();
        for z in [10.0, 500.0] {
            let err = cpw_spec(&CpwTarget::new(z, 10.0, 180.0), &tech).unwrap_err();
            assert!(matches!(err, ParameterError::Unrealizable { .. }));
        }
    }

    #[test]
    fn narrow_signal_is_rejected() {
        let err = cpw_spec(&CpwTarget::new(50.0, 0.5, 180.0), &tech()).unwrap_err();
        assert!(matches!(err, ParameterError::BelowMinimumFeature { .. }));
    }

    #[test]
    fn port_spec_round_trips_geometry() {
        let tech = tech();
        let spec = tech.port_spec("UniCPW-EO").unwrap();
        let info = cpw_info(spec).unwrap();
        assert!((info.signal_width - 10.0).abs() < 1e-12);
        assert!((info.gap - 4.0).abs() < 1e-12);
        assert!((info.ground_width - 180.0).abs() < 1e-12);
        assert_eq!(info.layer, "TL");
        assert!((spec.width - 378.0).abs() < 1e-12);
    }

    #[test]
    fn optical_spec_is_not_cpw() {
        let tech = tech();
        assert!(cpw_info(tech.port_spec("RWG1000").unwrap()).is_err());
    }

    #[test]
    fn analysed_line_matches_standard_spec() {
        let tech = tech();
        let line = CpwSpec::from_dimensions(10.0, 4.0, 180.0, "TL", &tech).unwrap();
        let spec = line.port_spec(&tech);
        let standard = tech.port_spec("UniCPW-EO").unwrap();
        assert_eq!(spec.path_profiles, standard.path_profiles);
        assert!((spec.width - standard.width).abs() < 1e-12);
        assert!((spec.target_neff - standard.target_neff).abs() < 1e-12);
        assert!(line.target.is_none());
    }
}
