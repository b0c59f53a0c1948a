//! Waveguide bends.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{name_or, naming, parameter_record, port_spec, Generator};
use crate::error::{ensure_bound, ensure_non_negative, ensure_positive, Bound, ParameterResult};
use crate::layout::path::spec_paths;
use crate::layout::{Component, Point, Port};
use crate::technology::{PortSpec, Technology};

/// Offset-to-length ratio above which an S-bend is considered tight.
const MAX_S_BEND_RATIO: f64 = 0.285_714;

/// S-bend shifting the waveguide vertically.
///
/// The curved section is a cubic Bézier with horizontal tangents at both
/// ends, framed by two straight sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SBendVert {
    /// Port specification of the cross-section.
    pub port_spec: String,
    /// Horizontal extent of the curved section (µm).
    pub h_extent: f64,
    /// Vertical offset (µm); negative bends downwards.
    pub v_offset: f64,
    /// Length of the straight sections at both ends (µm).
    pub dx_straight: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for SBendVert {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            h_extent: 100.0,
            v_offset: 25.0,
            dx_straight: 5.0,
            name: String::new(),
        }
    }
}

impl SBendVert {
    pub(crate) fn build_with(&self, spec: &PortSpec) -> ParameterResult<Component> {
        let h_extent = self.h_extent.abs();
        let dx = self.dx_straight.abs();
        ensure_positive("h_extent", h_extent)?;
        ensure_non_negative("dx_straight", dx)?;
        ensure_bound("v_offset", self.v_offset, Bound::Finite)?;

        let ratio = self.v_offset.abs() / h_extent;
        if ratio > MAX_S_BEND_RATIO {
            warn!(
                ratio,
                "S-bend might be too tight; make sure the geometry is correct"
            );
        }

        let name = name_or(&self.name, || {
            naming::component_name(
                "SBEND",
                &[('H', h_extent), ('V', self.v_offset), ('S', dx)],
                Some(&self.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));
        let end = Point::new(h_extent + 2.0 * dx, self.v_offset);
        let mut paths = spec_paths(spec, Point::new(0.0, 0.0));
        for (_, path) in &mut paths {
            if dx > 0.0 {
                path.segment(Point::new(dx, 0.0), None);
            }
            path.bezier(
                [
                    Point::new(h_extent / 3.0, 0.0),
                    Point::new(h_extent * 2.0 / 3.0, self.v_offset),
                    Point::new(h_extent, self.v_offset),
                ],
                true,
            );
            if dx > 0.0 {
                path.segment(end, None);
            }
        }
        c.add_paths(&paths);
        c.add_port(Port::new(Point::new(0.0, 0.0), 0.0, spec));
        c.add_port(Port::new(end, 180.0, spec).inverted());
        Ok(c)
    }
}

impl Generator for SBendVert {
    const NAME: &'static str = "s_bend_vert";
    const DESCRIPTION: &'static str = "Cubic Bézier S-bend with vertical offset";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        self.build_with(port_spec(tech, &self.port_spec)?)
    }
}

/// Draws a 180° bend from the origin (heading +x) back to `(0, v_offset)`.
fn u_turn(
    spec: &PortSpec,
    v_offset: f64,
    euler_fraction: f64,
    name: String,
    parameters: serde_json::Value,
) -> ParameterResult<Component> {
    ensure_bound("v_offset", v_offset, Bound::Finite)?;
    ensure_positive("|v_offset|", v_offset.abs())?;

    let end = Point::new(0.0, v_offset);
    let turn = 180.0_f64.copysign(v_offset);
    let mut c = Component::new(name, parameters);
    let mut paths = spec_paths(spec, Point::new(0.0, 0.0));
    for (_, path) in &mut paths {
        path.euler_bend(turn, euler_fraction, end)?;
    }
    c.add_paths(&paths);
    c.add_port(Port::new(Point::new(0.0, 0.0), 0.0, spec));
    c.add_port(Port::new(end, 0.0, spec).inverted());
    Ok(c)
}

/// 180° Euler bend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UTurnBend {
    /// Port specification of the cross-section.
    pub port_spec: String,
    /// Distance between the two ends (µm); negative turns clockwise.
    pub v_offset: f64,
    /// Fraction of the bend following an Euler spiral.
    pub euler_fraction: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for UTurnBend {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            v_offset: 80.0,
            euler_fraction: 1.0,
            name: String::new(),
        }
    }
}

impl Generator for UTurnBend {
    const NAME: &'static str = "u_turn_bend";
    const DESCRIPTION: &'static str = "180° Euler bend";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let name = name_or(&self.name, || {
            naming::component_name(
                "UBEND",
                &[('V', self.v_offset), ('E', self.euler_fraction)],
                Some(&self.port_spec),
            )
        });
        u_turn(
            port_spec(tech, &self.port_spec)?,
            self.v_offset,
            self.euler_fraction,
            name,
            parameter_record(self),
        )
    }
}

/// 180° Euler bend with defaults for low-loss racetrack resonators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UBendRacetrack {
    /// Port specification of the cross-section.
    pub port_spec: String,
    /// Distance between the two ends (µm); negative turns clockwise.
    pub v_offset: f64,
    /// Fraction of the bend following an Euler spiral.
    pub euler_fraction: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for UBendRacetrack {
    fn default() -> Self {
        Self {
            port_spec: "RWG3000".to_string(),
            v_offset: 90.0,
            euler_fraction: 1.0,
            name: String::new(),
        }
    }
}

impl Generator for UBendRacetrack {
    const NAME: &'static str = "u_bend_racetrack";
    const DESCRIPTION: &'static str = "180° Euler bend for racetrack resonators";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let name = name_or(&self.name, || {
            naming::component_name(
                "UBEND_RACETRACK",
                &[('V', self.v_offset), ('E', self.euler_fraction)],
                Some(&self.port_spec),
            )
        });
        u_turn(
            port_spec(tech, &self.port_spec)?,
            self.v_offset,
            self.euler_fraction,
            name,
            parameter_record(self),
        )
    }
}

/// 90° Euler bend turning left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LTurnBend {
    /// Port specification of the cross-section.
    pub port_spec: String,
    /// Horizontal and vertical extent of the bend (µm).
    pub effective_radius: f64,
    /// Fraction of the bend following an Euler spiral.
    pub euler_fraction: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for LTurnBend {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            effective_radius: 80.0,
            euler_fraction: 1.0,
            name: String::new(),
        }
    }
}

impl LTurnBend {
    pub(crate) fn build_with(&self, spec: &PortSpec) -> ParameterResult<Component> {
        ensure_positive("effective_radius", self.effective_radius)?;
        let r = self.effective_radius;
        let end = Point::new(r, r);

        let name = name_or(&self.name, || {
            naming::component_name(
                "LBEND",
                &[('R', r), ('E', self.euler_fraction)],
                Some(&self.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));
        let mut paths = spec_paths(spec, Point::new(0.0, 0.0));
        for (_, path) in &mut paths {
            path.euler_bend(90.0, self.euler_fraction, end)?;
        }
        c.add_paths(&paths);
        c.add_port(Port::new(Point::new(0.0, 0.0), 0.0, spec));
        c.add_port(Port::new(end, -90.0, spec).inverted());
        Ok(c)
    }
}

impl Generator for LTurnBend {
    const NAME: &'static str = "l_turn_bend";
    const DESCRIPTION: &'static str = "90° Euler bend";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        self.build_with(port_spec(tech, &self.port_spec)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParameterError;
    use crate::technology::TechnologyParams;

    fn tech() -> Technology {
        TechnologyParams::default().build().unwrap()
    }

    #[test]
    fn s_bend_ports() {
        let c = SBendVert::default().build(&tech()).unwrap();
        assert_eq!(c.ports[0].center, Point::new(0.0, 0.0));
        assert_eq!(c.ports[1].center, Point::new(110.0, 25.0));
        assert!((c.ports[1].input_direction - 180.0).abs() < f64::EPSILON);
        let (lo, hi) = c.layer_polygons("LN_STRIP")[0].bounds().unwrap();
        assert!((lo.y + 0.5).abs() < 1e-9);
        assert!((hi.y - 25.5).abs() < 1e-9);
    }

    #[test]
    fn s_bend_uses_extent_magnitude() {
        let c = SBendVert {
            h_extent: -100.0,
            v_offset: -25.0,
            ..SBendVert::default()
        }
        .build(&tech())
        .unwrap();
        assert_eq!(c.ports[1].center, Point::new(110.0, -25.0));
    }

    #[test]
    fn u_turn_ports_face_the_same_way() {
        let c = UTurnBend::default().build(&tech()).unwrap();
        assert_eq!(c.ports[1].center, Point::new(0.0, 80.0));
        assert!(c.ports[1].input_direction.abs() < f64::EPSILON);
        assert!(c.ports[1].inverted);
        let (_, hi) = c.bounds().unwrap();
        assert!(hi.x > 40.0);
    }

    #[test]
    fn u_turn_downwards() {
        let c = UTurnBend {
            v_offset: -60.0,
            ..UTurnBend::default()
        }
        .build(&tech())
        .unwrap();
        let (lo, hi) = c.layer_polygons("LN_STRIP")[0].bounds().unwrap();
        assert!(lo.y < -60.0 && hi.y < 1.0);
    }

    #[test]
    fn zero_offset_u_turn_is_rejected() {
        let err = UTurnBend {
            v_offset: 0.0,
            ..UTurnBend::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { .. }));
    }

    #[test]
    fn racetrack_defaults() {
        let c = UBendRacetrack::default().build(&tech()).unwrap();
        assert_eq!(c.ports[1].center, Point::new(0.0, 90.0));
        assert_eq!(c.ports[0].spec, *tech().port_spec("RWG3000").unwrap());
    }

    #[test]
    fn l_bend_ends_at_radius() {
        let c = LTurnBend::default().build(&tech()).unwrap();
        assert_eq!(c.ports[1].center, Point::new(80.0, 80.0));
        assert!((c.ports[1].input_direction - 270.0).abs() < f64::EPSILON);
    }

    #[test]
    fn l_bend_needs_positive_radius() {
        let err = LTurnBend {
            effective_radius: -1.0,
            ..LTurnBend::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { .. }));
    }

    #[test]
    fn euler_fraction_out_of_range() {
        let err = LTurnBend {
            euler_fraction: 1.2,
            ..LTurnBend::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { .. }));
    }
}
