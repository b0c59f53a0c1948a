//! Straight sections, cross-section transitions and edge couplers.

use serde::{Deserialize, Serialize};

use super::{core_profile, name_or, naming, parameter_record, port_spec, Generator};
use crate::error::{check_min_feature, ensure_positive, ParameterError, ParameterResult};
use crate::layout::path::spec_paths;
use crate::layout::{Component, Point, Polygon, Port};
use crate::technology::{PortSpec, Technology};

/// Straight waveguide or transmission line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Straight {
    /// Port specification of the cross-section.
    pub port_spec: String,
    /// Length (µm).
    pub length: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for Straight {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            length: 10.0,
            name: String::new(),
        }
    }
}

impl Generator for Straight {
    const NAME: &'static str = "straight";
    const DESCRIPTION: &'static str = "Straight section of any port cross-section";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let spec = port_spec(tech, &self.port_spec)?;
        let name = name_or(&self.name, || {
            naming::component_name("STRAIGHT", &[('L', self.length)], Some(&self.port_spec))
        });
        straight(spec, self.length, name, parameter_record(self))
    }
}

/// Draws a straight section of `spec` along +x, starting at the origin.
pub(crate) fn straight(
    spec: &PortSpec,
    length: f64,
    name: String,
    parameters: serde_json::Value,
) -> ParameterResult<Component> {
    ensure_positive("length", length)?;
    let mut c = Component::new(name, parameters);
    let mut paths = spec_paths(spec, Point::new(0.0, 0.0));
    for (_, path) in &mut paths {
        path.segment(Point::new(length, 0.0), None);
    }
    c.add_paths(&paths);
    c.add_port(Port::new(Point::new(0.0, 0.0), 0.0, spec));
    c.add_port(Port::new(Point::new(length, 0.0), 180.0, spec).inverted());
    Ok(c)
}

/// Linear transition between two cross-sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Transition {
    /// Cross-section at the start.
    pub port_spec1: String,
    /// Cross-section at the end.
    pub port_spec2: String,
    /// Length (µm).
    pub length: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            port_spec1: "RWG1000".to_string(),
            port_spec2: "RWG3000".to_string(),
            length: 50.0,
            name: String::new(),
        }
    }
}

impl Generator for Transition {
    const NAME: &'static str = "transition";
    const DESCRIPTION: &'static str = "Linear transition between two cross-sections";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let start = port_spec(tech, &self.port_spec1)?;
        let end = port_spec(tech, &self.port_spec2)?;
        let name = name_or(&self.name, || {
            format!(
                "{}_{}",
                naming::component_name("TRANSITION", &[('L', self.length)], Some(&self.port_spec1)),
                self.port_spec2
            )
        });
        transition(start, end, self.length, name, parameter_record(self))
    }
}

/// Draws a linear transition from `start` to `end` along +x.
///
/// Profiles are paired by layer, in order of appearance.
pub(crate) fn transition(
    start: &PortSpec,
    end: &PortSpec,
    length: f64,
    name: String,
    parameters: serde_json::Value,
) -> ParameterResult<Component> {
    ensure_positive("length", length)?;
    if start.kind != end.kind {
        return Err(ParameterError::constraint(
            "port_spec2",
            "cannot transition between optical and electrical cross-sections",
        ));
    }
    if start.path_profiles.len() != end.path_profiles.len() {
        return Err(ParameterError::constraint(
            "port_spec2",
            "cross-sections have different numbers of path profiles",
        ));
    }

    let mut c = Component::new(name, parameters);
    let mut used = vec![false; end.path_profiles.len()];
    for from in &start.path_profiles {
        let j = end
            .path_profiles
            .iter()
            .enumerate()
            .position(|(j, to)| !used[j] && to.layer == from.layer)
            .ok_or_else(|| {
                ParameterError::constraint(
                    "port_spec2",
                    format!("no path profile on layer {} to transition to", from.layer),
                )
            })?;
        used[j] = true;
        let to = &end.path_profiles[j];
        c.add_polygon(
            &from.layer,
            Polygon::new(vec![
                Point::new(0.0, from.offset - 0.5 * from.width),
                Point::new(length, to.offset - 0.5 * to.width),
                Point::new(length, to.offset + 0.5 * to.width),
                Point::new(0.0, from.offset + 0.5 * from.width),
            ]),
        );
    }
    c.add_port(Port::new(Point::new(0.0, 0.0), 0.0, start));
    c.add_port(Port::new(Point::new(length, 0.0), 180.0, end).inverted());
    Ok(c)
}

/// Dual-layer inverse taper for coupling to a lensed fibre.
///
/// The lower layer tapers linearly from the wire core over the whole
/// length; the upper layer forms the rib core over the last section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoubleLinearInverseTaper {
    /// Wire waveguide at the chip facet.
    pub start_port_spec: String,
    /// Rib waveguide on the chip side.
    pub end_port_spec: String,
    /// Lower taper width where the upper taper starts (µm).
    pub lower_taper_end_width: f64,
    /// Length of the wire section (µm).
    pub lower_taper_length: f64,
    /// Start width of the rib core (µm).
    pub upper_taper_start_width: f64,
    /// Length of the rib core taper (µm).
    pub upper_taper_length: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for DoubleLinearInverseTaper {
    fn default() -> Self {
        Self {
            start_port_spec: "SWG250".to_string(),
            end_port_spec: "RWG1000".to_string(),
            lower_taper_end_width: 2.05,
            lower_taper_length: 120.0,
            upper_taper_start_width: 0.25,
            upper_taper_length: 240.0,
            name: String::new(),
        }
    }
}

impl Generator for DoubleLinearInverseTaper {
    const NAME: &'static str = "double_linear_inverse_taper";
    const DESCRIPTION: &'static str = "Dual-layer inverse taper edge coupler";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let start = port_spec(tech, &self.start_port_spec)?;
        let end = port_spec(tech, &self.end_port_spec)?;
        ensure_positive("lower_taper_end_width", self.lower_taper_end_width)?;
        ensure_positive("lower_taper_length", self.lower_taper_length)?;
        ensure_positive("upper_taper_start_width", self.upper_taper_start_width)?;
        ensure_positive("upper_taper_length", self.upper_taper_length)?;

        let lower = core_profile(start, "start_port_spec")?;
        let upper = core_profile(end, "end_port_spec")?;
        check_min_feature(tech, "lower_taper_end_width", self.lower_taper_end_width, &lower.layer)?;
        check_min_feature(tech, "upper_taper_start_width", self.upper_taper_start_width, &upper.layer)?;

        let length = self.lower_taper_length + self.upper_taper_length;
        let slope = (self.lower_taper_end_width - lower.width) / self.lower_taper_length;
        let lower_final_width = lower.width + slope * length;

        let name = name_or(&self.name, || {
            naming::component_name(
                "EDGE_COUPLER_LIN_LIN",
                &[
                    ('W', self.lower_taper_end_width),
                    ('L', self.lower_taper_length),
                    ('U', self.upper_taper_length),
                ],
                Some(&self.end_port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));
        c.add_polygon(
            &upper.layer,
            Polygon::linear_taper(
                self.lower_taper_length,
                self.upper_taper_length,
                self.upper_taper_start_width,
                upper.width,
            ),
        );
        c.add_polygon(
            &lower.layer,
            Polygon::linear_taper(0.0, length, lower.width, lower_final_width),
        );
        c.add_port(Port::new(Point::new(0.0, 0.0), 0.0, start));
        c.add_port(Port::new(Point::new(length, 0.0), 180.0, end).inverted());
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technology::TechnologyParams;

    fn tech() -> Technology {
        TechnologyParams::default().build().unwrap()
    }

    #[test]
    fn straight_draws_every_profile() {
        let c = Straight::default().build(&tech()).unwrap();
        assert_eq!(c.name, "STRAIGHT_L10000_RWG1000");
        assert!((c.layer_polygons("LN_STRIP")[0].area() - 10.0).abs() < 1e-9);
        assert!((c.layer_polygons("LN_RIB")[0].area() - 100.0).abs() < 1e-9);
        assert_eq!(c.ports[1].center, Point::new(10.0, 0.0));
    }

    #[test]
    fn cpw_straight_has_offset_grounds() {
        let c = Straight {
            port_spec: "UniCPW".into(),
            length: 100.0,
            ..Straight::default()
        }
        .build(&tech())
        .unwrap();
        let strips = c.layer_polygons("TL");
        assert_eq!(strips.len(), 3);
        let (lo, hi) = c.bounds().unwrap();
        assert!((hi.y - lo.y - 525.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_is_rejected() {
        let err = Straight {
            length: 0.0,
            ..Straight::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { .. }));
    }

    #[test]
    fn transition_pairs_layers() {
        let c = Transition::default().build(&tech()).unwrap();
        let core = &c.layer_polygons("LN_STRIP")[0];
        // trapezoid from 1 µm to 3 µm over 50 µm
        assert!((core.area() - 100.0).abs() < 1e-9);
        assert_eq!(c.ports[0].spec, *tech().port_spec("RWG1000").unwrap());
        assert_eq!(c.ports[1].spec, *tech().port_spec("RWG3000").unwrap());
    }

    #[test]
    fn transition_needs_matching_layers() {
        let err = Transition {
            port_spec2: "SWG250".into(),
            ..Transition::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::Constraint { .. }));
    }

    #[test]
    fn inverse_taper_extends_lower_slope() {
        let c = DoubleLinearInverseTaper::default().build(&tech()).unwrap();
        let (_, hi) = c.layer_polygons("LN_RIB")[0].bounds().unwrap();
        let expected = 0.25 + (2.05 - 0.25) / 120.0 * 360.0;
        assert!((2.0 * hi.y - expected).abs() < 1e-9);
        let (lo, _) = c.layer_polygons("LN_STRIP")[0].bounds().unwrap();
        assert!((lo.x - 120.0).abs() < 1e-12);
        assert_eq!(c.ports[1].center, Point::new(360.0, 0.0));
    }
}
