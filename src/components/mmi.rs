//! Multimode interference couplers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{core_profile, name_or, naming, parameter_record, port_spec, Generator};
use crate::error::{check_min_feature, ensure_positive, ParameterError, ParameterResult};
use crate::layout::path::spec_paths;
use crate::layout::{Component, Point, Polygon, Port};
use crate::technology::{PortSpec, Technology};

/// Dimensions shared by all MMI variants.
struct MmiBody<'a> {
    width: f64,
    length: f64,
    taper_width: f64,
    taper_length: f64,
    port_ratio: f64,
    spec: &'a PortSpec,
}

impl MmiBody<'_> {
    fn validate(&self, tech: &Technology) -> ParameterResult<()> {
        ensure_positive("width", self.width)?;
        ensure_positive("length", self.length)?;
        ensure_positive("taper_width", self.taper_width)?;
        ensure_positive("taper_length", self.taper_length)?;
        ensure_positive("port_ratio", self.port_ratio)?;

        let core = core_profile(self.spec, "port_spec")?;
        check_min_feature(tech, "width", self.width, &core.layer)?;
        check_min_feature(tech, "taper_width", self.taper_width, &core.layer)?;

        let separation = self.port_ratio * self.width;
        if separation + self.taper_width > self.width {
            return Err(ParameterError::constraint(
                "port_ratio",
                "port_ratio * width + taper_width must not exceed width",
            ));
        }
        if separation < self.taper_width {
            warn!(
                separation,
                taper_width = self.taper_width,
                "MMI tapers overlap; the ports will not be separated"
            );
        }
        Ok(())
    }

    /// Lateral offset of the outer access waveguides.
    fn port_offset(&self) -> f64 {
        0.5 * self.port_ratio * self.width
    }

    /// Draws the multimode section, the access tapers and the ports.
    fn draw(&self, c: &mut Component, inputs: &[f64], outputs: &[f64]) -> ParameterResult<()> {
        let core = core_profile(self.spec, "port_spec")?;
        let margin = self
            .spec
            .cladding()
            .map_or(0.0, |clad| 0.5 * (clad.width - core.width));

        c.add_polygon(
            &core.layer,
            Polygon::rectangle(
                Point::new(0.0, -0.5 * self.width),
                Point::new(self.length, 0.5 * self.width),
            ),
        );
        if margin > 0.0 {
            if let Some(clad) = self.spec.cladding() {
                c.add_polygon(
                    &clad.layer,
                    Polygon::rectangle(
                        Point::new(0.0, -0.5 * self.width - margin),
                        Point::new(self.length, 0.5 * self.width + margin),
                    ),
                );
            }
        }

        let x_out = self.length + self.taper_length;
        for &y in inputs {
            self.taper(c, Point::new(-self.taper_length, y), Point::new(0.0, y), &core.layer);
            c.add_port(Port::new(Point::new(-self.taper_length, y), 0.0, self.spec));
        }
        for &y in outputs {
            self.taper(c, Point::new(x_out, y), Point::new(self.length, y), &core.layer);
            c.add_port(Port::new(Point::new(x_out, y), 180.0, self.spec).inverted());
        }
        Ok(())
    }

    fn taper(&self, c: &mut Component, from: Point, to: Point, core_layer: &str) {
        let mut paths = spec_paths(self.spec, from);
        for (layer, path) in &mut paths {
            let end_width = (layer.as_str() == core_layer).then_some(self.taper_width);
            path.segment(to, end_width);
        }
        c.add_paths(&paths);
    }
}

/// 1×2 MMI splitter: one input `P0`, outputs `P1` (lower) and `P2` (upper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Mmi1x2 {
    /// Access waveguide cross-section.
    pub port_spec: String,
    /// Width of the multimode section (µm).
    pub width: f64,
    /// Length of the multimode section (µm).
    pub length: f64,
    /// Core width of the tapers at the multimode section (µm).
    pub taper_width: f64,
    /// Length of the access tapers (µm).
    pub taper_length: f64,
    /// Output separation as a fraction of `width`.
    pub port_ratio: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for Mmi1x2 {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            width: 6.0,
            length: 26.75,
            taper_width: 1.5,
            taper_length: 25.0,
            port_ratio: 0.55,
            name: String::new(),
        }
    }
}

impl Mmi1x2 {
    const fn body<'a>(&self, spec: &'a PortSpec) -> MmiBody<'a> {
        MmiBody {
            width: self.width,
            length: self.length,
            taper_width: self.taper_width,
            taper_length: self.taper_length,
            port_ratio: self.port_ratio,
            spec,
        }
    }

    pub(crate) fn build_with(&self, spec: &PortSpec, tech: &Technology) -> ParameterResult<Component> {
        let body = self.body(spec);
        body.validate(tech)?;
        let name = name_or(&self.name, || {
            naming::component_name(
                "MMI1x2",
                &[('W', self.width), ('L', self.length)],
                Some(&self.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));
        let off = body.port_offset();
        body.draw(&mut c, &[0.0], &[-off, off])?;
        Ok(c)
    }
}

impl Generator for Mmi1x2 {
    const NAME: &'static str = "mmi1x2";
    const DESCRIPTION: &'static str = "1x2 multimode interference splitter";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        self.build_with(port_spec(tech, &self.port_spec)?, tech)
    }
}

/// 2×2 MMI coupler: inputs `P0`, `P1` and outputs `P2`, `P3`, lower first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Mmi2x2 {
    /// Access waveguide cross-section.
    pub port_spec: String,
    /// Width of the multimode section (µm).
    pub width: f64,
    /// Length of the multimode section (µm).
    pub length: f64,
    /// Core width of the tapers at the multimode section (µm).
    pub taper_width: f64,
    /// Length of the access tapers (µm).
    pub taper_length: f64,
    /// Port separation as a fraction of `width`.
    pub port_ratio: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for Mmi2x2 {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            width: 5.0,
            length: 76.5,
            taper_width: 1.5,
            taper_length: 25.0,
            port_ratio: 0.7,
            name: String::new(),
        }
    }
}

impl Mmi2x2 {
    const fn body<'a>(&self, spec: &'a PortSpec) -> MmiBody<'a> {
        MmiBody {
            width: self.width,
            length: self.length,
            taper_width: self.taper_width,
            taper_length: self.taper_length,
            port_ratio: self.port_ratio,
            spec,
        }
    }
}

impl Generator for Mmi2x2 {
    const NAME: &'static str = "mmi2x2";
    const DESCRIPTION: &'static str = "2x2 multimode interference coupler";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let body = self.body(port_spec(tech, &self.port_spec)?);
        body.validate(tech)?;
        let name = name_or(&self.name, || {
            naming::component_name(
                "MMI2x2",
                &[('W', self.width), ('L', self.length)],
                Some(&self.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));
        let off = body.port_offset();
        body.draw(&mut c, &[-off, off], &[-off, off])?;
        Ok(c)
    }
}
