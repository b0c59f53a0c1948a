//! RF electrodes: probe pads and electro-optic phase shifters.

use serde::{Deserialize, Serialize};

use super::waveguides::{straight, transition};
use super::{core_profile, name_or, naming, parameter_record, port_spec, Generator};
use crate::error::{check_min_feature, ensure_positive, ParameterError, ParameterResult};
use crate::layout::{Component, Point, Polygon, Port, Reference};
use crate::technology::{PortSpec, Technology};
use crate::utils::cpw::cpw_info;

/// Linearly tapered GSG probe pad ending in a CPW port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpwProbePadLinear {
    /// CPW cross-section at the port.
    pub port_spec: String,
    /// Signal conductor width on the pad side (µm).
    pub pad_width: f64,
    /// Length of the straight pad section (µm).
    pub length_straight: f64,
    /// Length of the tapered section (µm).
    pub length_tapered: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for CpwProbePadLinear {
    fn default() -> Self {
        Self {
            port_spec: "UniCPW".to_string(),
            pad_width: 80.0,
            length_straight: 30.0,
            length_tapered: 100.0,
            name: String::new(),
        }
    }
}

impl CpwProbePadLinear {
    pub(crate) fn build_with(&self, spec: &PortSpec) -> ParameterResult<Component> {
        ensure_positive("pad_width", self.pad_width)?;
        ensure_positive("length_straight", self.length_straight)?;
        ensure_positive("length_tapered", self.length_tapered)?;
        let info = cpw_info(spec)?;

        let scaling = self.pad_width / info.signal_width;
        let y_max = info.ground_offset + 0.5 * info.ground_width;
        let y_gnd = info.ground_offset - 0.5 * info.ground_width;
        let y_sig = 0.5 * info.signal_width;
        let length = self.length_straight + self.length_tapered;

        if scaling * y_gnd >= y_max {
            return Err(ParameterError::constraint(
                "pad_width",
                format!(
                    "must be less than {} for this port specification",
                    y_max / y_gnd * info.signal_width
                ),
            ));
        }

        let signal = Polygon::new(vec![
            Point::new(0.0, -scaling * y_sig),
            Point::new(self.length_straight, -scaling * y_sig),
            Point::new(length, -y_sig),
            Point::new(length, y_sig),
            Point::new(self.length_straight, scaling * y_sig),
            Point::new(0.0, scaling * y_sig),
        ]);
        let ground = Polygon::new(vec![
            Point::new(0.0, scaling * y_gnd),
            Point::new(self.length_straight, scaling * y_gnd),
            Point::new(length, y_gnd),
            Point::new(length, y_max),
            Point::new(0.0, y_max),
        ]);

        let name = name_or(&self.name, || {
            naming::component_name(
                "GSG_PAD_LINEAR",
                &[
                    ('W', self.pad_width),
                    ('S', self.length_straight),
                    ('T', self.length_tapered),
                ],
                Some(&self.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));
        c.add_polygon(&info.layer, signal);
        c.add_polygon(&info.layer, ground.mirrored_y());
        c.add_polygon(&info.layer, ground);
        c.add_port(Port::new(Point::new(length, 0.0), 180.0, spec).inverted());
        Ok(c)
    }
}

impl Generator for CpwProbePadLinear {
    const NAME: &'static str = "cpw_probe_pad_linear";
    const DESCRIPTION: &'static str = "GSG probe pad with linear taper to a CPW";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        self.build_with(port_spec(tech, &self.port_spec)?)
    }
}

/// Electro-optic phase shifter: a widened rib waveguide in the gap of a CPW.
///
/// The waveguide runs along the centre of the upper gap; ports `P0` and
/// `P1` are its optical ends. With `draw_cpw`, the line is drawn along the
/// waveguide and its ends are exposed as `P2` and `P3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EoPhaseShifter {
    /// Optical waveguide cross-section.
    pub port_spec: String,
    /// CPW cross-section.
    pub tl_port_spec: String,
    /// Length of the tapers to the modulation section (µm).
    pub taper_length: f64,
    /// Core width in the modulation section (µm).
    pub rib_core_width_modulator: f64,
    /// Total length including tapers (µm).
    pub modulation_length: f64,
    /// Draw the CPW.
    pub draw_cpw: bool,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for EoPhaseShifter {
    fn default() -> Self {
        Self {
            port_spec: "RWG1000".to_string(),
            tl_port_spec: "UniCPW-EO".to_string(),
            taper_length: 100.0,
            rib_core_width_modulator: 2.5,
            modulation_length: 1000.0,
            draw_cpw: true,
            name: String::new(),
        }
    }
}

/// Checks the taper and modulation lengths shared with the modulator.
pub(crate) fn check_modulation_lengths(taper_length: f64, modulation_length: f64) -> ParameterResult<()> {
    ensure_positive("taper_length", taper_length)?;
    ensure_positive("modulation_length", modulation_length)?;
    if modulation_length <= 2.0 * taper_length {
        return Err(ParameterError::constraint(
            "modulation_length",
            "must be larger than 2 * taper_length",
        ));
    }
    Ok(())
}

impl EoPhaseShifter {
    pub(crate) fn build_with(
        &self,
        spec: &PortSpec,
        tl_spec: &PortSpec,
        tech: &Technology,
    ) -> ParameterResult<Component> {
        check_modulation_lengths(self.taper_length, self.modulation_length)?;
        ensure_positive("rib_core_width_modulator", self.rib_core_width_modulator)?;
        let core = core_profile(spec, "port_spec")?;
        check_min_feature(tech, "rib_core_width_modulator", self.rib_core_width_modulator, &core.layer)?;
        let info = cpw_info(tl_spec)?;

        let modulation_spec = spec.widened(self.rib_core_width_modulator - core.width);
        let taper = transition(
            spec,
            &modulation_spec,
            self.taper_length,
            "EO_SHIFTER_TAPER".to_string(),
            serde_json::Value::Null,
        )?;
        let section = straight(
            &modulation_spec,
            self.modulation_length - 2.0 * self.taper_length,
            "EO_SHIFTER_SECTION".to_string(),
            serde_json::Value::Null,
        )?;

        let name = name_or(&self.name, || {
            naming::component_name(
                "EO_SHIFTER",
                &[
                    ('L', self.modulation_length),
                    ('T', self.taper_length),
                    ('W', self.rib_core_width_modulator),
                ],
                Some(&self.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));

        let input = Reference::at(&taper, Point::new(0.0, 0.5 * (info.signal_width + info.gap)));
        c.add_reference(&input);
        c.add_port(input.port("P0")?);
        let middle = Reference::new(&section).connect("P0", &input.port("P1")?)?;
        c.add_reference(&middle);
        let output = Reference::new(&taper).connect("P1", &middle.port("P1")?)?;
        c.add_reference(&output);
        c.add_port(output.port("P0")?);

        if self.draw_cpw {
            let line = straight(
                tl_spec,
                self.modulation_length,
                "EO_SHIFTER_CPW".to_string(),
                serde_json::Value::Null,
            )?;
            let line = Reference::new(&line);
            c.add_reference(&line);
            c.add_port(line.port("P0")?);
            c.add_port(line.port("P1")?);
        }
        Ok(c)
    }
}

impl Generator for EoPhaseShifter {
    const NAME: &'static str = "eo_phase_shifter";
    const DESCRIPTION: &'static str = "Electro-optic phase shifter with CPW electrodes";

    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        let spec = port_spec(tech, &self.port_spec)?;
        let tl_spec = port_spec(tech, &self.tl_port_spec)?;
        self.build_with(spec, tl_spec, tech)
    }
}
