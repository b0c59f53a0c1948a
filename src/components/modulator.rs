//! Unbalanced Mach-Zehnder electro-optic modulator.

use serde::{Deserialize, Serialize};

use super::bends::{LTurnBend, SBendVert};
use super::electrodes::{check_modulation_lengths, CpwProbePadLinear, EoPhaseShifter};
use super::mmi::Mmi1x2;
use super::waveguides::straight;
use super::{name_or, naming, parameter_record, port_spec, Generator};
use crate::error::{ensure_bound, ensure_positive, Bound, ParameterResult};
use crate::layout::{Component, Point, Reference};
use crate::technology::Technology;
use crate::utils::cpw::cpw_info;

/// Radius of the bends routing the arms around the bias section (µm).
const ARM_BEND_RADIUS: f64 = 75.0;

/// Vertical straight common to both arms (µm).
const ARM_STRAIGHT: f64 = 20.0;

/// Horizontal extent of the input fan-out relative to its offset.
const FAN_OUT_ASPECT: f64 = 3.6;

/// Push-pull Mach-Zehnder modulator with unequal arms.
///
/// Both arms run in the gaps of a single CPW. On the output side the arms
/// are folded around a bias-tuning section; the upper arm is longer by
/// `length_imbalance` (the lower one if negative). The arms use the
/// splitter's waveguide cross-section. Ports: `P0` input, `P1` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MzModulatorUnbalanced {
    /// CPW cross-section.
    pub tl_port_spec: String,
    /// Splitter and combiner; its `port_spec` sets the arm waveguides.
    pub splitter: Mmi1x2,
    /// Taper length of the phase shifters (µm).
    pub taper_length: f64,
    /// Core width in the modulation section (µm).
    pub rib_core_width_modulator: f64,
    /// Phase shifter length (µm).
    pub modulation_length: f64,
    /// Arm length difference (µm).
    pub length_imbalance: f64,
    /// Length of the bias-tuning straights (µm).
    pub bias_tuning_section_length: f64,
    /// Signal width at the probe pads (µm).
    pub rf_pad_start_width: f64,
    /// Straight probe pad length (µm).
    pub rf_pad_length_straight: f64,
    /// Tapered probe pad length (µm).
    pub rf_pad_length_tapered: f64,
    /// Draw the CPW and its probe pads.
    pub draw_cpw: bool,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for MzModulatorUnbalanced {
    fn default() -> Self {
        Self {
            tl_port_spec: "UniCPW-EO".to_string(),
            splitter: Mmi1x2::default(),
            taper_length: 100.0,
            rib_core_width_modulator: 2.5,
            modulation_length: 7500.0,
            length_imbalance: 100.0,
            bias_tuning_section_length: 750.0,
            rf_pad_start_width: 80.0,
            rf_pad_length_straight: 10.0,
            rf_pad_length_tapered: 190.0,
            draw_cpw: true,
            name: String::new(),
        }
    }
}

impl Generator for MzModulatorUnbalanced {
    const NAME: &'static str = "mz_modulator_unbalanced";
    const DESCRIPTION: &'static str = "Unbalanced push-pull Mach-Zehnder modulator";

    #[allow(clippy::too_many_lines)]
    fn build(&self, tech: &Technology) -> ParameterResult<Component> {
        check_modulation_lengths(self.taper_length, self.modulation_length)?;
        ensure_bound("length_imbalance", self.length_imbalance, Bound::Finite)?;
        ensure_positive("bias_tuning_section_length", self.bias_tuning_section_length)?;
        ensure_positive("rf_pad_start_width", self.rf_pad_start_width)?;
        ensure_positive("rf_pad_length_straight", self.rf_pad_length_straight)?;
        ensure_positive("rf_pad_length_tapered", self.rf_pad_length_tapered)?;

        let spec = port_spec(tech, &self.splitter.port_spec)?;
        let tl_spec = port_spec(tech, &self.tl_port_spec)?;
        let info = cpw_info(tl_spec)?;

        let splitter = self.splitter.build_with(spec, tech)?;
        let splitter_sep = (splitter.port("P2")?.center.y - splitter.port("P1")?.center.y).abs();
        let arm_sep = info.signal_width + info.gap;

        let shifter = EoPhaseShifter {
            port_spec: self.splitter.port_spec.clone(),
            tl_port_spec: self.tl_port_spec.clone(),
            taper_length: self.taper_length,
            rib_core_width_modulator: self.rib_core_width_modulator,
            modulation_length: self.modulation_length,
            draw_cpw: false,
            name: String::new(),
        }
        .build_with(spec, tl_spec, tech)?;

        // The arms leave the pads in the middle of the widened gaps
        let pad_gap = self.rf_pad_start_width / info.signal_width * arm_sep;
        let fan_offset = 0.5 * (pad_gap - splitter_sep);
        let fan_out = SBendVert {
            port_spec: self.splitter.port_spec.clone(),
            h_extent: FAN_OUT_ASPECT * fan_offset,
            v_offset: fan_offset,
            dx_straight: 5.0,
            name: "MZM_FAN_OUT".to_string(),
        }
        .build_with(spec)?;
        let pad_dx = 0.5 * self.rf_pad_length_straight;
        let pad_bend = SBendVert {
            port_spec: self.splitter.port_spec.clone(),
            h_extent: self.rf_pad_length_straight + self.rf_pad_length_tapered - 2.0 * pad_dx,
            v_offset: 0.5 * (arm_sep - pad_gap),
            dx_straight: pad_dx,
            name: "MZM_PAD_BEND".to_string(),
        }
        .build_with(spec)?;
        let bend = LTurnBend {
            port_spec: self.splitter.port_spec.clone(),
            effective_radius: ARM_BEND_RADIUS,
            euler_fraction: 1.0,
            name: "MZM_ARM_BEND".to_string(),
        }
        .build_with(spec)?;
        let long_arm = straight(
            spec,
            ARM_STRAIGHT + 0.5 * self.length_imbalance.abs(),
            "MZM_LONG_ARM".to_string(),
            serde_json::Value::Null,
        )?;
        let short_arm = straight(
            spec,
            ARM_STRAIGHT,
            "MZM_SHORT_ARM".to_string(),
            serde_json::Value::Null,
        )?;
        let (top_arm, bottom_arm) = if self.length_imbalance > 0.0 {
            (&long_arm, &short_arm)
        } else {
            (&short_arm, &long_arm)
        };
        let bias = straight(
            spec,
            self.bias_tuning_section_length,
            "MZM_BIAS".to_string(),
            serde_json::Value::Null,
        )?;

        let name = name_or(&self.name, || {
            naming::component_name(
                "MZM_UNBALANCED",
                &[
                    ('L', self.modulation_length),
                    ('I', self.length_imbalance),
                    ('B', self.bias_tuning_section_length),
                ],
                Some(&self.splitter.port_spec),
            )
        });
        let mut c = Component::new(name, parameter_record(self));

        let shifter_top = Reference::new(&shifter);
        let shifter_bottom = Reference::at(&shifter, Point::new(0.0, -arm_sep));
        c.add_reference(&shifter_top).add_reference(&shifter_bottom);

        // Input: splitter, fan-out and pad bends to the upper arm
        let r = Reference::new(&pad_bend).connect("P1", &shifter_top.port("P0")?)?;
        c.add_reference(&r);
        let r = Reference::new(&fan_out).connect("P1", &r.port("P0")?)?;
        c.add_reference(&r);
        let input = Reference::new(&splitter).connect("P2", &r.port("P0")?)?;
        c.add_reference(&input);
        c.add_port(input.port("P0")?);

        // Input: lower arm to the splitter
        let r = Reference::new(&pad_bend)
            .mirrored()
            .connect("P1", &shifter_bottom.port("P0")?)?;
        c.add_reference(&r);
        let r = Reference::new(&fan_out).mirrored().connect("P1", &r.port("P0")?)?;
        c.add_reference(&r);

        // Output: upper arm folded upwards around the bias section
        let r = Reference::new(&pad_bend)
            .mirrored()
            .connect("P0", &shifter_top.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bend).connect("P0", &r.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(top_arm).connect("P0", &r.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bend).connect("P1", &r.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bias).connect("P0", &r.port("P0")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bend).connect("P1", &r.port("P1")?)?;
        c.add_reference(&r);
        let top_end = Reference::new(top_arm).connect("P0", &r.port("P0")?)?;
        c.add_reference(&top_end);

        // Output: lower arm folded downwards
        let r = Reference::new(&pad_bend).connect("P0", &shifter_bottom.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bend).connect("P1", &r.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(bottom_arm).connect("P0", &r.port("P0")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bend).connect("P0", &r.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bias).connect("P0", &r.port("P1")?)?;
        c.add_reference(&r);
        let r = Reference::new(&bend).connect("P0", &r.port("P1")?)?;
        c.add_reference(&r);
        let bottom_end = Reference::new(bottom_arm).connect("P0", &r.port("P1")?)?;
        c.add_reference(&bottom_end);

        // Output: both arms into the combiner
        let top_exit = top_end.port("P1")?;
        let out_bend = LTurnBend {
            port_spec: self.splitter.port_spec.clone(),
            effective_radius: (top_exit.center.y - 0.5 * splitter_sep).abs(),
            euler_fraction: 1.0,
            name: "MZM_OUTPUT_BEND".to_string(),
        }
        .build_with(spec)?;
        let r = Reference::new(&out_bend).connect("P0", &top_exit)?;
        c.add_reference(&r);
        let r = Reference::new(&out_bend).connect("P1", &bottom_end.port("P1")?)?;
        c.add_reference(&r);
        let output = Reference::new(&splitter).connect("P2", &r.port("P0")?)?;
        c.add_reference(&output);
        c.add_port(output.port("P0")?);

        if self.draw_cpw {
            let pad = CpwProbePadLinear {
                port_spec: self.tl_port_spec.clone(),
                pad_width: self.rf_pad_start_width,
                length_straight: self.rf_pad_length_straight,
                length_tapered: self.rf_pad_length_tapered,
                name: "MZM_RF_PAD".to_string(),
            }
            .build_with(tl_spec)?;
            let line = straight(
                tl_spec,
                self.modulation_length,
                "MZM_CPW".to_string(),
                serde_json::Value::Null,
            )?;
            let line = Reference::new(&line);
            c.add_reference(&line);
            c.add_reference(&Reference::new(&pad).connect("P0", &line.port("P0")?)?);
            c.add_reference(&Reference::new(&pad).connect("P0", &line.port("P1")?)?);
        }
        Ok(c)
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
    fn ports_are_on_the_axis() {
        let c = MzModulatorUnbalanced::default().build(&tech()).unwrap();
        assert_eq!(c.ports.len(), 2);
        let input = &c.ports[0];
        let output = &c.ports[1];
        assert!(input.center.y.abs() < 1e-9);
        assert!(output.center.y.abs() < 1e-9);
        assert!(input.input_direction.abs() < 1e-9);
        assert!((output.input_direction - 180.0).abs() < 1e-9);
        // splitter, fan-out and pad bend in front of the phase shifters
        let fan_offset = 0.5 * (8.0 * 14.0 - 3.3);
        let expected = -(25.0 + 51.75 + 3.6 * fan_offset + 10.0 + 200.0);
        assert!((input.center.x - expected).abs() < 1e-9);
    }

    #[test]
    fn output_mirrors_input_reach() {
        let c = MzModulatorUnbalanced::default().build(&tech()).unwrap();
        // pad bend, three arm bends, bias section, output bend and combiner
        let out_bend = 131.0 - 1.65;
        let expected = 7500.0 + 200.0 + 3.0 * 75.0 + 750.0 + out_bend + 51.75 + 25.0;
        assert!((c.ports[1].center.x - expected).abs() < 1e-6);
    }

    #[test]
    fn arms_fold_above_and_below() {
        let c = MzModulatorUnbalanced::default().build(&tech()).unwrap();
        let (lo, hi) = c.bounds().unwrap();
        // long arm 70 µm, short arm 20 µm, both between two 75 µm bends
        assert!(hi.y > 56.0 + 75.0 + 70.0 + 75.0);
        assert!(lo.y < -(56.0 + 75.0 + 20.0 + 75.0));
        assert!(!c.layer_polygons("TL").is_empty());
    }

    #[test]
    fn negative_imbalance_lengthens_lower_arm() {
        let up = MzModulatorUnbalanced {
            draw_cpw: false,
            ..MzModulatorUnbalanced::default()
        }
        .build(&tech())
        .unwrap();
        let down = MzModulatorUnbalanced {
            draw_cpw: false,
            length_imbalance: -100.0,
            ..MzModulatorUnbalanced::default()
        }
        .build(&tech())
        .unwrap();
        let (lo_up, hi_up) = up.bounds().unwrap();
        let (lo_down, hi_down) = down.bounds().unwrap();
        assert!((hi_up.y - hi_down.y - 50.0).abs() < 1e-6);
        assert!((lo_up.y - lo_down.y - 50.0).abs() < 1e-6);
        assert!(down.layer_polygons("TL").is_empty());
    }

    #[test]
    fn splitter_sets_arm_waveguide() {
        let tech = tech();
        let c = MzModulatorUnbalanced {
            splitter: Mmi1x2 {
                port_spec: "RWG3000".to_string(),
                ..Mmi1x2::default()
            },
            draw_cpw: false,
            ..MzModulatorUnbalanced::default()
        }
        .build(&tech)
        .unwrap();
        let wide = tech.port_spec("RWG3000").unwrap();
        assert!(c.ports.iter().all(|p| &p.spec == wide));
        assert_eq!(c.parameters["splitter"]["port_spec"], "RWG3000");
        assert!(c.name.ends_with("_RWG3000"));
    }

    #[test]
    fn unknown_splitter_port_spec_is_rejected() {
        let err = MzModulatorUnbalanced {
            splitter: Mmi1x2 {
                port_spec: "NOPE".to_string(),
                ..Mmi1x2::default()
            },
            ..MzModulatorUnbalanced::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::UnknownPortSpec { ref name } if name == "NOPE"));
    }

    #[test]
    fn short_modulation_is_rejected() {
        let err = MzModulatorUnbalanced {
            modulation_length: 150.0,
            ..MzModulatorUnbalanced::default()
        }
        .build(&tech())
        .unwrap_err();
        assert!(matches!(err, ParameterError::Constraint { .. }));
    }
}
