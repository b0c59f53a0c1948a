//! Parametric component generators.
//!
//! Every generator is a serde parameter struct whose [`Default`] holds the
//! documented defaults. [`Generator::build`] turns the parameters into a
//! flat [`Component`] for a given [`Technology`]; the static [`CATALOG`]
//! makes all generators available by name.
//!
//! # Example
//!
//! ```
//! use lnoi400_pdk::components::{generate, mmi::Mmi1x2, Generator};
//! use lnoi400_pdk::technology::default_technology;
//!
//! let tech = default_technology();
//! let mmi = Mmi1x2::default().build(&tech).unwrap();
//! assert_eq!(mmi.ports.len(), 3);
//!
//! let same = generate("mmi1x2", &serde_json::Value::Null, Some(&*tech)).unwrap();
//! assert_eq!(mmi, same);
//! ```

pub mod bends;
pub mod electrodes;
pub mod frame;
pub mod mmi;
pub mod modulator;
pub mod naming;
pub mod waveguides;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ParameterError, ParameterResult};
use crate::layout::Component;
use crate::technology::{default_technology, PathProfile, PortSpec, Technology};

/// A parametric component generator.
pub trait Generator: Default + Serialize + DeserializeOwned {
    /// Catalog name.
    const NAME: &'static str;

    /// One-line description.
    const DESCRIPTION: &'static str;

    /// Generates the component.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if the parameters cannot be realised
    /// with `tech`.
    fn build(&self, tech: &Technology) -> ParameterResult<Component>;
}

/// A catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorEntry {
    /// Catalog name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Decodes JSON parameters and generates the component.
    pub generate: fn(&serde_json::Value, &Technology) -> ParameterResult<Component>,
}

const fn entry<G: Generator>() -> GeneratorEntry {
    GeneratorEntry {
        name: G::NAME,
        description: G::DESCRIPTION,
        generate: run::<G>,
    }
}

/// All registered generators.
pub static CATALOG: &[GeneratorEntry] = &[
    entry::<mmi::Mmi1x2>(),
    entry::<mmi::Mmi2x2>(),
    entry::<waveguides::Straight>(),
    entry::<waveguides::Transition>(),
    entry::<bends::SBendVert>(),
    entry::<bends::UTurnBend>(),
    entry::<bends::UBendRacetrack>(),
    entry::<bends::LTurnBend>(),
    entry::<waveguides::DoubleLinearInverseTaper>(),
    entry::<electrodes::CpwProbePadLinear>(),
    entry::<electrodes::EoPhaseShifter>(),
    entry::<modulator::MzModulatorUnbalanced>(),
    entry::<frame::ChipFrame>(),
];

fn run<G: Generator>(params: &serde_json::Value, tech: &Technology) -> ParameterResult<Component> {
    let generator: G = if params.is_null() {
        G::default()
    } else {
        serde_json::from_value(params.clone()).map_err(|e| ParameterError::InvalidParameters {
            component: G::NAME.to_string(),
            message: e.to_string(),
        })?
    };
    let component = generator.build(tech)?;
    component.check_against(tech)?;
    Ok(component)
}

/// Names of all registered generators, sorted.
#[must_use]
pub fn component_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = CATALOG.iter().map(|e| e.name).collect();
    names.sort_unstable();
    names
}

/// Looks up a generator by name.
#[must_use]
pub fn generator(name: &str) -> Option<&'static GeneratorEntry> {
    CATALOG.iter().find(|e| e.name == name)
}

/// Generates component `name` from JSON parameters.
///
/// `null` parameters select the defaults; missing fields take their default
/// values. Without an explicit technology, the current default technology
/// is used.
///
/// # Errors
///
/// Returns [`ParameterError::UnknownComponent`] for an unregistered name,
/// [`ParameterError::InvalidParameters`] if the parameters do not decode,
/// or the generator's own error.
pub fn generate(name: &str, params: &serde_json::Value, tech: Option<&Technology>) -> ParameterResult<Component> {
    let entry = generator(name).ok_or_else(|| ParameterError::UnknownComponent {
        name: name.to_string(),
    })?;
    debug!(component = name, "generating component");
    match tech {
        Some(tech) => (entry.generate)(params, tech),
        None => (entry.generate)(params, &default_technology()),
    }
}

/// Resolves a port specification name.
pub(crate) fn port_spec<'a>(tech: &'a Technology, name: &str) -> ParameterResult<&'a PortSpec> {
    tech.port_spec(name).ok_or_else(|| ParameterError::UnknownPortSpec {
        name: name.to_string(),
    })
}

/// The core profile of an optical port specification.
pub(crate) fn core_profile<'a>(spec: &'a PortSpec, parameter: &str) -> ParameterResult<&'a PathProfile> {
    spec.core().ok_or_else(|| {
        ParameterError::constraint(
            parameter,
            format!("'{}' has no centred path profile", spec.description),
        )
    })
}

/// Parameter record stored on a generated component.
pub(crate) fn parameter_record<T: Serialize>(params: &T) -> serde_json::Value {
    serde_json::to_value(params).unwrap_or(serde_json::Value::Null)
}

/// The user-provided name, or `generated` if it is empty.
pub(crate) fn name_or(name: &str, generated: impl FnOnce() -> String) -> String {
    if name.is_empty() {
        generated()
    } else {
        name.to_string()
    }
}
