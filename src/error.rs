//! Error types for lnoi400-pdk.
//!
//! Three error families exist:
//!
//! - [`ValidationError`]: a fabrication parameter is outside its valid range
//!   when building a [`Technology`](crate::technology::Technology).
//! - [`ParameterError`]: a component, CPW or placement request cannot be
//!   realised with the given technology.
//! - [`ConfigError`]: the configuration file could not be loaded.
//!
//! All checks run before any result is constructed, so a failing call never
//! leaves a partially built object behind.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::technology::Technology;

/// Result type for component, CPW and placement operations.
pub type ParameterResult<T> = Result<T, ParameterError>;

/// A violated bound on a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Value must be finite.
    Finite,
    /// Value must be greater than `limit` (or equal, if `inclusive`).
    Min {
        /// Lower limit.
        limit: f64,
        /// Whether the limit itself is allowed.
        inclusive: bool,
    },
    /// Value must be less than `limit` (or equal, if `inclusive`).
    Max {
        /// Upper limit.
        limit: f64,
        /// Whether the limit itself is allowed.
        inclusive: bool,
    },
}

impl Bound {
    /// Returns `true` if `value` satisfies this bound.
    #[must_use]
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            Self::Finite => value.is_finite(),
            Self::Min { limit, inclusive } => {
                if inclusive {
                    value >= limit
                } else {
                    value > limit
                }
            }
            Self::Max { limit, inclusive } => {
                if inclusive {
                    value <= limit
                } else {
                    value < limit
                }
            }
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite => write!(f, "must be finite"),
            Self::Min { limit, inclusive: true } => write!(f, "must be at least {limit}"),
            Self::Min { limit, inclusive: false } => write!(f, "must be greater than {limit}"),
            Self::Max { limit, inclusive: true } => write!(f, "must be at most {limit}"),
            Self::Max { limit, inclusive: false } => write!(f, "must be less than {limit}"),
        }
    }
}

/// A fabrication parameter lies outside its declared range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid fabrication parameter '{parameter}' = {value}: {bound}")]
pub struct ValidationError {
    /// Name of the offending parameter.
    pub parameter: &'static str,
    /// The rejected value.
    pub value: f64,
    /// The bound that was violated.
    pub bound: Bound,
}

/// A geometric or electrical request that cannot be realised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A numeric parameter violates a bound.
    #[error("invalid parameter '{parameter}' = {value}: {bound}")]
    OutOfRange {
        /// Parameter name.
        parameter: String,
        /// The rejected value.
        value: f64,
        /// The bound that was violated.
        bound: Bound,
    },

    /// A width is narrower than the layer's minimum manufacturable feature.
    #[error(
        "parameter '{parameter}' = {value} is below the minimum feature width {minimum} of layer {layer}"
    )]
    BelowMinimumFeature {
        /// Parameter name.
        parameter: String,
        /// The rejected width.
        value: f64,
        /// Minimum feature width of the layer.
        minimum: f64,
        /// Layer the width is drawn on.
        layer: String,
    },

    /// A relation between several parameters is not satisfied.
    #[error("invalid parameter '{parameter}': {message}")]
    Constraint {
        /// Primary parameter involved.
        parameter: String,
        /// Description of the violated condition.
        message: String,
    },

    /// The technology has no port specification with this name.
    #[error("unknown port specification: {name}")]
    UnknownPortSpec {
        /// Requested port specification.
        name: String,
    },

    /// The technology has no layer with this name.
    #[error("unknown layer: {name}")]
    UnknownLayer {
        /// Requested layer.
        name: String,
    },

    /// No generator is registered under this name.
    #[error("unknown component: {name}")]
    UnknownComponent {
        /// Requested component.
        name: String,
    },

    /// A component has no port with this name.
    #[error("component '{component}' has no port '{port}'")]
    MissingPort {
        /// Component name.
        component: String,
        /// Requested port.
        port: String,
    },

    /// Generator parameters could not be decoded.
    #[error("invalid parameters for '{component}': {message}")]
    InvalidParameters {
        /// Generator name.
        component: String,
        /// Decoder message.
        message: String,
    },

    /// No geometry satisfies an electrical target.
    #[error("unrealizable target: {message}")]
    Unrealizable {
        /// Description of the target and the realizable range.
        message: String,
    },

    /// Requested couplers do not fit along the chip edge.
    #[error("{count} couplers need {required} µm of edge but only {available} µm are available")]
    InsufficientEdge {
        /// Number of requested couplers.
        count: usize,
        /// Edge length required.
        required: f64,
        /// Edge length available.
        available: f64,
    },
}

impl ParameterError {
    /// Builds a [`ParameterError::Constraint`].
    pub fn constraint(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(parameter: &str, value: f64) -> ParameterResult<()> {
    ensure_bound(parameter, value, Bound::Finite)?;
    ensure_bound(
        parameter,
        value,
        Bound::Min {
            limit: 0.0,
            inclusive: false,
        },
    )
}

/// Checks that `value` is finite and not negative.
pub(crate) fn ensure_non_negative(parameter: &str, value: f64) -> ParameterResult<()> {
    ensure_bound(parameter, value, Bound::Finite)?;
    ensure_bound(
        parameter,
        value,
        Bound::Min {
            limit: 0.0,
            inclusive: true,
        },
    )
}

/// Checks that `value` satisfies `bound`.
pub(crate) fn ensure_bound(parameter: &str, value: f64, bound: Bound) -> ParameterResult<()> {
    if bound.admits(value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            parameter: parameter.to_string(),
            value,
            bound,
        })
    }
}

/// Checks a width against the minimum feature of `layer`.
pub(crate) fn check_min_feature(tech: &Technology, parameter: &str, value: f64, layer: &str) -> ParameterResult<()> {
    let minimum = tech.min_feature_width(layer);
    if value < minimum {
        return Err(ParameterError::BelowMinimumFeature {
            parameter: parameter.to_string(),
            value,
            minimum,
            layer: layer.to_string(),
        });
    }
    Ok(())
}

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },

    /// Technology parameters in the configuration are out of range.
    #[error("invalid technology configuration")]
    Technology(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_names_parameter_and_bound() {
        let error = ValidationError {
            parameter: "cladding_thickness",
            value: -1.0,
            bound: Bound::Min {
                limit: 0.0,
                inclusive: true,
            },
        };
        let msg = error.to_string();
        assert!(msg.contains("cladding_thickness"));
        assert!(msg.contains("at least 0"));
    }

    #[test]
    fn bounds_admit_values() {
        let strict = Bound::Min {
            limit: 0.0,
            inclusive: false,
        };
        assert!(strict.admits(0.1));
        assert!(!strict.admits(0.0));
        let max = Bound::Max {
            limit: 2.0,
            inclusive: true,
        };
        assert!(max.admits(2.0));
        assert!(!max.admits(2.1));
        assert!(!Bound::Finite.admits(f64::NAN));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_nan() {
        assert!(ensure_positive("length", 1.0).is_ok());
        assert!(matches!(
            ensure_positive("length", 0.0),
            Err(ParameterError::OutOfRange { .. })
        ));
        assert!(ensure_positive("length", f64::NAN).is_err());
        assert!(ensure_non_negative("offset", 0.0).is_ok());
        assert!(ensure_non_negative("offset", -0.5).is_err());
    }

    #[test]
    fn check_min_feature_names_layer() {
        let tech = crate::technology::TechnologyParams::default().build().unwrap();
        let minimum = tech.min_feature_width("LN_STRIP");
        assert!(check_min_feature(&tech, "width", minimum, "LN_STRIP").is_ok());
        let err = check_min_feature(&tech, "width", 0.5 * minimum, "LN_STRIP").unwrap_err();
        assert!(matches!(
            err,
            ParameterError::BelowMinimumFeature { ref parameter, ref layer, .. }
                if parameter == "width" && layer == "LN_STRIP"
        ));
    }
}
