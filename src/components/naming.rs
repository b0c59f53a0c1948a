//! Generated component names.
//!
//! Components without a user-provided name are named after their generator
//! prefix, their key dimensions and, for waveguide components, the port
//! specification.
//!
//! # Name Format
//!
//! `{PREFIX}_{KEY}{VALUE}...[_{SPEC}]`, dimensions in nm.
//!
//! Examples:
//! - `MMI1x2_W6000L26750_RWG1000` - default 1×2 MMI
//! - `LBEND_R80000_RWG1000` - 90° bend with 80 µm effective radius
//! - `CHIP_FRAME_X10100Y5050` - chip frame, sizes in µm

/// Formats a name from a prefix, tagged dimensions (µm) and an optional
/// port specification.
///
/// # Examples
///
/// ```
/// use lnoi400_pdk::components::naming::component_name;
///
/// let name = component_name("MMI1x2", &[('W', 6.0), ('L', 26.75)], Some("RWG1000"));
/// assert_eq!(name, "MMI1x2_W6000L26750_RWG1000");
/// ```
#[must_use]
pub fn component_name(prefix: &str, dimensions: &[(char, f64)], port_spec: Option<&str>) -> String {
    let mut name = prefix.to_string();
    if !dimensions.is_empty() {
        name.push('_');
        for (tag, value) in dimensions {
            name.push(*tag);
            name.push_str(&um_to_nm(*value).to_string());
        }
    }
    if let Some(spec) = port_spec {
        name.push('_');
        name.push_str(spec);
    }
    name
}

/// Name of a chip frame of the given (snapped) size.
#[must_use]
pub fn frame_name(x_size: f64, y_size: f64) -> String {
    // Frame sizes are whole micrometres
    #[allow(clippy::cast_possible_truncation)]
    let (x, y) = (x_size.round() as i64, y_size.round() as i64);
    format!("CHIP_FRAME_X{x}Y{y}")
}

/// Converts micrometres to whole nanometres.
fn um_to_nm(um: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let nm = (um * 1000.0).round() as i64;
    nm
}
