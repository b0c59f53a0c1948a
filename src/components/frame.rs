//! Chip frame marking the die outline.

use serde::{Deserialize, Serialize};

use super::{name_or, naming, parameter_record, Generator};
use crate::error::{ensure_positive, ParameterError, ParameterResult};
use crate::layout::{Component, Point, Polygon};
use crate::technology::layers::{CHIP_CONTOUR, CHIP_EXCLUSION_ZONE};
use crate::technology::Technology;

/// Distance between the die edge and the chip contour (µm).
pub const CONTOUR_MARGIN: f64 = 50.0;

/// Available die sizes along one axis (µm), smallest first.
pub const DIE_SIZES: [f64; 3] = [5050.0, 10100.0, 20200.0];

/// Snaps a requested die dimension to the next available die size.
#[must_use]
pub fn snapped_size(requested: f64) -> f64 {
    if requested < 10_000.0 {
        DIE_SIZES[0]
    } else if requested < 20_000.0 {
        DIE_SIZES[1]
    } else {
        DIE_SIZES[2]
    }
}

/// Die outline: the exclusion zone and the chip contour inside it.
///
/// Sizes are snapped to the available dies; the smallest die is
/// 5050 µm × 10100 µm in either orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChipFrame {
    /// Requested die width (µm).
    pub x_size: f64,
    /// Requested die height (µm).
    pub y_size: f64,
    /// Component name; generated if empty.
    pub name: String,
}

impl Default for ChipFrame {
    fn default() -> Self {
        Self {
            x_size: 10100.0,
            y_size: 5050.0,
            name: String::new(),
        }
    }
}

impl ChipFrame {
    /// Snapped die size.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive sizes or if both sizes snap to
    /// the smallest die.
    pub fn die_size(&self) -> ParameterResult<(f64, f64)> {
        ensure_positive("x_size", self.x_size)?;
        ensure_positive("y_size", self.y_size)?;
        let (x, y) = (snapped_size(self.x_size), snapped_size(self.y_size));
        if x == DIE_SIZES[0] && y == DIE_SIZES[0] {
            return Err(ParameterError::constraint(
                "x_size",
                "the minimal die size is 5050 µm x 10100 µm",
            ));
        }
        Ok((x, y))
    }
}

impl Generator for ChipFrame {
    const NAME: &'static str = "chip_frame";
    const DESCRIPTION: &'static str = "Die outline with exclusion zone";

    fn build(&self, _tech: &Technology) -> ParameterResult<Component> {
        let (x, y) = self.die_size()?;
        let name = name_or(&self.name, || naming::frame_name(x, y));
        let mut c = Component::new(name, parameter_record(self));
        c.add_polygon(
            CHIP_EXCLUSION_ZONE,
            Polygon::rectangle(Point::new(0.0, 0.0), Point::new(x, y)),
        );
        c.add_polygon(
            CHIP_CONTOUR,
            Polygon::rectangle(
                Point::new(CONTOUR_MARGIN, CONTOUR_MARGIN),
                Point::new(x - CONTOUR_MARGIN, y - CONTOUR_MARGIN),
            ),
        );
        Ok(c)
    }
}
