//! Edge coupler placement along a chip boundary.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::frame::CONTOUR_MARGIN;
use crate::error::{ensure_non_negative, ensure_positive, ParameterError, ParameterResult};
use crate::layout::{normalize_angle, Point, Port};

/// Side of a rectangular chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Edge along `y = 0`.
    Bottom,
    /// Edge along `x = x_size`.
    Right,
    /// Edge along `y = y_size`.
    Top,
    /// Edge along `x = 0`.
    Left,
}

/// A straight chip boundary.
///
/// Distances are measured from `origin` along `direction`; the chip lies
/// on the left, so couplers face `direction + 90°`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipEdge {
    /// Start of the edge.
    pub origin: Point,
    /// Usable length (µm).
    pub length: f64,
    /// Direction along the edge (degrees).
    pub direction: f64,
}

impl ChipEdge {
    /// Edge `side` of the usable contour of an `x_size` × `y_size` chip
    /// frame, traversed counter-clockwise.
    #[must_use]
    pub fn of_frame(x_size: f64, y_size: f64, side: Side) -> Self {
        let (lo, x_hi, y_hi) = (CONTOUR_MARGIN, x_size - CONTOUR_MARGIN, y_size - CONTOUR_MARGIN);
        let (origin, length, direction) = match side {
            Side::Bottom => (Point::new(lo, lo), x_hi - lo, 0.0),
            Side::Right => (Point::new(x_hi, lo), y_hi - lo, 90.0),
            Side::Top => (Point::new(x_hi, y_hi), x_hi - lo, 180.0),
            Side::Left => (Point::new(lo, y_hi), y_hi - lo, 270.0),
        };
        Self {
            origin,
            length,
            direction,
        }
    }

    /// Direction pointing into the chip (degrees).
    #[must_use]
    pub fn inward_normal(&self) -> f64 {
        normalize_angle(self.direction + 90.0)
    }

    /// Point at `distance` along the edge.
    #[must_use]
    pub fn point_at(&self, distance: f64) -> Point {
        self.origin + Point::from_angle(self.direction) * distance
    }
}

/// Spacing policy along the edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpacing {
    /// Centre-to-centre distance between neighbouring couplers (µm).
    pub pitch: f64,
    /// Keep-out from the start of the edge to the first footprint (µm).
    pub start_offset: f64,
}

/// Placement of one coupler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouplerSite {
    /// Name of the port served by this coupler.
    pub port: String,
    /// Coupler centre on the edge.
    pub position: Point,
    /// Distance of the centre from the edge origin (µm).
    pub distance: f64,
    /// Direction the coupler faces, into the chip (degrees).
    pub orientation: f64,
}

/// Result of [`place_edge_couplers`]: one site per requested port, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeCouplerPlacement {
    /// The edge the couplers are placed on.
    pub edge: ChipEdge,
    /// Sites, sorted by distance along the edge.
    pub sites: Vec<CouplerSite>,
}

/// Places one coupler per port along `edge`.
///
/// Site `i` is centred at `start_offset + footprint / 2 + i * pitch` from
/// the edge origin. Nothing is truncated: either every port gets a site or
/// the call fails.
///
/// # Errors
///
/// Returns [`ParameterError::InsufficientEdge`] if
/// `start_offset + (n - 1) * pitch + footprint` exceeds the edge length, a
/// [`ParameterError::Constraint`] if `pitch < footprint`, and an
/// out-of-range error for non-positive pitch, footprint or edge length, or
/// a negative start offset.
pub fn place_edge_couplers(
    ports: &[Port],
    edge: &ChipEdge,
    spacing: &EdgeSpacing,
    footprint: f64,
) -> ParameterResult<EdgeCouplerPlacement> {
    ensure_positive("pitch", spacing.pitch)?;
    ensure_positive("footprint", footprint)?;
    ensure_positive("length", edge.length)?;
    ensure_non_negative("start_offset", spacing.start_offset)?;
    if spacing.pitch < footprint {
        return Err(ParameterError::constraint(
            "pitch",
            format!(
                "pitch {} is smaller than the coupler footprint {footprint}",
                spacing.pitch
            ),
        ));
    }

    if let Some(last) = ports.len().checked_sub(1) {
        #[allow(clippy::cast_precision_loss)]
        let required = spacing.start_offset + last as f64 * spacing.pitch + footprint;
        if required > edge.length {
            return Err(ParameterError::InsufficientEdge {
                count: ports.len(),
                required,
                available: edge.length,
            });
        }
    }

    let orientation = edge.inward_normal();
    let sites: Vec<CouplerSite> = ports
        .iter()
        .enumerate()
        .map(|(i, port)| {
            #[allow(clippy::cast_precision_loss)]
            let distance = spacing.start_offset + 0.5 * footprint + i as f64 * spacing.pitch;
            CouplerSite {
                port: port.name.clone(),
                position: edge.point_at(distance),
                distance,
                orientation,
            }
        })
        .collect();

    debug!(count = sites.len(), pitch = spacing.pitch, "placed edge couplers");
    Ok(EdgeCouplerPlacement { edge: *edge, sites })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technology::default_technology;

    fn ports(n: usize) -> Vec<Port> {
        let tech = default_technology();
        let spec = tech.port_spec("RWG1000").unwrap();
        (0..n)
            .map(|i| {
                let mut p = Port::new(Point::new(0.0, 0.0), 0.0, spec);
                p.name = format!("P{i}");
                p
            })
            .collect()
    }

    fn edge(length: f64) -> ChipEdge {
        ChipEdge {
            origin: Point::new(0.0, 0.0),
            length,
            direction: 0.0,
        }
    }

    #[test]
    fn sites_are_evenly_spaced() {
        let spacing = EdgeSpacing {
            pitch: 127.0,
            start_offset: 10.0,
        };
        let placement = place_edge_couplers(&ports(3), &edge(500.0), &spacing, 50.0).unwrap();
        let distances: Vec<f64> = placement.sites.iter().map(|s| s.distance).collect();
        assert_eq!(distances, vec![35.0, 162.0, 289.0]);
        assert_eq!(placement.sites[2].port, "P2");
        assert_eq!(placement.sites[1].position, Point::new(162.0, 0.0));
        assert!((placement.sites[0].orientation - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_fit_succeeds() {
        let spacing = EdgeSpacing {
            pitch: 100.0,
            start_offset: 0.0,
        };
        assert!(place_edge_couplers(&ports(4), &edge(350.0), &spacing, 50.0).is_ok());
        let err = place_edge_couplers(&ports(4), &edge(349.0), &spacing, 50.0).unwrap_err();
        assert!(matches!(err, ParameterError::InsufficientEdge { count: 4, .. }));
    }

    #[test]
    fn overlapping_footprints_are_rejected() {
        let spacing = EdgeSpacing {
            pitch: 40.0,
            start_offset: 0.0,
        };
        let err = place_edge_couplers(&ports(2), &edge(1000.0), &spacing, 50.0).unwrap_err();
        assert!(matches!(err, ParameterError::Constraint { .. }));
    }

    #[test]
    fn invalid_spacing_is_rejected() {
        let bad = [(0.0, 0.0), (-5.0, 0.0), (100.0, -1.0)];
        for (pitch, start_offset) in bad {
            let spacing = EdgeSpacing { pitch, start_offset };
            let result = place_edge_couplers(&ports(1), &edge(1000.0), &spacing, 50.0);
            assert!(matches!(result, Err(ParameterError::OutOfRange { .. })));
        }
    }

    #[test]
    fn frame_edges_face_inwards() {
        let right = ChipEdge::of_frame(10100.0, 5050.0, Side::Right);
        assert_eq!(right.origin, Point::new(10050.0, 50.0));
        assert!((right.length - 4950.0).abs() < 1e-9);
        assert!((right.inward_normal() - 180.0).abs() < f64::EPSILON);
        let left = ChipEdge::of_frame(10100.0, 5050.0, Side::Left);
        assert_eq!(left.point_at(left.length), Point::new(50.0, 50.0));
        assert!(left.inward_normal().abs() < f64::EPSILON);
    }
}
