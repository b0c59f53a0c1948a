//! Parametric paths: a spine with a width profile, converted to a polygon.

use super::{Point, Polygon};
use crate::error::{ensure_bound, Bound, ParameterResult};
use crate::technology::PortSpec;

/// Number of spine points per curved section.
const CURVE_POINTS: usize = 96;

/// Integration sub-steps per spine point of an Euler bend.
const EULER_SUBSTEPS: usize = 16;

/// A path of varying width along a polyline spine.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    spine: Vec<Point>,
    widths: Vec<f64>,
    offset: f64,
}

impl Path {
    /// Starts a path at `origin` with `width`.
    #[must_use]
    pub fn new(origin: Point, width: f64) -> Self {
        Self {
            spine: vec![origin],
            widths: vec![width],
            offset: 0.0,
        }
    }

    /// Shifts the drawn strip `offset` to the left of the spine.
    #[must_use]
    pub const fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Current end point.
    #[must_use]
    pub fn end(&self) -> Point {
        *self.spine.last().unwrap_or(&Point::default())
    }

    /// Current width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.widths.last().copied().unwrap_or(0.0)
    }

    fn push(&mut self, p: Point, width: f64) {
        if self.end().distance(p) > 1e-12 {
            self.spine.push(p);
            self.widths.push(width);
        } else if let Some(last) = self.widths.last_mut() {
            *last = width;
        }
    }

    /// Straight segment to `end`, linearly tapering to `end_width` if given.
    pub fn segment(&mut self, end: Point, end_width: Option<f64>) -> &mut Self {
        let width = end_width.unwrap_or_else(|| self.width());
        self.push(end, width);
        self
    }

    /// Cubic Bézier curve from the current end through three control
    /// points; with `relative`, they are offsets from the current end.
    pub fn bezier(&mut self, controls: [Point; 3], relative: bool) -> &mut Self {
        let p0 = self.end();
        let [p1, p2, p3] = if relative {
            controls.map(|c| c + p0)
        } else {
            controls
        };
        let width = self.width();
        for i in 1..=CURVE_POINTS {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / CURVE_POINTS as f64;
            let u = 1.0 - t;
            let p = p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t);
            self.push(p, width);
        }
        self
    }

    /// Bend of `turn` degrees (positive counter-clockwise) ending at `end`.
    ///
    /// A fraction `euler_fraction` of the turn uses a linear curvature
    /// ramp at each end (Euler spiral); the rest is circular. The curve is
    /// scaled and rotated so it ends exactly at `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if `euler_fraction` is outside `[0, 1]` or `turn`
    /// is zero or not finite.
    pub fn euler_bend(&mut self, turn: f64, euler_fraction: f64, end: Point) -> ParameterResult<&mut Self> {
        ensure_bound("euler_fraction", euler_fraction, Bound::Finite)?;
        ensure_bound(
            "euler_fraction",
            euler_fraction,
            Bound::Min {
                limit: 0.0,
                inclusive: true,
            },
        )?;
        ensure_bound(
            "euler_fraction",
            euler_fraction,
            Bound::Max {
                limit: 1.0,
                inclusive: true,
            },
        )?;
        ensure_bound("turn", turn.abs(), Bound::Finite)?;
        ensure_bound(
            "turn",
            turn.abs(),
            Bound::Min {
                limit: 0.0,
                inclusive: false,
            },
        )?;

        let unit = euler_curve(turn.abs().to_radians(), euler_fraction);
        let sign = turn.signum();
        let unit: Vec<Point> = unit.into_iter().map(|p| Point::new(p.x, sign * p.y)).collect();

        let start = self.end();
        let chord = end - start;
        let unit_chord = *unit.last().unwrap_or(&Point::new(1.0, 0.0));
        let scale = chord.norm() / unit_chord.norm();
        let rotation = chord.y.atan2(chord.x) - unit_chord.y.atan2(unit_chord.x);
        let (s, c) = rotation.sin_cos();

        let width = self.width();
        let n = unit.len();
        for (i, p) in unit.into_iter().enumerate().skip(1) {
            let q = if i + 1 == n {
                end
            } else {
                start + Point::new(c * p.x - s * p.y, s * p.x + c * p.y) * scale
            };
            self.push(q, width);
        }
        Ok(self)
    }

    /// Converts the path into a polygon.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon {
        let n = self.spine.len();
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            let prev = self.spine[i.saturating_sub(1)];
            let next = self.spine[(i + 1).min(n - 1)];
            let tangent = next - prev;
            let len = tangent.norm();
            let normal = if len > 0.0 {
                Point::new(-tangent.y / len, tangent.x / len)
            } else {
                Point::new(0.0, 1.0)
            };
            let half = 0.5 * self.widths[i];
            left.push(self.spine[i] + normal * (self.offset + half));
            right.push(self.spine[i] + normal * (self.offset - half));
        }
        right.extend(left.into_iter().rev());
        Polygon::new(right)
    }
}

/// Unit-curvature Euler bend starting at the origin heading along +x and
/// turning counter-clockwise by `theta` radians.
fn euler_curve(theta: f64, fraction: f64) -> Vec<Point> {
    let s_ramp = fraction * theta;
    let s_arc = (1.0 - fraction) * theta;
    let length = 2.0 * s_ramp + s_arc;
    let heading = |s: f64| -> f64 {
        if s <= s_ramp {
            s * s / (2.0 * s_ramp)
        } else if s <= s_ramp + s_arc {
            0.5 * s_ramp + (s - s_ramp)
        } else {
            let r = length - s;
            theta - r * r / (2.0 * s_ramp)
        }
    };

    #[allow(clippy::cast_precision_loss)]
    let ds = length / (CURVE_POINTS * EULER_SUBSTEPS) as f64;
    let mut points = Vec::with_capacity(CURVE_POINTS + 1);
    let mut p = Point::default();
    points.push(p);
    for i in 0..CURVE_POINTS * EULER_SUBSTEPS {
        #[allow(clippy::cast_precision_loss)]
        let mid = (i as f64 + 0.5) * ds;
        p = p + Point::new(heading(mid).cos(), heading(mid).sin()) * ds;
        if (i + 1) % EULER_SUBSTEPS == 0 {
            points.push(p);
        }
    }
    points
}

/// Creates one path per profile of `spec`, all starting at `origin`.
///
/// Profile offsets are applied to the left of the travel direction.
#[must_use]
pub fn spec_paths(spec: &PortSpec, origin: Point) -> Vec<(String, Path)> {
    spec.path_profiles
        .iter()
        .map(|p| (p.layer.clone(), Path::new(origin, p.width).with_offset(p.offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_segment_is_rectangle() {
        let mut path = Path::new(Point::new(0.0, 0.0), 2.0);
        path.segment(Point::new(10.0, 0.0), None);
        let poly = path.to_polygon();
        assert_eq!(poly.vertices.len(), 4);
        assert!((poly.area() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn taper_interpolates_width() {
        let mut path = Path::new(Point::new(0.0, 0.0), 2.0);
        path.segment(Point::new(10.0, 0.0), Some(4.0));
        assert!((path.to_polygon().area() - 30.0).abs() < 1e-12);
        assert!((path.width() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn offset_shifts_strip() {
        let mut path = Path::new(Point::new(0.0, 0.0), 2.0).with_offset(5.0);
        path.segment(Point::new(10.0, 0.0), None);
        let (lo, hi) = path.to_polygon().bounds().unwrap();
        assert!((lo.y - 4.0).abs() < 1e-12);
        assert!((hi.y - 6.0).abs() < 1e-12);
    }

    #[test]
    fn euler_bend_ends_at_target() {
        for fraction in [0.0, 0.5, 1.0] {
            let mut path = Path::new(Point::new(0.0, 0.0), 1.0);
            path.euler_bend(90.0, fraction, Point::new(80.0, 80.0)).unwrap();
            assert_eq!(path.end(), Point::new(80.0, 80.0));
            // symmetric about the chord bisector
            let mid = path.spine[path.spine.len() / 2];
            assert!((mid.x + mid.y - 80.0).abs() < 1e-6);
            assert!(path.spine.iter().all(|p| p.x >= -1e-9 && p.y >= -1e-9));
        }
    }

    #[test]
    fn u_turn_returns_to_start_column() {
        let mut path = Path::new(Point::new(0.0, 0.0), 1.0);
        path.euler_bend(-180.0, 1.0, Point::new(0.0, -80.0)).unwrap();
        assert_eq!(path.end(), Point::new(0.0, -80.0));
        let max_x = path.spine.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!(max_x > 0.0);
        assert!(path.spine.iter().all(|p| p.y <= 1e-9));
    }

    #[test]
    fn euler_fraction_is_checked() {
        let mut path = Path::new(Point::new(0.0, 0.0), 1.0);
        assert!(path.euler_bend(90.0, 1.5, Point::new(1.0, 1.0)).is_err());
    }
}
