//! Layout primitives: points, polygons, ports and components.
//!
//! Coordinates are in µm and angles in degrees. A [`Component`] is a flat
//! collection of polygons per layer plus its ports; sub-components are
//! instantiated through a [`Reference`] and copied into the parent, so the
//! host always receives flat geometry.

pub mod path;

pub use path::Path;

use std::ops::{Add, Mul, Neg, Sub};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ParameterError, ParameterResult};
use crate::technology::{PortSpec, Technology};

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (µm).
    pub x: f64,
    /// Y coordinate (µm).
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    /// Unit vector pointing at `angle` degrees.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        let (c, s) = cos_sin(angle);
        Self::new(c, s)
    }

    /// Rotates the vector by `angle` degrees about the origin.
    #[must_use]
    pub fn rotated(self, angle: f64) -> Self {
        let (c, s) = cos_sin(angle);
        Self::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Cosine and sine of an angle in degrees, exact for multiples of 90°.
fn cos_sin(angle: f64) -> (f64, f64) {
    let a = angle.rem_euclid(360.0);
    if a == 0.0 {
        (1.0, 0.0)
    } else if a == 90.0 {
        (0.0, 1.0)
    } else if a == 180.0 {
        (-1.0, 0.0)
    } else if a == 270.0 {
        (0.0, -1.0)
    } else {
        let r = a.to_radians();
        (r.cos(), r.sin())
    }
}

/// Normalises an angle to `[0, 360)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// A closed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices, without repeating the first one.
    pub vertices: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon from its vertices.
    #[must_use]
    pub const fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle spanning two opposite corners.
    #[must_use]
    pub fn rectangle(a: Point, b: Point) -> Self {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        Self::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    /// Trapezoid along +x from `x0` to `x0 + length`, centred on `y = 0`,
    /// with widths `w0` and `w1` at its ends.
    #[must_use]
    pub fn linear_taper(x0: f64, length: f64, w0: f64, w1: f64) -> Self {
        Self::new(vec![
            Point::new(x0, -0.5 * w0),
            Point::new(x0 + length, -0.5 * w1),
            Point::new(x0 + length, 0.5 * w1),
            Point::new(x0, 0.5 * w0),
        ])
    }

    /// Signed area (positive for counter-clockwise vertices).
    #[must_use]
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        0.5 * twice
    }

    /// Bounding box as `(min, max)` corners.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point, Point)> {
        bounds_of(self.vertices.iter().copied())
    }

    /// Returns the polygon mapped through `transform`.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let mut vertices: Vec<Point> = self.vertices.iter().map(|&p| transform.apply(p)).collect();
        if transform.mirror {
            vertices.reverse();
        }
        Self::new(vertices)
    }

    /// Returns the polygon mirrored about the x axis.
    #[must_use]
    pub fn mirrored_y(&self) -> Self {
        self.transformed(&Transform::mirror())
    }
}

fn bounds_of(points: impl Iterator<Item = Point>) -> Option<(Point, Point)> {
    points.fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((
            Point::new(lo.x.min(p.x), lo.y.min(p.y)),
            Point::new(hi.x.max(p.x), hi.y.max(p.y)),
        )),
    })
}

/// Rigid transform: optional mirror about the x axis, then rotation, then
/// translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Rotation in degrees.
    pub rotation: f64,
    /// Translation applied last.
    pub translation: Point,
    /// Mirror about the x axis before rotating.
    pub mirror: bool,
}

impl Transform {
    /// Pure translation.
    #[must_use]
    pub const fn translation(offset: Point) -> Self {
        Self {
            rotation: 0.0,
            translation: offset,
            mirror: false,
        }
    }

    /// Mirror about the x axis.
    #[must_use]
    pub const fn mirror() -> Self {
        Self {
            rotation: 0.0,
            translation: Point::new(0.0, 0.0),
            mirror: true,
        }
    }

    /// Maps a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let p = if self.mirror { Point::new(p.x, -p.y) } else { p };
        p.rotated(self.rotation) + self.translation
    }

    /// Maps a direction given in degrees.
    #[must_use]
    pub fn apply_angle(&self, angle: f64) -> f64 {
        let a = if self.mirror { -angle } else { angle };
        normalize_angle(a + self.rotation)
    }

    /// Maps a port.
    #[must_use]
    pub fn apply_port(&self, port: &Port) -> Port {
        Port {
            name: port.name.clone(),
            center: self.apply(port.center),
            input_direction: self.apply_angle(port.input_direction),
            spec: port.spec.clone(),
            inverted: port.inverted ^ self.mirror,
        }
    }
}

/// A component port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within its component.
    pub name: String,
    /// Port centre.
    pub center: Point,
    /// Direction (degrees) in which signals enter the component.
    pub input_direction: f64,
    /// Cross-section at the port.
    pub spec: PortSpec,
    /// Whether the cross-section is mirrored with respect to the direction.
    pub inverted: bool,
}

impl Port {
    /// Creates an unnamed port; the name is assigned by
    /// [`Component::add_port`].
    #[must_use]
    pub fn new(center: Point, input_direction: f64, spec: &PortSpec) -> Self {
        Self {
            name: String::new(),
            center,
            input_direction: normalize_angle(input_direction),
            spec: spec.clone(),
            inverted: false,
        }
    }

    /// Marks the port as inverted.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Port cross-section width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.spec.width
    }

    /// Returns `true` if `other` can be connected to this port: same
    /// position, opposite direction, identical cross-section.
    #[must_use]
    pub fn mates_with(&self, other: &Self, tolerance: f64) -> bool {
        let turn = normalize_angle(self.input_direction - other.input_direction);
        self.center.distance(other.center) <= tolerance
            && (turn - 180.0).abs() <= 1e-9
            && self.spec == other.spec
    }
}

/// A generated layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    /// Component name.
    pub name: String,
    /// Parameters the component was generated with.
    pub parameters: serde_json::Value,
    /// Polygons per layer name, in drawing order.
    pub polygons: IndexMap<String, Vec<Polygon>>,
    /// Ports, in creation order.
    pub ports: Vec<Port>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            parameters,
            polygons: IndexMap::new(),
            ports: Vec::new(),
        }
    }

    /// Adds a polygon on `layer`.
    pub fn add_polygon(&mut self, layer: &str, polygon: Polygon) -> &mut Self {
        self.polygons
            .entry(layer.to_string())
            .or_default()
            .push(polygon);
        self
    }

    /// Adds the polygons of every path in `paths`.
    pub fn add_paths<'a>(&mut self, paths: impl IntoIterator<Item = &'a (String, Path)>) -> &mut Self {
        for (layer, path) in paths {
            self.add_polygon(layer, path.to_polygon());
        }
        self
    }

    /// Adds a port named `P{n}`, `n` being the number of existing ports.
    pub fn add_port(&mut self, mut port: Port) -> &mut Self {
        port.name = format!("P{}", self.ports.len());
        self.ports.push(port);
        self
    }

    /// Looks up a port by name.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MissingPort`] if there is no such port.
    pub fn port(&self, name: &str) -> ParameterResult<&Port> {
        self.ports
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ParameterError::MissingPort {
                component: self.name.clone(),
                port: name.to_string(),
            })
    }

    /// Copies the geometry of `reference` into this component.
    pub fn add_reference(&mut self, reference: &Reference<'_>) -> &mut Self {
        for (layer, polygons) in &reference.component.polygons {
            for polygon in polygons {
                self.add_polygon(layer, polygon.transformed(&reference.transform));
            }
        }
        self
    }

    /// Polygons on `layer`.
    #[must_use]
    pub fn layer_polygons(&self, layer: &str) -> &[Polygon] {
        self.polygons.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bounding box of all polygons.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point, Point)> {
        bounds_of(
            self.polygons
                .values()
                .flatten()
                .flat_map(|p| p.vertices.iter().copied()),
        )
    }

    /// Checks that every layer exists in `tech` and every port uses one of
    /// its standard port specifications.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::UnknownLayer`] or
    /// [`ParameterError::UnknownPortSpec`] on the first mismatch.
    pub fn check_against(&self, tech: &Technology) -> ParameterResult<()> {
        if let Some(layer) = self.polygons.keys().find(|l| tech.layer(l).is_none()) {
            return Err(ParameterError::UnknownLayer {
                name: layer.clone(),
            });
        }
        if let Some(port) = self.ports.iter().find(|p| tech.port_spec_name(&p.spec).is_none()) {
            return Err(ParameterError::UnknownPortSpec {
                name: format!("{} (port {} of {})", port.spec.description, port.name, self.name),
            });
        }
        Ok(())
    }
}

/// A placed instance of a component.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    component: &'a Component,
    transform: Transform,
}

impl<'a> Reference<'a> {
    /// Places `component` at the origin.
    #[must_use]
    pub fn new(component: &'a Component) -> Self {
        Self {
            component,
            transform: Transform::default(),
        }
    }

    /// Places `component` with its origin at `origin`.
    #[must_use]
    pub fn at(component: &'a Component, origin: Point) -> Self {
        Self {
            component,
            transform: Transform::translation(origin),
        }
    }

    /// Mirrors the instance about its local x axis.
    #[must_use]
    pub fn mirrored(mut self) -> Self {
        self.transform.mirror = !self.transform.mirror;
        self
    }

    /// Current transform.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Moves the instance so that its port `port` mates with `target`.
    ///
    /// Mirroring is preserved; rotation and translation are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MissingPort`] if the component has no such
    /// port.
    pub fn connect(mut self, port: &str, target: &Port) -> ParameterResult<Self> {
        let local = self.component.port(port)?;
        let mirror = Transform {
            mirror: self.transform.mirror,
            ..Transform::default()
        };
        let center = mirror.apply(local.center);
        let direction = mirror.apply_angle(local.input_direction);
        let rotation = normalize_angle(target.input_direction + 180.0 - direction);
        self.transform.rotation = rotation;
        self.transform.translation = target.center - center.rotated(rotation);
        Ok(self)
    }

    /// Port `name` of the instance, in parent coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MissingPort`] if the component has no such
    /// port.
    pub fn port(&self, name: &str) -> ParameterResult<Port> {
        self.component
            .port(name)
            .map(|p| self.transform.apply_port(p))
    }
}
