use crate::graphics::Rgba;
use crate::math::{self, Angles};

/// A point in model space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Point3D { x, y, z }
    }

    /// Rotates the point in place, X then Y then Z
    pub fn rotate_in_place(&mut self, angles: Angles) {
        *self = math::rotate(*self, angles);
    }
}

/// One of the three labelled axis markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            Axis::X => Rgba::rgb(255, 0, 0),
            Axis::Y => Rgba::rgb(0, 255, 0),
            Axis::Z => Rgba::rgb(0, 0, 255),
        }
    }

    /// Marker endpoint before any rotation
    fn endpoint(self) -> Point3D {
        match self {
            Axis::X => Point3D::new(AXIS_LENGTH, 0.0, 0.0),
            Axis::Y => Point3D::new(0.0, AXIS_LENGTH, 0.0),
            Axis::Z => Point3D::new(0.0, 0.0, AXIS_LENGTH),
        }
    }
}

/// Distance of each axis marker from the origin
pub const AXIS_LENGTH: f64 = 2.0;

/// Cube edges (pairs of vertex indices)
pub const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0), // Back face
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4), // Front face
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7), // Connecting edges
];

/// Cube faces (each face is defined by 4 vertex indices)
pub const FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [5, 4, 7, 6],
    [4, 0, 3, 7],
    [1, 5, 6, 2],
    [4, 5, 1, 0],
    [3, 2, 6, 7],
];

/// Index into `FACES` of the face drawn in the opaque tone
pub const OPAQUE_FACE: usize = 0;

/// The cube and its axis markers. Counts are fixed by the array types; only
/// coordinates change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub vertices: [Point3D; 8],
    pub axes: [(Axis, Point3D); 3],
}

impl Scene {
    pub fn cube() -> Self {
        Scene {
            vertices: [
                Point3D::new(-1.0, 1.0, -1.0),  // 0
                Point3D::new(1.0, 1.0, -1.0),   // 1
                Point3D::new(1.0, -1.0, -1.0),  // 2
                Point3D::new(-1.0, -1.0, -1.0), // 3
                Point3D::new(-1.0, 1.0, 1.0),   // 4
                Point3D::new(1.0, 1.0, 1.0),    // 5
                Point3D::new(1.0, -1.0, 1.0),   // 6
                Point3D::new(-1.0, -1.0, 1.0),  // 7
            ],
            axes: Axis::ALL.map(|axis| (axis, axis.endpoint())),
        }
    }

    /// Applies one incremental rotation to every vertex and axis marker
    pub fn rotate(&mut self, angles: Angles) {
        for vertex in self.vertices.iter_mut() {
            vertex.rotate_in_place(angles);
        }
        for (_, marker) in self.axes.iter_mut() {
            marker.rotate_in_place(angles);
        }
    }

    pub fn marker(&self, axis: Axis) -> Point3D {
        self.axes
            .iter()
            .find(|(a, _)| *a == axis)
            .map(|&(_, p)| p)
            .unwrap_or(Point3D::ORIGIN)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::cube()
    }
}
