use crate::geometry::{Axis, Point3D, Scene, EDGES, FACES, OPAQUE_FACE};
use crate::graphics::{Frame, Rgba};
use crate::math::{shadow_project, Camera};

pub const BACKGROUND: Rgba = Rgba::BLACK;
pub const SHADOW: Rgba = Rgba::rgb(60, 60, 60);
pub const FACE: Rgba = Rgba::rgba(180, 180, 200, 70);
pub const OPAQUE: Rgba = Rgba::rgb(70, 70, 140);
pub const EDGE: Rgba = Rgba::WHITE;

const SHADOW_WIDTH: u32 = 1;
const EDGE_WIDTH: u32 = 2;
const AXIS_WIDTH: u32 = 2;

/// A single-character label to be drawn over the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub text: char,
    pub position: (i32, i32),
    pub color: Rgba,
}

/// Composes one frame of the scene, back to front. Returns the axis labels,
/// which the surface draws as text on top of the pixels.
pub fn render_scene(
    frame: &mut Frame,
    scene: &Scene,
    camera: &Camera,
    light: Point3D,
) -> Vec<Label> {
    frame.clear(BACKGROUND);

    let shadows: Vec<Option<(i32, i32)>> = scene
        .vertices
        .iter()
        .map(|&v| shadow_project(v, light).map(|s| camera.project(s)))
        .collect();
    for &(a, b) in &EDGES {
        if let (Some(from), Some(to)) = (shadows[a], shadows[b]) {
            frame.draw_line(from, to, SHADOW, SHADOW_WIDTH);
        }
    }

    let projected = scene.vertices.map(|v| camera.project(v));

    for (index, &face) in FACES.iter().enumerate() {
        let points = face.map(|i| projected[i]);
        let color = if index == OPAQUE_FACE { OPAQUE } else { FACE };
        frame.fill_polygon(&points, color);
    }

    for &(a, b) in &EDGES {
        frame.draw_line(projected[a], projected[b], EDGE, EDGE_WIDTH);
    }

    let origin = camera.project(Point3D::ORIGIN);
    Axis::ALL
        .iter()
        .map(|&axis| {
            let end = camera.project(scene.marker(axis));
            frame.draw_line(origin, end, axis.color(), AXIS_WIDTH);
            Label {
                text: axis.label(),
                position: end,
                color: axis.color(),
            }
        })
        .collect()
}
