use crate::geometry::Point3D;

/// Z coordinate of the plane shadows are cast onto
pub const SHADOW_PLANE_Z: f64 = -2.0;

/// Rotation angles in radians about the X, Y and Z axes (pitch, yaw, roll)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Angles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Angles {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Angles { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl std::ops::Neg for Angles {
    type Output = Angles;

    fn neg(self) -> Angles {
        Angles::new(-self.x, -self.y, -self.z)
    }
}

/// Rotates a point about the X axis
pub fn rotate_x(p: Point3D, angle: f64) -> Point3D {
    let (sin, cos) = angle.sin_cos();
    Point3D::new(p.x, p.y * cos - p.z * sin, p.y * sin + p.z * cos)
}

/// Rotates a point about the Y axis
pub fn rotate_y(p: Point3D, angle: f64) -> Point3D {
    let (sin, cos) = angle.sin_cos();
    Point3D::new(p.x * cos + p.z * sin, p.y, -p.x * sin + p.z * cos)
}

/// Rotates a point about the Z axis
pub fn rotate_z(p: Point3D, angle: f64) -> Point3D {
    let (sin, cos) = angle.sin_cos();
    Point3D::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos, p.z)
}

/// Rotates about X, then the result about Y, then that about Z.
///
/// Each step consumes the previous step's output, so this is not the same as
/// rotating the original point by a single combined matrix built in another
/// order.
pub fn rotate(p: Point3D, angles: Angles) -> Point3D {
    rotate_z(rotate_y(rotate_x(p, angles.x), angles.y), angles.z)
}

/// Pinhole camera looking down +Z at a fixed-size surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov: f64,
    pub viewer_distance: f64,
    pub width: u32,
    pub height: u32,
}

impl Camera {
    pub fn new(fov: f64, viewer_distance: f64, width: u32, height: u32) -> Self {
        Camera {
            fov,
            viewer_distance,
            width,
            height,
        }
    }

    /// Projects a point to integer screen coordinates.
    ///
    /// Nothing is clipped: points behind the camera or off-screen come back
    /// with out-of-range (or saturated) coordinates.
    pub fn project(&self, p: Point3D) -> (i32, i32) {
        let factor = self.fov / (self.viewer_distance + p.z);
        let x = p.x * factor + self.width as f64 / 2.0;
        let y = -p.y * factor + self.height as f64 / 2.0;
        (x.round() as i32, y.round() as i32)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(256.0, 4.0, 800, 600)
    }
}

/// Casts `p` from `light` onto the shadow plane.
///
/// Returns `None` when the light sits on the shadow plane or `p` coincides
/// with the light, where no shadow point exists.
pub fn shadow_project(p: Point3D, light: Point3D) -> Option<Point3D> {
    let denominator = light.z - SHADOW_PLANE_Z;
    if denominator == 0.0 || p == light {
        return None;
    }
    let t = (p.z - light.z) / denominator;
    Some(Point3D::new(
        light.x + t * (p.x - light.x),
        light.y + t * (p.y - light.y),
        SHADOW_PLANE_Z,
    ))
}

/// Edge function used in rasterization
pub fn edge_function(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (c[0] - a[0]) * (b[1] - a[1]) - (c[1] - a[1]) * (b[0] - a[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    /// Undoes `rotate` by unwinding the steps in reverse order
    fn rotate_inverse(p: Point3D, angles: Angles) -> Point3D {
        rotate_x(rotate_y(rotate_z(p, -angles.z), -angles.y), -angles.x)
    }

    fn assert_close(a: Point3D, b: Point3D) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let p = Point3D::new(0.3, -1.7, 2.5);
        assert_eq!(rotate(p, Angles::default()), p);
    }

    #[test]
    fn test_yaw_direction() {
        let p = rotate(Point3D::new(1.0, 0.0, 0.0), Angles::new(0.0, FRAC_PI_2, 0.0));
        assert_close(p, Point3D::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_pitch_and_roll_direction() {
        let p = rotate(Point3D::new(0.0, 1.0, 0.0), Angles::new(FRAC_PI_2, 0.0, 0.0));
        assert_close(p, Point3D::new(0.0, 0.0, 1.0));
        let p = rotate(Point3D::new(1.0, 0.0, 0.0), Angles::new(0.0, 0.0, FRAC_PI_2));
        assert_close(p, Point3D::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_single_axis_rotation_undone_by_negated_angle() {
        let p = Point3D::new(0.4, 1.1, -0.9);
        for angles in [
            Angles::new(0.7, 0.0, 0.0),
            Angles::new(0.0, -2.3, 0.0),
            Angles::new(0.0, 0.0, 5.0),
        ] {
            assert_close(rotate(rotate(p, angles), -angles), p);
        }
    }

    #[test]
    fn test_rotate_inverse() {
        let camera = Camera::default();
        let p = Point3D::new(-0.6, 0.25, 1.3);
        let angles = Angles::new(0.3, -1.2, 2.9);
        let back = rotate_inverse(rotate(p, angles), angles);
        assert_close(back, p);
        assert_eq!(camera.project(back), camera.project(p));
    }

    #[test]
    fn test_order_matters() {
        let p = Point3D::new(1.0, 0.0, 0.0);
        let angles = Angles::new(FRAC_PI_2, FRAC_PI_2, 0.0);
        // Pitch first leaves (1,0,0) alone; the yaw then sends it to -Z.
        assert_close(rotate(p, angles), Point3D::new(0.0, 0.0, -1.0));
        // Yaw first then pitch would give (0,1,0).
        assert_close(rotate_x(rotate_y(p, angles.y), angles.x), Point3D::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_rotation_preserves_length() {
        let p = Point3D::new(1.0, 2.0, 3.0);
        let r = rotate(p, Angles::new(PI / 3.0, 0.2, -1.0));
        let len = |q: Point3D| (q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
        assert!((len(p) - len(r)).abs() < EPS);
    }

    #[test]
    fn test_project_origin_to_center() {
        let camera = Camera::new(256.0, 4.0, 800, 600);
        assert_eq!(camera.project(Point3D::ORIGIN), (400, 300));
    }

    #[test]
    fn test_project_inverts_y() {
        let camera = Camera::default();
        // factor = 256 / 4 = 64
        assert_eq!(camera.project(Point3D::new(1.0, 1.0, 0.0)), (464, 236));
        // factor = 256 / 5 = 51.2, 400 - 51.2 = 348.8
        assert_eq!(camera.project(Point3D::new(-1.0, -1.0, 1.0)), (349, 351));
    }

    #[test]
    fn test_project_degenerate_depth_does_not_panic() {
        let camera = Camera::default();
        let (x, _) = camera.project(Point3D::new(1.0, 0.0, -4.0));
        assert_eq!(x, i32::MAX);
        let (x, y) = camera.project(Point3D::new(0.0, 0.0, -4.0));
        assert_eq!((x, y), (0, 0));
        // Behind the camera the image flips
        let (x, _) = camera.project(Point3D::new(1.0, 0.0, -6.0));
        assert!(x < 400);
    }

    #[test]
    fn test_shadow_lands_on_plane() {
        let light = Point3D::new(0.5, 0.5, -8.0);
        let s = shadow_project(Point3D::new(1.0, 1.0, 1.0), light).unwrap();
        // t = (1 + 8) / (-8 + 2) = -1.5
        assert_close(s, Point3D::new(-0.25, -0.25, SHADOW_PLANE_Z));
    }

    #[test]
    fn test_shadow_degenerate_cases() {
        let light = Point3D::new(0.0, 3.0, -8.0);
        assert_eq!(shadow_project(light, light), None);
        let on_plane = Point3D::new(0.0, 3.0, SHADOW_PLANE_Z);
        assert_eq!(shadow_project(Point3D::new(1.0, 1.0, 1.0), on_plane), None);
    }

    #[test]
    fn test_edge_function_sign() {
        let a = [0.0, 0.0];
        let b = [10.0, 0.0];
        assert!(edge_function(a, b, [5.0, 5.0]) < 0.0);
        assert!(edge_function(a, b, [5.0, -5.0]) > 0.0);
        assert_eq!(edge_function(a, b, [3.0, 0.0]), 0.0);
    }
}
