use crate::math::edge_function;

/// An 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// Composites `self` over an opaque `dst`
    pub fn over(self, dst: Rgba) -> Rgba {
        let a = self.a as u32;
        let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
        Rgba::rgb(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b))
    }

    /// Sum of absolute channel differences, ignoring alpha
    pub fn distance(self, other: Rgba) -> u32 {
        self.r.abs_diff(other.r) as u32
            + self.g.abs_diff(other.g) as u32
            + self.b.abs_diff(other.b) as u32
    }
}

/// Software drawing surface backed by an RGBA pixel buffer
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    pixel_data: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        let mut frame = Frame {
            width,
            height,
            pixel_data: vec![0u8; width * height * 4],
        };
        frame.clear(Rgba::BLACK);
        frame
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: Rgba) {
        for pixel in self.pixel_data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * 4;
        let p = &self.pixel_data[offset..offset + 4];
        Some(Rgba::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Blends `color` into one pixel; writes outside the frame are dropped
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = (y as usize * self.width + x as usize) * 4;
        let dst = Rgba::rgb(
            self.pixel_data[offset],
            self.pixel_data[offset + 1],
            self.pixel_data[offset + 2],
        );
        let out = if color.a == 255 { color } else { color.over(dst) };
        self.pixel_data[offset] = out.r;
        self.pixel_data[offset + 1] = out.g;
        self.pixel_data[offset + 2] = out.b;
        self.pixel_data[offset + 3] = 255;
    }

    /// Draws a line of the given stroke width using Bresenham's algorithm.
    ///
    /// The segment is clipped to the frame first, so endpoints may lie
    /// arbitrarily far outside it.
    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgba, width: u32) {
        let width = width.max(1) as i64;
        let before = (width - 1) / 2;
        let after = width - 1 - before;
        let bounds = (
            -(after as f64) - 1.0,
            -(after as f64) - 1.0,
            (self.width as i64 + before) as f64 + 1.0,
            (self.height as i64 + before) as f64 + 1.0,
        );
        let Some(((x0, y0), (x1, y1))) = clip_segment(
            (from.0 as f64, from.1 as f64),
            (to.0 as f64, to.1 as f64),
            bounds,
        ) else {
            return;
        };

        let (mut x0, mut y0, x1, y1) = (
            x0.round() as i64,
            y0.round() as i64,
            x1.round() as i64,
            y1.round() as i64,
        );
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy; // error value e_xy

        loop {
            for oy in -before..=after {
                for ox in -before..=after {
                    self.blend_pixel(x0 + ox, y0 + oy, color);
                }
            }

            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Fills a convex polygon, blending each covered pixel exactly once.
    /// Either winding order is accepted.
    pub fn fill_polygon(&mut self, points: &[(i32, i32)], color: Rgba) {
        if points.len() < 3 || self.width == 0 || self.height == 0 {
            return;
        }

        // Compute bounding box of the polygon, clamped to the frame
        let min_x = points.iter().map(|p| p.0 as i64).min().unwrap_or(0).max(0);
        let max_x = points
            .iter()
            .map(|p| p.0 as i64)
            .max()
            .unwrap_or(0)
            .min(self.width as i64 - 1);
        let min_y = points.iter().map(|p| p.1 as i64).min().unwrap_or(0).max(0);
        let max_y = points
            .iter()
            .map(|p| p.1 as i64)
            .max()
            .unwrap_or(0)
            .min(self.height as i64 - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let vertices: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x as f64, y as f64]).collect();

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = [x as f64 + 0.5, y as f64 + 0.5];
                let mut positive = false;
                let mut negative = false;
                for (i, &a) in vertices.iter().enumerate() {
                    let b = vertices[(i + 1) % vertices.len()];
                    let w = edge_function(a, b, p);
                    positive |= w > 0.0;
                    negative |= w < 0.0;
                }
                if !(positive && negative) && (positive || negative) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }
}

/// Liang-Barsky clipping of a segment to `(min_x, min_y, max_x, max_y)`
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, from.0 - min_x),
        (dx, max_x - from.0),
        (-dy, from.1 - min_y),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(frame: &Frame, color: Rgba) -> usize {
        let mut n = 0;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.pixel(x, y) == Some(color) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_clear() {
        let mut frame = Frame::new(4, 3);
        frame.clear(Rgba::rgb(1, 2, 3));
        assert_eq!(count(&frame, Rgba::rgb(1, 2, 3)), 12);
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn test_horizontal_line() {
        let mut frame = Frame::new(10, 10);
        frame.draw_line((1, 5), (8, 5), Rgba::WHITE, 1);
        assert_eq!(count(&frame, Rgba::WHITE), 8);
        assert_eq!(frame.pixel(1, 5), Some(Rgba::WHITE));
        assert_eq!(frame.pixel(8, 5), Some(Rgba::WHITE));
        assert_eq!(frame.pixel(0, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn test_stroke_width() {
        let mut frame = Frame::new(10, 10);
        frame.draw_line((2, 5), (7, 5), Rgba::WHITE, 2);
        // A 2x2 brush stamped at x = 2..=7 covers columns 2..=8 on rows 5 and 6
        assert_eq!(count(&frame, Rgba::WHITE), 14);
        assert_eq!(frame.pixel(4, 5), Some(Rgba::WHITE));
        assert_eq!(frame.pixel(4, 6), Some(Rgba::WHITE));
    }

    #[test]
    fn test_line_far_outside_is_clipped() {
        let mut frame = Frame::new(20, 20);
        frame.draw_line((i32::MIN, 10), (i32::MAX, 10), Rgba::WHITE, 1);
        assert_eq!(count(&frame, Rgba::WHITE), 20);

        let mut frame = Frame::new(20, 20);
        frame.draw_line((i32::MAX, i32::MAX), (i32::MAX, 0), Rgba::WHITE, 3);
        assert_eq!(count(&frame, Rgba::WHITE), 0);
    }

    #[test]
    fn test_fill_square_either_winding() {
        let square = [(2, 2), (6, 2), (6, 6), (2, 6)];
        let mut cw = Frame::new(10, 10);
        cw.fill_polygon(&square, Rgba::WHITE);
        let mut reversed = square;
        reversed.reverse();
        let mut ccw = Frame::new(10, 10);
        ccw.fill_polygon(&reversed, Rgba::WHITE);

        assert_eq!(count(&cw, Rgba::WHITE), 16);
        assert_eq!(count(&ccw, Rgba::WHITE), 16);
        assert_eq!(cw.pixel(2, 2), Some(Rgba::WHITE));
        assert_eq!(cw.pixel(6, 6), Some(Rgba::BLACK));
    }

    #[test]
    fn test_translucent_fill_blends_once() {
        let mut frame = Frame::new(10, 10);
        frame.fill_polygon(&[(0, 0), (10, 0), (10, 10), (0, 10)], Rgba::rgba(255, 255, 255, 128));
        // Uniform coverage: no seam where a diagonal would split the quad
        assert_eq!(count(&frame, Rgba::rgb(128, 128, 128)), 100);
    }

    #[test]
    fn test_degenerate_polygon_draws_nothing() {
        let mut frame = Frame::new(10, 10);
        frame.fill_polygon(&[(1, 1), (5, 5), (8, 8)], Rgba::WHITE);
        frame.fill_polygon(&[(1, 1), (5, 5)], Rgba::WHITE);
        assert_eq!(count(&frame, Rgba::WHITE), 0);
    }

    #[test]
    fn test_over() {
        let c = Rgba::rgba(200, 0, 100, 0).over(Rgba::rgb(10, 20, 30));
        assert_eq!(c, Rgba::rgb(10, 20, 30));
        let c = Rgba::rgba(200, 0, 100, 255).over(Rgba::rgb(10, 20, 30));
        assert_eq!(c, Rgba::rgb(200, 0, 100));
    }
}
