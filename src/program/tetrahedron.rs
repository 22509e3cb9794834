//! Spinning tetrahedra.
//!
//! [`Tetrahedron`] rotates a regular tetrahedron about all three axes, projects it
//! with perspective and rasterizes edges pixel by pixel, shading the face closest to
//! the viewer. Every edge keeps its hue no matter how the vertices are sorted, since
//! the hue is keyed by the pair of vertex ids. [`StretchyTetrahedron`] wobbles its
//! vertices and draws an orthographic wireframe with trails.

use super::Program;
use crate::blur::ConvolutionFilter;
use crate::color::{Color, hsv_to_565, hue_from_fraction};
use crate::grid::PixelGrid;

const VERTICES: usize = 4;
const EDGES: usize = VERTICES * (VERTICES - 1) / 2;

/// Vertex `id` of a unit tetrahedron centered on the origin.
fn unit_vertex(id: usize) -> Point3 {
    const CORNERS: [[f32; 3]; VERTICES] = [[1.0, 1.0, 1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0]];
    let [x, y, z] = CORNERS[id];
    let norm = 3f32.sqrt();
    Point3::new(id, x / norm, y / norm, z / norm)
}

/// Index of the edge between two vertices, the same for `(a, b)` and `(b, a)`.
pub fn edge_index(a: usize, b: usize) -> usize {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    lo * (2 * VERTICES - lo - 1) / 2 + (hi - lo - 1)
}

/// Hue of the edge between two vertices, spreading the six edges around the wheel.
pub fn edge_hue(a: usize, b: usize) -> u16 {
    (edge_index(a, b) * 65536 / EDGES) as u16
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(id: usize, x: f32, y: f32, z: f32) -> Self {
        Self { id, x, y, z }
    }

    pub fn rotate_x(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            y: self.y * cos - self.z * sin,
            z: self.y * sin + self.z * cos,
            ..self
        }
    }

    pub fn rotate_y(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos + self.z * sin,
            z: -self.x * sin + self.z * cos,
            ..self
        }
    }

    pub fn rotate_z(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            ..self
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
            ..self
        }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A vertex after projection onto the panel.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Projected {
    id: usize,
    x: f32,
    y: f32,
    depth: f32,
}

fn sign(p: (f32, f32), a: &Projected, b: &Projected) -> f32 {
    (p.0 - b.x) * (a.y - b.y) - (a.x - b.x) * (p.1 - b.y)
}

fn in_triangle(p: (f32, f32), a: &Projected, b: &Projected, c: &Projected) -> bool {
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Whether `p` lies on the segment `a`-`b`, within `epsilon` of total path length.
fn on_segment(p: (f32, f32), a: &Projected, b: &Projected, epsilon: f32) -> bool {
    let dist = |x0: f32, y0: f32, x1: f32, y1: f32| ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
    let via = dist(a.x, a.y, p.0, p.1) + dist(p.0, p.1, b.x, b.y);
    (via - dist(a.x, a.y, b.x, b.y)).abs() < epsilon
}

// ── Perspective tetrahedron ─────────────────────────────────────────

const CAMERA_DISTANCE: f32 = 20.0;
const TETRAHEDRON_SCALE: f32 = 5.4;
const TETRAHEDRON_BLUR: f32 = 0.45;
const EDGE_EPSILON: f32 = 0.15;
const FACE_VALUE: u8 = 48;

pub struct Tetrahedron {
    speed: f32,
    blur: ConvolutionFilter,
}

impl Tetrahedron {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            blur: ConvolutionFilter::new(TETRAHEDRON_BLUR),
        }
    }

    /// Vertices rotated for time `t`, projected onto a `width × height` panel and
    /// sorted farthest first.
    fn project(t: f32, width: usize, height: usize) -> [Projected; VERTICES] {
        let cx = (width as f32 - 1.0) / 2.0;
        let cy = (height as f32 - 1.0) / 2.0;
        let mut points = [0, 1, 2, 3].map(|id| {
            let p = unit_vertex(id)
                .rotate_x(t * 0.9)
                .rotate_y(t * 0.7)
                .rotate_z(t * 0.5)
                .scaled(TETRAHEDRON_SCALE);
            let perspective = CAMERA_DISTANCE / (CAMERA_DISTANCE + p.z);
            Projected {
                id,
                x: cx + p.x * perspective,
                y: cy + p.y * perspective,
                depth: p.z,
            }
        });
        points.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        points
    }
}

impl Program for Tetrahedron {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        let points = Self::project(time * self.speed, grid.width(), grid.height());
        let [far, a, b, c] = points;
        // The front face is the one opposite the farthest vertex.
        let face_hue = hue_from_fraction(far.id as f32 / VERTICES as f32);
        let face = Color::from_565(hsv_to_565(face_hue, 255, FACE_VALUE));

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let p = (x as f32, y as f32);
                let mut color = if in_triangle(p, &a, &b, &c) { face } else { Color::BLACK };

                // Back to front, so nearer edges win.
                for (i, v1) in points.iter().enumerate() {
                    for v2 in &points[i + 1..] {
                        if on_segment(p, v1, v2, EDGE_EPSILON) {
                            color = Color::from_565(hsv_to_565(edge_hue(v1.id, v2.id), 255, 255));
                        }
                    }
                }
                grid.set(x as i32, y as i32, color);
            }
        }

        self.blur.apply(grid);
    }
}

// ── Stretchy wireframe ──────────────────────────────────────────────

const STRETCHY_FADE: f32 = 0.6;
const STRETCHY_BLUR: f32 = 0.35;
const STRETCHY_SCALE: f32 = 4.5;
const STRETCH_AMOUNT: f32 = 0.3;

pub struct StretchyTetrahedron {
    speed: f32,
    blur: ConvolutionFilter,
}

impl StretchyTetrahedron {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            blur: ConvolutionFilter::new(STRETCHY_BLUR),
        }
    }
}

impl Program for StretchyTetrahedron {
    fn advance(&mut self, grid: &mut PixelGrid, time: f32) {
        grid.fade_to_black(STRETCHY_FADE);

        let t = time * self.speed;
        let cx = (grid.width() as f32 - 1.0) / 2.0;
        let cy = (grid.height() as f32 - 1.0) / 2.0;
        let points = [0, 1, 2, 3].map(|id| {
            let stretch = 1.0 + STRETCH_AMOUNT * (t * 2.0 + id as f32 * 1.7).sin();
            let p = unit_vertex(id)
                .scaled(stretch * STRETCHY_SCALE)
                .rotate_y(t * 0.8)
                .rotate_x(0.4);
            ((cx + p.x).round() as i32, (cy + p.y).round() as i32)
        });

        let drift = t * 0.05;
        for i in 0..VERTICES {
            for j in i + 1..VERTICES {
                let hue = edge_hue(i, j) as f32 / 65536.0 + drift;
                let color = Color::from_565(hsv_to_565(hue_from_fraction(hue), 255, 255));
                let ((x0, y0), (x1, y1)) = (points[i], points[j]);
                grid.draw_line(x0, y0, x1, y1, color);
            }
        }

        self.blur.apply(grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn edge_indices_are_symmetric_and_distinct() {
        let mut seen = HashSet::new();
        for a in 0..VERTICES {
            for b in a + 1..VERTICES {
                assert_eq!(edge_index(a, b), edge_index(b, a));
                assert_eq!(edge_hue(a, b), edge_hue(b, a));
                assert!(edge_index(a, b) < EDGES);
                seen.insert(edge_hue(a, b));
            }
        }
        assert_eq!(seen.len(), EDGES);
    }

    #[test]
    fn rotation_preserves_length() {
        for id in 0..VERTICES {
            let p = unit_vertex(id);
            assert!((p.length() - 1.0).abs() < 1e-5);
            let r = p.rotate_x(0.7).rotate_y(-1.3).rotate_z(2.9);
            assert!((r.length() - 1.0).abs() < 1e-5);
            assert_eq!(r.id, id);
        }
    }

    #[test]
    fn quarter_turn_about_z() {
        let p = Point3::new(0, 1.0, 0.0, 0.0).rotate_z(std::f32::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn projection_is_sorted_back_to_front() {
        for step in 0..40 {
            let points = Tetrahedron::project(step as f32 * 0.31, 16, 16);
            assert!(points.windows(2).all(|w| w[0].depth >= w[1].depth));
            let ids: HashSet<usize> = points.iter().map(|p| p.id).collect();
            assert_eq!(ids.len(), VERTICES);
            for p in &points {
                assert!((0.0..16.0).contains(&p.x) && (0.0..16.0).contains(&p.y));
            }
        }
    }

    #[test]
    fn triangle_and_segment_tests() {
        let v = |x, y| Projected { id: 0, x, y, depth: 0.0 };
        let (a, b, c) = (v(0.0, 0.0), v(10.0, 0.0), v(0.0, 10.0));
        assert!(in_triangle((2.0, 2.0), &a, &b, &c));
        assert!(!in_triangle((8.0, 8.0), &a, &b, &c));
        assert!(on_segment((5.0, 0.0), &a, &b, EDGE_EPSILON));
        assert!(!on_segment((5.0, 1.0), &a, &b, EDGE_EPSILON));
    }

    #[test]
    fn both_tetrahedra_draw() {
        let mut grid = PixelGrid::new(16, 16);
        Tetrahedron::new(1.0).advance(&mut grid, 1.0);
        assert!(grid.wire_order().iter().any(|&c| c != Color::BLACK));

        let mut grid = PixelGrid::new(16, 16);
        StretchyTetrahedron::new(1.0).advance(&mut grid, 1.0);
        assert!(grid.wire_order().iter().any(|&c| c != Color::BLACK));
    }
}
