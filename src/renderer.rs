//! CPU ray marcher and frame compositor
//!
//! This module casts one ray per character cell, sphere-traces it against the
//! metablob field and composites hits into a depth buffer and a glyph buffer.

use crate::scene::{AnimationState, Scene};
use crate::{
    BACKGROUND_GLYPH, BASE_HEIGHT, BASE_SCALE_X, BASE_SCALE_Y, BASE_WIDTH, BASE_Y_CENTER, K2,
    LIGHT_DIR, LUMINANCE_RAMP, MAX_DISTANCE, MAX_STEPS, THRESHOLD,
};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// A ray in 3D space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// A surface hit found by the ray marcher
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub point: Point3<f32>,
    pub t: f32,
}

/// March a ray until the field crosses the surface threshold.
///
/// The step size `0.1 / (field + 0.1)` shrinks near the blobs and grows where
/// the field is weak. The bound is heuristic, not conservative, so very thin
/// features can be stepped over; `None` after `MAX_STEPS` steps or past
/// `MAX_DISTANCE` is a normal outcome, not an error.
pub fn march(ray: &Ray, scene: &Scene) -> Option<Hit> {
    let mut t = 0.0f32;
    for _ in 0..MAX_STEPS {
        let point = ray.at(t);
        let field = scene.field_at(&point);
        if field >= THRESHOLD {
            return Some(Hit { point, t });
        }
        t += 0.1 / (field + 0.1);
        if t > MAX_DISTANCE {
            break;
        }
    }
    None
}

/// Viewport geometry: character-grid size plus the projection scale factors
/// derived from it once at startup
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
    k1_x: f32,
    k1_y: f32,
    y_center: f32,
}

impl Viewport {
    /// Fit the detected grid to the base 80x22 layout, preserving aspect so
    /// blob apparent size is stable across terminal sizes.
    pub fn new(width: usize, height: usize) -> Self {
        let scale = (width as f32 / BASE_WIDTH).min(height as f32 / BASE_HEIGHT);
        Self {
            width,
            height,
            k1_x: BASE_SCALE_X * scale,
            k1_y: BASE_SCALE_Y * scale,
            y_center: (BASE_Y_CENTER * height as f32 / BASE_HEIGHT) as i32 as f32,
        }
    }

    /// Normalized pinhole-camera ray through a character cell. The eye sits
    /// at `(0, 0, -K2)` looking toward +z.
    pub fn ray_for_cell(&self, x: usize, y: usize) -> Ray {
        let rx = (x as f32 - self.width as f32 / 2.0) / self.k1_x;
        let ry = (self.y_center - y as f32) / self.k1_y;
        let direction = Vector3::new(rx, ry, 1.0).normalize();
        Ray::new(Point3::new(0.0, 0.0, -K2), direction)
    }

    pub fn k1(&self) -> (f32, f32) {
        (self.k1_x, self.k1_y)
    }

    pub fn y_center(&self) -> f32 {
        self.y_center
    }
}

/// Map a luminance value onto the glyph ramp, clamped at both ends
pub fn glyph_for_luminance(luminance: f32) -> char {
    let ramp = LUMINANCE_RAMP.as_bytes();
    let index = (luminance * 8.0 + 4.0).round() as i32;
    ramp[index.clamp(0, ramp.len() as i32 - 1) as usize] as char
}

/// The frame compositor: owns the depth and glyph buffers and fills them
/// from a scene, one ray per cell
pub struct Renderer {
    viewport: Viewport,
    depth: Vec<f32>,
    glyphs: Vec<char>,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            depth: vec![0.0; width * height],
            glyphs: vec![BACKGROUND_GLYPH; width * height],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport = Viewport::new(width, height);
        self.depth = vec![0.0; width * height];
        self.glyphs = vec![BACKGROUND_GLYPH; width * height];
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Depth buffer, row-major; 0.0 means no hit, larger means nearer
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Glyph buffer, row-major
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Composite one frame of the given scene into the buffers.
    ///
    /// Both buffers are reset first; nothing carries over between frames.
    /// Rows render in parallel, each worker owning a disjoint row slice of
    /// both buffers, so output is identical to a sequential pass.
    pub fn render(&mut self, scene: &Scene) {
        self.depth.fill(0.0);
        self.glyphs.fill(BACKGROUND_GLYPH);

        let viewport = &self.viewport;
        let width = viewport.width;
        let light = Vector3::from(LIGHT_DIR);

        self.depth
            .par_chunks_mut(width)
            .zip(self.glyphs.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (depth_row, glyph_row))| {
                for x in 0..width {
                    let ray = viewport.ray_for_cell(x, y);
                    let Some(hit) = march(&ray, scene) else {
                        continue;
                    };

                    let depth = 1.0 / (hit.t + 1.0);
                    if depth > depth_row[x] {
                        depth_row[x] = depth;
                        let normal = scene.normal_at(&hit.point);
                        let luminance = normal.dot(&light);
                        glyph_row[x] = glyph_for_luminance(luminance);
                    }
                }
            });
    }

    /// Render directly from animation angles
    pub fn render_at(&mut self, state: &AnimationState) {
        let scene = Scene::at(state);
        self.render(&scene);
    }

    /// Convert the glyph buffer to a string, one line per row
    pub fn to_ascii(&self) -> String {
        let width = self.viewport.width;
        let height = self.viewport.height;
        let mut result = String::with_capacity(width * height + height);

        for y in 0..height {
            for x in 0..width {
                result.push(self.glyphs[y * width + x]);
            }
            result.push('\n');
        }

        result
    }
}

/// Unbounded lazy sequence of rendered frames.
///
/// Owns a renderer and an animation state; each `next` renders the current
/// state and then advances the angles. Callers pull a bounded number of
/// frames with `take` instead of looping forever.
pub struct Frames {
    renderer: Renderer,
    state: AnimationState,
}

impl Frames {
    pub fn new(renderer: Renderer) -> Self {
        Self::from_state(renderer, AnimationState::new())
    }

    pub fn from_state(renderer: Renderer, state: AnimationState) -> Self {
        Self { renderer, state }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

impl Iterator for Frames {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.renderer.render_at(&self.state);
        self.state.advance();
        Some(self.renderer.to_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Metablob;

    fn scene_with(blobs: Vec<Metablob>) -> Scene {
        Scene { blobs }
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0));
        assert!((ray.at(5.0).x - 5.0).abs() < 0.001);
    }

    #[test]
    fn march_misses_blob_beyond_max_distance() {
        let scene = scene_with(vec![Metablob::new(0.0, 0.0, 30.0)]);
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
        assert!(march(&ray, &scene).is_none());
    }

    #[test]
    fn march_hits_blob_in_range() {
        let scene = scene_with(vec![Metablob::new(0.0, 0.0, 5.0)]);
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
        let hit = march(&ray, &scene).expect("blob at z=5 should be hit");
        // The surface sits one influence radius out from the center
        assert!(hit.t > 2.0 && hit.t < 5.0);
        assert!(scene.field_at(&hit.point) >= THRESHOLD);
    }

    #[test]
    fn march_away_from_blob_misses() {
        let scene = scene_with(vec![Metablob::new(0.0, 0.0, 5.0)]);
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
        assert!(march(&ray, &scene).is_none());
    }

    #[test]
    fn viewport_base_size_gives_unit_scale() {
        let viewport = Viewport::new(80, 22);
        let (k1_x, k1_y) = viewport.k1();
        assert!((k1_x - 90.0).abs() < 1e-6);
        assert!((k1_y - 45.0).abs() < 1e-6);
        assert!((viewport.y_center() - 12.0).abs() < 1e-6);
    }

    #[test]
    fn viewport_scale_tracks_limiting_dimension() {
        let viewport = Viewport::new(160, 44);
        let (k1_x, k1_y) = viewport.k1();
        assert!((k1_x - 180.0).abs() < 1e-4);
        assert!((k1_y - 90.0).abs() < 1e-4);

        // Wide terminal: height is the limiting dimension
        let viewport = Viewport::new(200, 22);
        let (k1_x, _) = viewport.k1();
        assert!((k1_x - 90.0).abs() < 1e-4);
    }

    #[test]
    fn center_cell_ray_points_straight_ahead() {
        let viewport = Viewport::new(80, 22);
        let ray = viewport.ray_for_cell(40, 12);
        assert!((ray.direction - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!((ray.origin.z + K2).abs() < 1e-6);
    }

    #[test]
    fn cell_rays_are_normalized() {
        let viewport = Viewport::new(80, 22);
        for &(x, y) in &[(0, 0), (79, 21), (20, 5), (60, 16)] {
            let ray = viewport.ray_for_cell(x, y);
            assert!((ray.direction.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn luminance_clamps_to_ramp_ends() {
        assert_eq!(glyph_for_luminance(-0.5), '.');
        assert_eq!(glyph_for_luminance(-3.0), '.');
        assert_eq!(glyph_for_luminance(0.875), '#');
        assert_eq!(glyph_for_luminance(5.0), '#');
    }

    #[test]
    fn luminance_zero_maps_to_ramp_middle() {
        assert_eq!(glyph_for_luminance(0.0), '=');
    }

    #[test]
    fn render_is_idempotent() {
        let scene = Scene::at(&AnimationState::new());
        let mut renderer = Renderer::new(40, 12);

        renderer.render(&scene);
        let depth = renderer.depth().to_vec();
        let glyphs = renderer.glyphs().to_vec();

        renderer.render(&scene);
        assert_eq!(renderer.depth(), &depth[..]);
        assert_eq!(renderer.glyphs(), &glyphs[..]);
    }

    #[test]
    fn nearer_blob_wins_regardless_of_order() {
        let near = Metablob::new(0.0, 0.0, 2.0);
        let far = Metablob::new(0.0, 0.0, 6.0);

        let mut forward = Renderer::new(21, 21);
        forward.render(&scene_with(vec![near, far]));
        let mut reversed = Renderer::new(21, 21);
        reversed.render(&scene_with(vec![far, near]));

        assert_eq!(forward.glyphs(), reversed.glyphs());
        assert_eq!(forward.depth(), reversed.depth());

        // The recorded depth at the center cell corresponds to the nearer
        // surface: the eye is at z=-8, so the near blob surface is roughly
        // t=8.8 away (score ~0.10) versus t=12.8 for the far one (~0.07).
        let center = 10 * 21 + 10;
        let depth = forward.depth()[center];
        assert!(depth > 0.09, "depth {depth} should reflect the nearer blob");
    }

    #[test]
    fn missed_cells_stay_at_background() {
        // Empty scene: every cell keeps the reset state
        let mut renderer = Renderer::new(10, 4);
        renderer.render(&scene_with(vec![]));
        assert!(renderer.glyphs().iter().all(|&g| g == BACKGROUND_GLYPH));
        assert!(renderer.depth().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn to_ascii_has_one_line_per_row() {
        let mut renderer = Renderer::new(32, 9);
        renderer.render_at(&AnimationState::new());
        let ascii = renderer.to_ascii();
        assert_eq!(ascii.lines().count(), 9);
        assert!(ascii.lines().all(|line| line.chars().count() == 32));
    }

    #[test]
    fn frames_iterator_matches_direct_render() {
        let mut renderer = Renderer::new(40, 12);
        renderer.render_at(&AnimationState::new());
        let direct = renderer.to_ascii();

        let mut frames = Frames::new(Renderer::new(40, 12));
        assert_eq!(frames.next().unwrap(), direct);
    }

    #[test]
    fn frames_take_is_bounded_and_deterministic() {
        let first: Vec<String> = Frames::new(Renderer::new(20, 8)).take(3).collect();
        let second: Vec<String> = Frames::new(Renderer::new(20, 8)).take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }
}
