//! Scene definitions: metablob placement and the implicit field they define

use nalgebra::{Point3, Vector3};

use crate::{
    EPSILON, FIELD_EPSILON_SQ, METABLOB_RADIUS, NORMAL_EPSILON, ROTATION_SPEED_A, ROTATION_SPEED_B,
};

/// A single metablob: a point-centered inverse-square influence source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metablob {
    pub center: Point3<f32>,
}

impl Metablob {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            center: Point3::new(x, y, z),
        }
    }

    /// Rotate the center in the y-z plane, then in the x-y plane
    fn tumble(&mut self, pitch: f32, spin: f32) {
        let (y, z) = rotate(self.center.y, self.center.z, pitch);
        self.center.y = y;
        self.center.z = z;
        let (x, y) = rotate(self.center.x, self.center.y, spin);
        self.center.x = x;
        self.center.y = y;
    }
}

/// Planar rotation of a coordinate pair
fn rotate(a: f32, b: f32, angle: f32) -> (f32, f32) {
    let (sin_a, cos_a) = angle.sin_cos();
    (a * cos_a - b * sin_a, a * sin_a + b * cos_a)
}

/// The two global animation angles, advanced once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub angle_a: f32,
    pub angle_b: f32,
}

impl AnimationState {
    pub fn new() -> Self {
        Self {
            angle_a: 0.0,
            angle_b: 0.0,
        }
    }

    /// Advance both angles by their fixed per-frame increments
    pub fn advance(&mut self) {
        self.angle_a += ROTATION_SPEED_A;
        self.angle_b += ROTATION_SPEED_B;
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

/// The complete scene: the current positions of all metablobs
#[derive(Debug, Clone)]
pub struct Scene {
    pub blobs: Vec<Metablob>,
}

impl Scene {
    /// Place all metablobs for the given animation angles.
    ///
    /// Each blob orbits in the x-y plane at its own angular velocity and
    /// phase, with a sinusoidal z oscillation, then tumbles through two
    /// planar rotations with per-blob multipliers. The constants are part of
    /// the output contract; frames are a pure function of the two angles.
    pub fn at(state: &AnimationState) -> Self {
        let a = state.angle_a;
        let b = state.angle_b;

        // blob 0: inner orbit, fast
        let orbit = a * 2.3;
        let mut blob0 = Metablob::new(1.5 * orbit.cos(), 1.5 * orbit.sin(), 0.8 * (b * 3.1).sin());

        // blob 1: middle orbit, medium speed, phase-shifted
        let orbit = a * 1.7 + 1.5;
        let mut blob1 = Metablob::new(2.2 * orbit.cos(), 2.2 * orbit.sin(), 1.0 * (b * 2.3).cos());

        // blob 2: outer orbit, slower, counter-rotating z
        let orbit = a * 1.1 + 3.7;
        let mut blob2 = Metablob::new(2.6 * orbit.cos(), 2.6 * orbit.sin(), 0.6 * (b * -1.8).sin());

        blob0.tumble(a * 0.9, b * 0.6);
        blob1.tumble(a * 0.5 + 1.2, b * 0.8);
        blob2.tumble(a * 0.3 + 2.5, b * 0.4);

        Self {
            blobs: vec![blob0, blob1, blob2],
        }
    }

    /// Field strength at a point: sum of `radius^2 / dist^2` over all blobs.
    ///
    /// Contributions inside the squared-distance guard are dropped, which
    /// keeps the sum finite arbitrarily close to a blob center.
    pub fn field_at(&self, point: &Point3<f32>) -> f32 {
        let mut sum = 0.0;
        for blob in &self.blobs {
            let dist_sq = (point - blob.center).norm_squared();
            if dist_sq > FIELD_EPSILON_SQ {
                sum += METABLOB_RADIUS * METABLOB_RADIUS / dist_sq;
            }
        }
        sum
    }

    /// Estimate the surface normal at a point from the field gradient.
    ///
    /// Forward differences, all three axes diffed against the same baseline
    /// sample. Left unnormalized in the degenerate near-zero-gradient case.
    pub fn normal_at(&self, point: &Point3<f32>) -> Vector3<f32> {
        let fx = self.field_at(point);
        let grad = Vector3::new(
            self.field_at(&Point3::new(point.x + EPSILON, point.y, point.z)) - fx,
            self.field_at(&Point3::new(point.x, point.y + EPSILON, point.z)) - fx,
            self.field_at(&Point3::new(point.x, point.y, point.z + EPSILON)) - fx,
        );
        grad.try_normalize(NORMAL_EPSILON).unwrap_or(grad)
    }
}
