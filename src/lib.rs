//! ASCII Metablobs
//!
//! This library renders an animated implicit surface, three metablob influence
//! fields orbiting and merging, to a character terminal using ray marching,
//! per-cell depth testing and a discrete luminance ramp.

pub mod renderer;
pub mod scene;
pub mod terminal;

pub use renderer::{Frames, Renderer, Viewport};
pub use scene::{AnimationState, Metablob, Scene};
pub use terminal::TerminalDisplay;

/// Number of metablobs in the scene
pub const NUM_BLOBS: usize = 3;

/// Influence radius of each metablob
pub const METABLOB_RADIUS: f32 = 1.2;

/// Field level that defines the implicit surface
pub const THRESHOLD: f32 = 1.0;

/// Distance from the eye to the projection plane
pub const K2: f32 = 8.0;

/// Projection scale constants at the base viewport size
pub const BASE_SCALE_X: f32 = 90.0;
pub const BASE_SCALE_Y: f32 = 45.0;

/// Viewport size the projection constants were tuned for
pub const BASE_WIDTH: f32 = 80.0;
pub const BASE_HEIGHT: f32 = 22.0;

/// Vertical ray center at the base viewport height
pub const BASE_Y_CENTER: f32 = 12.0;

/// Per-frame angle increments (radians)
pub const ROTATION_SPEED_A: f32 = 0.0216;
pub const ROTATION_SPEED_B: f32 = 0.03312;

/// Ray marching bounds
pub const MAX_STEPS: u32 = 64;
pub const MIN_DISTANCE: f32 = 0.01;
pub const MAX_DISTANCE: f32 = 20.0;

/// Finite-difference offset for normal estimation
pub const EPSILON: f32 = 0.001;

/// Squared-distance guard on the field denominator
pub const FIELD_EPSILON_SQ: f32 = 1.0e-4;

/// Minimum pre-normalization magnitude of an estimated normal
pub const NORMAL_EPSILON: f32 = 1.0e-4;

/// Light direction for shading; deliberately not normalized
pub const LIGHT_DIR: [f32; 3] = [-0.3, -0.7, 0.6];

/// Luminance characters from darkest to brightest
pub const LUMINANCE_RAMP: &str = ".:;!=Xs*$M@#";

/// What glyph cells are reset to between frames
pub const BACKGROUND_GLYPH: char = ' ';
