// animation/mod.rs - Tick-driven animation system for maze construction

pub mod scheduler;
pub mod tween;
pub mod camera_animator;
pub mod lighting_animator;
pub mod fade;
pub mod orchestrator;

pub use scheduler::*;
pub use tween::*;
pub use camera_animator::*;
pub use lighting_animator::*;
pub use fade::*;
pub use orchestrator::*;

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE MATH TYPES
// ============================================================================

/// 3D vector in world space (y up)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[inline]
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        // t is clamped to [0, 1]
        let t = t.clamp(0.0, 1.0);
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    #[inline]
    pub fn slerp(self, other: Vec3, t: f32) -> Vec3 {
        // Spherical interpolation between directions
        let dot = self.dot(other).clamp(-1.0, 1.0);
        let theta = dot.acos();
        let sin_theta = theta.sin();

        if sin_theta.abs() < 0.001 {
            return self.lerp(other, t);
        }

        let a = ((1.0 - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;

        self * a + other * b
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn normalize(self) -> Vec3 {
        let len_sq = self.length_squared();
        if len_sq > 1e-20 {
            let inv_len = 1.0 / len_sq.sqrt();
            Vec3::new(self.x * inv_len, self.y * inv_len, self.z * inv_len)
        } else {
            Vec3::zero()
        }
    }

    #[inline]
    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn max_element(self) -> f32 {
        self.x.max(self.y).max(self.z)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Vec3::new(arr[0], arr[1], arr[2])
    }
}

/// Axis-aligned box used for camera framing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    #[inline]
    pub const fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    #[inline]
    pub fn extents(&self) -> Vec3 {
        self.size * 0.5
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == Vec3::zero()
    }
}

// ============================================================================
// COLOR TYPE
// ============================================================================

/// RGBA color
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    // Warm yellow used for path lights
    pub const YELLOW: Color = Color::rgb(1.0, 0.92, 0.016);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Animation system errors
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("Tween has no target to read from or write to")]
    MissingTarget,

    #[error("Invalid animation parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, AnimationError>;
