use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

pub const EPSILON: f32 = 1.0e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    pub const SIDE: Vec3 = Vec3::new(-1.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    pub fn is_zero(self) -> bool {
        self.length_squared() <= EPSILON * EPSILON
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Unit vector in the same direction, or zero when the input is too short
    /// to carry a direction.
    pub fn normalize(self) -> Vec3 {
        self.normalize_or(Vec3::ZERO)
    }

    pub fn normalize_or(self, fallback: Vec3) -> Vec3 {
        let len_sq = self.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return fallback;
        }
        self * (1.0 / len_sq.sqrt())
    }

    pub fn truncate_length(self, max_length: f32) -> Vec3 {
        if max_length <= 0.0 {
            return Vec3::ZERO;
        }
        let len_sq = self.length_squared();
        if len_sq <= max_length * max_length {
            return self;
        }
        self * (max_length / len_sq.sqrt())
    }

    /// Component of this vector parallel to `unit_basis`.
    pub fn parallel_component(self, unit_basis: Vec3) -> Vec3 {
        unit_basis * self.dot(unit_basis)
    }

    /// Component of this vector perpendicular to `unit_basis`.
    pub fn perpendicular_component(self, unit_basis: Vec3) -> Vec3 {
        self - self.parallel_component(unit_basis)
    }

    pub fn set_y_to_zero(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }

    pub fn interpolate(alpha: f32, from: Vec3, to: Vec3) -> Vec3 {
        from + (to - from) * alpha
    }

    /// Clamps the angle between `self` and `unit_basis` to a cone whose
    /// half-angle cosine is `cosine_of_cone_angle`, keeping the length.
    pub fn limit_max_deviation_angle(self, cosine_of_cone_angle: f32, unit_basis: Vec3) -> Vec3 {
        let source_length = self.length();
        if source_length <= EPSILON {
            return self;
        }

        let direction = self / source_length;
        if direction.dot(unit_basis) >= cosine_of_cone_angle {
            return self;
        }

        let unit_perp = self.perpendicular_component(unit_basis).normalize();
        let cosine = cosine_of_cone_angle.clamp(-1.0, 1.0);
        let perp_distance = (1.0 - cosine * cosine).max(0.0).sqrt();
        (unit_basis * cosine + unit_perp * perp_distance) * source_length
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;

    fn div(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
impl approx::AbsDiffEq for Vec3 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        f32::abs_diff_eq(&self.x, &other.x, epsilon)
            && f32::abs_diff_eq(&self.y, &other.y, epsilon)
            && f32::abs_diff_eq(&self.z, &other.z, epsilon)
    }
}

pub fn interpolate(alpha: f32, from: f32, to: f32) -> f32 {
    from + (to - from) * alpha
}

/// Exponential smoothing of `accumulator` towards `new_value`.
pub fn blend_into_accumulator(smooth_rate: f32, new_value: Vec3, accumulator: Vec3) -> Vec3 {
    Vec3::interpolate(smooth_rate.clamp(0.0, 1.0), accumulator, new_value)
}

pub fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}
