use crate::math::{blend_into_accumulator, interpolate, Vec3, EPSILON};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

// Below this fraction of max speed the steering force is bent towards forward.
const LOW_SPEED_FRACTION: f32 = 0.2;
const PARALLEL_UP_THRESHOLD: f32 = 0.97;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleLimits {
    pub max_speed: f32,
    pub max_force: f32,
    pub radius: f32,
    pub mass: f32,
}

impl Default for VehicleLimits {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            max_force: 8.0,
            radius: 0.5,
            mass: 1.0,
        }
    }
}

/// Point-mass vehicle with a right-handed local frame. `side` is
/// `forward x up`; the frame is kept orthonormal by every update.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub position: Vec3,
    pub forward: Vec3,
    pub side: Vec3,
    pub up: Vec3,
    pub speed: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub radius: f32,
    pub mass: f32,
    pub smoothed_acceleration: Vec3,
}

/// Read-only view of another vehicle, as seen by neighbor avoidance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    pub position: Vec3,
    pub forward: Vec3,
    pub speed: f32,
    pub radius: f32,
}

impl VehicleState {
    pub fn velocity(&self) -> Vec3 {
        self.forward * self.speed
    }
}

impl Vehicle {
    pub fn new(limits: VehicleLimits) -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
            side: Vec3::SIDE,
            up: Vec3::UP,
            speed: 0.0,
            max_speed: limits.max_speed,
            max_force: limits.max_force,
            radius: limits.radius,
            mass: limits.mass,
            smoothed_acceleration: Vec3::ZERO,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.forward * self.speed
    }

    pub fn state(&self) -> VehicleState {
        VehicleState {
            position: self.position,
            forward: self.forward,
            speed: self.speed,
            radius: self.radius,
        }
    }

    pub fn predict_future_position(&self, prediction_time: f32) -> Vec3 {
        self.position + self.velocity() * prediction_time
    }

    /// World position expressed as (side, up, forward) coordinates.
    pub fn localize_position(&self, world: Vec3) -> Vec3 {
        let offset = world - self.position;
        Vec3::new(offset.dot(self.side), offset.dot(self.up), offset.dot(self.forward))
    }

    pub fn set_forward(&mut self, unit_forward: Vec3) {
        self.regenerate_orthonormal_basis_uf(unit_forward);
    }

    pub fn randomize_heading_on_xz_plane(&mut self, rng: &mut dyn RandomSource) {
        self.up = Vec3::UP;
        let forward = rng.unit_vector_on_xz_plane();
        self.forward = forward;
        self.side = Vec3::new(-forward.z, forward.y, forward.x);
    }

    /// Rebuilds side and up from a new unit forward and the previous up.
    pub fn regenerate_orthonormal_basis_uf(&mut self, unit_forward: Vec3) {
        let forward = unit_forward.normalize_or(self.forward);
        let mut up_ref = self.up;
        if forward.dot(up_ref).abs() > PARALLEL_UP_THRESHOLD {
            up_ref = if forward.dot(Vec3::UP).abs() > PARALLEL_UP_THRESHOLD {
                Vec3::FORWARD
            } else {
                Vec3::UP
            };
        }

        let side = forward.cross(up_ref).normalize_or(Vec3::SIDE);
        let up = side.cross(forward).normalize_or(Vec3::UP);
        self.forward = forward;
        self.side = side;
        self.up = up;
    }

    /// Integrates one tick of `force` into speed, position and heading.
    pub fn apply_steering_force(&mut self, force: Vec3, elapsed_time: f32) {
        let adjusted = self.adjust_raw_steering_force(force);
        let clipped = adjusted.truncate_length(self.max_force);
        let new_acceleration = clipped / self.mass.max(EPSILON);

        if elapsed_time > 0.0 {
            let smooth_rate = (9.0 * elapsed_time).clamp(0.15, 0.4);
            self.smoothed_acceleration =
                blend_into_accumulator(smooth_rate, new_acceleration, self.smoothed_acceleration);
        }

        let new_velocity = (self.velocity() + self.smoothed_acceleration * elapsed_time)
            .truncate_length(self.max_speed);
        self.speed = new_velocity.length().min(self.max_speed);
        self.position += new_velocity * elapsed_time;

        if self.speed > EPSILON {
            self.regenerate_orthonormal_basis_uf(new_velocity / self.speed);
        }
    }

    fn adjust_raw_steering_force(&self, force: Vec3) -> Vec3 {
        let max_adjusted_speed = LOW_SPEED_FRACTION * self.max_speed;
        if self.speed > max_adjusted_speed || force.is_zero() || max_adjusted_speed <= 0.0 {
            return force;
        }

        let range = self.speed / max_adjusted_speed;
        let cosine = interpolate(range.powi(20), 1.0, -1.0);
        force.limit_max_deviation_angle(cosine, self.forward)
    }
}
