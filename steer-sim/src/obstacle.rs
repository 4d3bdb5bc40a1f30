use crate::error::{SteerError, SteerResult};
use crate::math::Vec3;
use crate::vehicle::Vehicle;

/// Static sphere the agents steer around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphericalObstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Where a vehicle's straight-ahead path first meets an obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathIntersection {
    /// Distance along the vehicle's forward axis; zero when already inside.
    pub distance: f32,
    pub surface_point: Vec3,
    pub surface_normal: Vec3,
    pub obstacle: SphericalObstacle,
}

impl SphericalObstacle {
    pub fn new(center: Vec3, radius: f32) -> SteerResult<Self> {
        if !center.is_finite() {
            return Err(SteerError::InvalidObstacle {
                reason: "center is not finite".to_string(),
            });
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SteerError::InvalidObstacle {
                reason: format!("radius must be positive, got {radius}"),
            });
        }
        Ok(Self { center, radius })
    }

    /// Line/sphere test along the vehicle's forward axis, done in the
    /// vehicle's local space. The sphere is grown by the vehicle radius.
    pub fn find_intersection_with_vehicle_path(&self, vehicle: &Vehicle) -> Option<PathIntersection> {
        let local_center = vehicle.localize_position(self.center);
        let combined_radius = self.radius + vehicle.radius;

        let b = -2.0 * local_center.z;
        let c = local_center.length_squared() - combined_radius * combined_radius;
        let discriminant = b * b - 4.0 * c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let p = (-b + root) * 0.5;
        let q = (-b - root) * 0.5;
        if p < 0.0 && q < 0.0 {
            return None;
        }

        // One root behind and one ahead means the vehicle is inside the solid.
        let distance = if p > 0.0 && q > 0.0 { p.min(q) } else { 0.0 };
        let surface_point = vehicle.position + vehicle.forward * distance;
        Some(PathIntersection {
            distance,
            surface_point,
            surface_normal: (surface_point - self.center).normalize(),
            obstacle: *self,
        })
    }
}

impl PathIntersection {
    /// Lateral force of magnitude `max_force` when the intersection lies within
    /// `min_time_to_collision` seconds of travel, otherwise `None`.
    pub fn steer_to_avoid_if_needed(&self, vehicle: &Vehicle, min_time_to_collision: f32) -> Option<Vec3> {
        let min_distance_to_collision = min_time_to_collision * vehicle.speed;
        if self.distance >= min_distance_to_collision {
            return None;
        }

        // A dead-center hit has no lateral hint; turn towards the vehicle side.
        let lateral = self
            .surface_normal
            .perpendicular_component(vehicle.forward)
            .normalize_or(vehicle.side);
        Some(lateral * vehicle.max_force)
    }
}

/// Nearest intersection over the whole obstacle set.
pub fn nearest_intersection(vehicle: &Vehicle, obstacles: &[SphericalObstacle]) -> Option<PathIntersection> {
    obstacles
        .iter()
        .filter_map(|o| o.find_intersection_with_vehicle_path(vehicle))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

#[cfg(test)]
mod tests {
    use super::{nearest_intersection, SphericalObstacle};
    use crate::math::Vec3;
    use crate::vehicle::{Vehicle, VehicleLimits};
    use approx::assert_abs_diff_eq;

    fn vehicle_heading_z(speed: f32) -> Vehicle {
        let mut vehicle = Vehicle::new(VehicleLimits::default());
        vehicle.speed = speed;
        vehicle
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(SphericalObstacle::new(Vec3::ZERO, 0.0).is_err());
        assert!(SphericalObstacle::new(Vec3::ZERO, f32::NAN).is_err());
        assert!(SphericalObstacle::new(Vec3::ZERO, 1.0).is_ok());
    }

    #[test]
    fn obstacle_ahead_is_hit_at_expected_distance() {
        let vehicle = vehicle_heading_z(1.0);
        let obstacle = SphericalObstacle::new(Vec3::new(0.0, 0.0, 10.0), 2.0).unwrap();
        let hit = obstacle.find_intersection_with_vehicle_path(&vehicle).unwrap();
        // 10 - (2 + 0.5)
        assert_abs_diff_eq!(hit.distance, 7.5, epsilon = 1.0e-4);
    }

    #[test]
    fn obstacle_behind_or_aside_is_ignored() {
        let vehicle = vehicle_heading_z(1.0);
        let behind = SphericalObstacle::new(Vec3::new(0.0, 0.0, -10.0), 2.0).unwrap();
        let aside = SphericalObstacle::new(Vec3::new(6.0, 0.0, 10.0), 2.0).unwrap();
        assert!(behind.find_intersection_with_vehicle_path(&vehicle).is_none());
        assert!(aside.find_intersection_with_vehicle_path(&vehicle).is_none());
    }

    #[test]
    fn inside_obstacle_reports_zero_distance() {
        let vehicle = vehicle_heading_z(1.0);
        let around = SphericalObstacle::new(Vec3::new(0.5, 0.0, 0.0), 3.0).unwrap();
        let hit = around.find_intersection_with_vehicle_path(&vehicle).unwrap();
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn nearest_of_several_obstacles_wins() {
        let vehicle = vehicle_heading_z(1.0);
        let far = SphericalObstacle::new(Vec3::new(0.0, 0.0, 30.0), 2.0).unwrap();
        let near = SphericalObstacle::new(Vec3::new(0.3, 0.0, 8.0), 1.0).unwrap();
        let hit = nearest_intersection(&vehicle, &[far, near]).unwrap();
        assert_eq!(hit.obstacle, near);
    }

    #[test]
    fn avoidance_only_within_time_window() {
        let obstacle = SphericalObstacle::new(Vec3::new(0.5, 0.0, 10.0), 2.0).unwrap();

        let slow = vehicle_heading_z(1.0);
        let hit = obstacle.find_intersection_with_vehicle_path(&slow).unwrap();
        assert!(hit.steer_to_avoid_if_needed(&slow, 6.0).is_none());

        let fast = vehicle_heading_z(2.0);
        let hit = obstacle.find_intersection_with_vehicle_path(&fast).unwrap();
        let force = hit.steer_to_avoid_if_needed(&fast, 6.0).unwrap();
        assert_abs_diff_eq!(force.length(), fast.max_force, epsilon = 1.0e-3);
        assert_abs_diff_eq!(force.dot(fast.forward), 0.0, epsilon = 1.0e-4);
        // obstacle center is at +x, so the push is towards -x
        assert!(force.x < 0.0);
    }
}
