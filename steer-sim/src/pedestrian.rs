use crate::math::Vec3;
use crate::path::PolylinePath;
use crate::proximity::{ProximityIndex, ProximityToken};
use crate::random::RandomSource;
use crate::steering::{SteeringDecision, WanderState};
use crate::vehicle::{Vehicle, VehicleLimits};

/// One member of the crowd: a vehicle registered with the active proximity
/// index, walking the shared path in `path_direction`.
#[derive(Debug)]
pub struct Pedestrian {
    pub(crate) vehicle: Vehicle,
    pub(crate) token: ProximityToken,
    pub(crate) wander: WanderState,
    pub(crate) path_direction: f32,
    pub(crate) serial_number: u32,
    pub(crate) last_decision: SteeringDecision,
}

impl Pedestrian {
    /// Creates a pedestrian at a random spot on `path` and registers it with
    /// `index` under `key`.
    pub(crate) fn spawn(
        serial_number: u32,
        key: usize,
        limits: VehicleLimits,
        path: &PolylinePath,
        index: &mut dyn ProximityIndex,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let (vehicle, path_direction) = random_start(limits, path, rng);
        let token = index.allocate_token(key, vehicle.position);
        Self {
            vehicle,
            token,
            wander: WanderState::default(),
            path_direction,
            serial_number,
            last_decision: SteeringDecision::default(),
        }
    }

    /// Re-randomizes placement, heading and direction. The caller pushes
    /// the new position into the index.
    pub(crate) fn reset(&mut self, limits: VehicleLimits, path: &PolylinePath, rng: &mut dyn RandomSource) {
        let (vehicle, path_direction) = random_start(limits, path, rng);
        self.vehicle = vehicle;
        self.path_direction = path_direction;
        self.wander = WanderState::default();
        self.last_decision = SteeringDecision::default();
    }

    /// Turns around near either end of the path.
    pub(crate) fn update_path_direction(&mut self, path: &PolylinePath) {
        let radius = path.radius();
        if self.vehicle.position.distance(path.first_point()) < radius {
            self.path_direction = 1.0;
        }
        if self.vehicle.position.distance(path.last_point()) < radius {
            self.path_direction = -1.0;
        }
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn position(&self) -> Vec3 {
        self.vehicle.position
    }

    pub fn path_direction(&self) -> f32 {
        self.path_direction
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    pub fn wander(&self) -> WanderState {
        self.wander
    }

    pub fn last_decision(&self) -> SteeringDecision {
        self.last_decision
    }

    pub fn token(&self) -> &ProximityToken {
        &self.token
    }
}

fn random_start(limits: VehicleLimits, path: &PolylinePath, rng: &mut dyn RandomSource) -> (Vehicle, f32) {
    let mut vehicle = Vehicle::new(limits);

    let distance = path.total_length() * rng.next_unit();
    let offset = rng.vector_in_xz_disk() * path.radius();
    vehicle.position = path.map_path_distance_to_point(distance) + offset;
    vehicle.randomize_heading_on_xz_plane(rng);

    let path_direction = if rng.next_unit() > 0.5 { -1.0 } else { 1.0 };
    (vehicle, path_direction)
}

#[cfg(test)]
mod tests {
    use super::Pedestrian;
    use crate::math::Vec3;
    use crate::path::PolylinePath;
    use crate::proximity::{BruteForceIndex, ProximityIndex};
    use crate::random::SeededRandom;
    use crate::vehicle::VehicleLimits;

    fn straight_path() -> PolylinePath {
        PolylinePath::new(vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 40.0)], 2.0).unwrap()
    }

    #[test]
    fn spawns_stopped_near_the_path_and_registered() {
        let path = straight_path();
        let mut index = BruteForceIndex::new();
        let mut rng = SeededRandom::from_seed(5);

        for key in 0..50 {
            let p = Pedestrian::spawn(key as u32, key, VehicleLimits::default(), &path, &mut index, &mut rng);
            assert_eq!(p.vehicle().speed, 0.0);
            assert_eq!(p.position().y, 0.0);
            assert!(path.closest_point_on_path(p.position()).outside <= 0.0);
            assert!(p.path_direction() == 1.0 || p.path_direction() == -1.0);
            assert_eq!(index.position_of(p.token()).unwrap(), p.position());
            assert!((p.vehicle().forward.length() - 1.0).abs() < 1.0e-4);
        }
        assert_eq!(index.len(), 50);
    }

    #[test]
    fn reverses_at_either_endpoint() {
        let path = straight_path();
        let mut index = BruteForceIndex::new();
        let mut rng = SeededRandom::from_seed(1);
        let mut p = Pedestrian::spawn(0, 0, VehicleLimits::default(), &path, &mut index, &mut rng);

        p.vehicle.position = Vec3::new(0.5, 0.0, 1.0);
        p.path_direction = -1.0;
        p.update_path_direction(&path);
        assert_eq!(p.path_direction(), 1.0);

        p.vehicle.position = Vec3::new(0.0, 0.0, 39.0);
        p.update_path_direction(&path);
        assert_eq!(p.path_direction(), -1.0);

        // between the endpoints nothing changes
        p.vehicle.position = Vec3::new(0.0, 0.0, 20.0);
        p.update_path_direction(&path);
        assert_eq!(p.path_direction(), -1.0);
    }

    #[test]
    fn reset_clears_motion_state() {
        let path = straight_path();
        let mut index = BruteForceIndex::new();
        let mut rng = SeededRandom::from_seed(2);
        let mut p = Pedestrian::spawn(0, 0, VehicleLimits::default(), &path, &mut index, &mut rng);
        p.vehicle.speed = 1.5;
        p.wander.side = 0.7;

        p.reset(VehicleLimits::default(), &path, &mut rng);
        assert_eq!(p.vehicle().speed, 0.0);
        assert_eq!(p.wander().side, 0.0);
    }
}
