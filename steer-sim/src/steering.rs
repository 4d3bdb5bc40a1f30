//! Steering behaviors and the priority chain that combines them.
//!
//! Every behavior is a function of one vehicle's state plus explicit inputs
//! (path, obstacles, neighbor states) and returns a force. The only state a
//! behavior mutates is the caller-owned [`WanderState`].

use crate::error::SteerResult;
use crate::math::{Vec3, EPSILON};
use crate::obstacle::{nearest_intersection, SphericalObstacle};
use crate::path::PolylinePath;
use crate::random::RandomSource;
use crate::vehicle::{Vehicle, VehicleState};
use serde::{Deserialize, Serialize};

// cos(45 degrees): splits parallel / perpendicular / anti-parallel headings
const HEADING_CONE_COSINE: f32 = 0.707;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Probability of skipping a higher-priority check on a given tick.
    pub leak_through: f32,
    pub obstacle_lookahead: f32,
    pub neighbor_lookahead: f32,
    pub path_lookahead: f32,
    pub neighbor_avoidance_weight: f32,
    pub path_following_weight: f32,
    pub wander_rate: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            leak_through: 0.1,
            obstacle_lookahead: 6.0,
            neighbor_lookahead: 3.0,
            path_lookahead: 3.0,
            neighbor_avoidance_weight: 10.0,
            path_following_weight: 0.5,
            wander_rate: 12.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathFollowingMode {
    /// Travel along the path in the agent's current direction.
    #[default]
    Directed,
    /// Only correct back into the tube, whichever way the agent is going.
    StayOnPath,
}

impl PathFollowingMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Directed => Self::StayOnPath,
            Self::StayOnPath => Self::Directed,
        }
    }
}

/// Which link of the priority chain produced a tick's steering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SteeringDecision {
    ObstacleAvoidance,
    NeighborAvoidance,
    #[default]
    PathAndWander,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WanderState {
    pub side: f32,
    pub up: f32,
}

/// Supplies candidate neighbors for a query sphere. Implementations may
/// return more than the exact neighborhood but never the querying agent.
pub trait NeighborSource {
    fn neighbors_within(
        &mut self,
        center: Vec3,
        radius: f32,
        results: &mut Vec<VehicleState>,
    ) -> SteerResult<()>;
}

impl NeighborSource for Vec<VehicleState> {
    fn neighbors_within(
        &mut self,
        _center: Vec3,
        _radius: f32,
        results: &mut Vec<VehicleState>,
    ) -> SteerResult<()> {
        results.extend_from_slice(self);
        Ok(())
    }
}

/// Per-tick inputs shared by every agent of a simulation.
#[derive(Clone, Copy, Debug)]
pub struct SteeringInputs<'a> {
    pub path: &'a PolylinePath,
    pub obstacles: &'a [SphericalObstacle],
    pub config: &'a SteeringConfig,
    pub path_following: PathFollowingMode,
    pub wander_enabled: bool,
}

pub fn steer_for_seek(vehicle: &Vehicle, target: Vec3) -> Vec3 {
    let desired_velocity = target - vehicle.position;
    desired_velocity - vehicle.velocity()
}

/// Random walk of the lateral and vertical wander offsets, returned as a
/// purely lateral force in the vehicle's frame.
pub fn steer_for_wander(
    vehicle: &Vehicle,
    wander: &mut WanderState,
    wander_rate: f32,
    elapsed_time: f32,
    rng: &mut dyn RandomSource,
) -> Vec3 {
    let speed = wander_rate * elapsed_time;
    wander.side = rng.scalar_random_walk(wander.side, speed, -1.0, 1.0);
    wander.up = rng.scalar_random_walk(wander.up, speed, -1.0, 1.0);
    vehicle.side * wander.side + vehicle.up * wander.up
}

/// Lateral force away from the nearest obstacle the vehicle would hit within
/// `min_time_to_collision` seconds, or zero.
pub fn steer_to_avoid_obstacles(
    vehicle: &Vehicle,
    min_time_to_collision: f32,
    obstacles: &[SphericalObstacle],
) -> Vec3 {
    nearest_intersection(vehicle, obstacles)
        .and_then(|hit| hit.steer_to_avoid_if_needed(vehicle, min_time_to_collision))
        .unwrap_or(Vec3::ZERO)
}

/// Hard sideways push away from the first neighbor already closer than
/// `min_separation` plus both radii.
pub fn steer_to_avoid_close_neighbors(
    vehicle: &Vehicle,
    min_separation: f32,
    neighbors: &[VehicleState],
) -> Vec3 {
    for other in neighbors {
        let min_center_to_center = min_separation + vehicle.radius + other.radius;
        let offset = other.position - vehicle.position;
        if offset.length() < min_center_to_center {
            return (-offset).perpendicular_component(vehicle.forward);
        }
    }
    Vec3::ZERO
}

/// Time until the two vehicles are closest, assuming constant velocities.
/// Returns 0 when they move in lockstep.
pub fn predict_nearest_approach_time(vehicle: &Vehicle, other: &VehicleState) -> f32 {
    let rel_velocity = other.velocity() - vehicle.velocity();
    let rel_speed = rel_velocity.length();
    if rel_speed <= EPSILON {
        return 0.0;
    }

    let rel_tangent = rel_velocity / rel_speed;
    let rel_position = vehicle.position - other.position;
    rel_tangent.dot(rel_position) / rel_speed
}

/// Positions of both vehicles after `time` seconds and their separation.
pub fn compute_nearest_approach_positions(
    vehicle: &Vehicle,
    other: &VehicleState,
    time: f32,
) -> (f32, Vec3, Vec3) {
    let ours = vehicle.position + vehicle.velocity() * time;
    let theirs = other.position + other.velocity() * time;
    (ours.distance(theirs), ours, theirs)
}

/// Unaligned collision avoidance: steer sideways away from whichever neighbor
/// would collide soonest within `min_time_to_collision`.
pub fn steer_to_avoid_neighbors(
    vehicle: &Vehicle,
    min_time_to_collision: f32,
    neighbors: &[VehicleState],
) -> Vec3 {
    let separation = steer_to_avoid_close_neighbors(vehicle, 0.0, neighbors);
    if !separation.is_zero() {
        return separation;
    }

    let mut min_time = min_time_to_collision;
    let mut threat: Option<(&VehicleState, Vec3)> = None;
    for other in neighbors {
        let collision_threshold = vehicle.radius + other.radius;
        let time = predict_nearest_approach_time(vehicle, other);
        if time >= 0.0 && time < min_time {
            let (distance, _, theirs) = compute_nearest_approach_positions(vehicle, other, time);
            if distance < collision_threshold {
                min_time = time;
                threat = Some((other, theirs));
            }
        }
    }

    let Some((threat, threat_position_at_approach)) = threat else {
        return Vec3::ZERO;
    };

    let parallelness = vehicle.forward.dot(threat.forward);
    let away_from = |point: Vec3| {
        if (point - vehicle.position).dot(vehicle.side) > 0.0 {
            -1.0
        } else {
            1.0
        }
    };

    let steer = if parallelness < -HEADING_CONE_COSINE {
        // head on: steer away from where the threat will be
        away_from(threat_position_at_approach)
    } else if parallelness > HEADING_CONE_COSINE {
        away_from(threat.position)
    } else if threat.speed <= vehicle.speed {
        // crossing paths: steer behind a threat that is no faster than us
        if vehicle.side.dot(threat.velocity()) > 0.0 {
            -1.0
        } else {
            1.0
        }
    } else {
        0.0
    };

    vehicle.side * steer
}

/// Keeps the vehicle travelling along `path` in `direction` (+1 downstream,
/// -1 upstream). Zero while the predicted position is inside the tube and
/// moving the right way.
pub fn steer_to_follow_path(
    vehicle: &Vehicle,
    direction: f32,
    prediction_time: f32,
    path: &PolylinePath,
) -> Vec3 {
    let path_distance_offset = direction * prediction_time * vehicle.speed;
    let future_position = vehicle.predict_future_position(prediction_time);

    let now_path_distance = path.map_point_to_path_distance(vehicle.position);
    let future_path_distance = path.map_point_to_path_distance(future_position);
    let right_way = if path_distance_offset > 0.0 {
        now_path_distance < future_path_distance
    } else {
        now_path_distance > future_path_distance
    };

    let projection = path.closest_point_on_path(future_position);
    if projection.outside < 0.0 && right_way {
        return Vec3::ZERO;
    }

    let target = path.map_path_distance_to_point(now_path_distance + path_distance_offset);
    steer_for_seek(vehicle, target)
}

/// Steers back towards the centerline only when the predicted position
/// leaves the tube.
pub fn steer_to_stay_on_path(vehicle: &Vehicle, prediction_time: f32, path: &PolylinePath) -> Vec3 {
    let future_position = vehicle.predict_future_position(prediction_time);
    let projection = path.closest_point_on_path(future_position);
    if projection.outside < 0.0 {
        return Vec3::ZERO;
    }
    steer_for_seek(vehicle, projection.point)
}

/// Priority chain with leak-through: obstacle avoidance, else neighbor
/// avoidance, else wander plus path following. A higher link that fires
/// short-circuits everything below it. Forward thrust is always added and
/// the result is flattened onto the ground plane.
#[allow(clippy::too_many_arguments)]
pub fn combined_steering(
    vehicle: &Vehicle,
    wander: &mut WanderState,
    path_direction: f32,
    inputs: &SteeringInputs<'_>,
    neighbor_source: &mut dyn NeighborSource,
    neighbors: &mut Vec<VehicleState>,
    rng: &mut dyn RandomSource,
    elapsed_time: f32,
) -> SteerResult<(Vec3, SteeringDecision)> {
    let config = inputs.config;
    let mut steering = vehicle.forward;

    let mut obstacle_avoidance = Vec3::ZERO;
    if config.leak_through < rng.next_unit() {
        obstacle_avoidance =
            steer_to_avoid_obstacles(vehicle, config.obstacle_lookahead, inputs.obstacles);
    }
    if !obstacle_avoidance.is_zero() {
        steering += obstacle_avoidance;
        return Ok((steering.set_y_to_zero(), SteeringDecision::ObstacleAvoidance));
    }

    let max_radius = config.neighbor_lookahead * vehicle.max_speed * 2.0;
    neighbors.clear();
    neighbor_source.neighbors_within(vehicle.position, max_radius, neighbors)?;

    let mut collision_avoidance = Vec3::ZERO;
    if config.leak_through < rng.next_unit() {
        collision_avoidance = steer_to_avoid_neighbors(vehicle, config.neighbor_lookahead, neighbors)
            * config.neighbor_avoidance_weight;
    }
    if !collision_avoidance.is_zero() {
        steering += collision_avoidance;
        return Ok((steering.set_y_to_zero(), SteeringDecision::NeighborAvoidance));
    }

    if inputs.wander_enabled {
        steering += steer_for_wander(vehicle, wander, config.wander_rate, elapsed_time, rng);
    }
    let path_following = match inputs.path_following {
        PathFollowingMode::Directed => {
            steer_to_follow_path(vehicle, path_direction, config.path_lookahead, inputs.path)
        }
        PathFollowingMode::StayOnPath => {
            steer_to_stay_on_path(vehicle, config.path_lookahead, inputs.path)
        }
    };
    steering += path_following * config.path_following_weight;

    Ok((steering.set_y_to_zero(), SteeringDecision::PathAndWander))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::tests::ScriptedRandom;
    use crate::vehicle::VehicleLimits;
    use approx::assert_abs_diff_eq;

    fn moving_vehicle(position: Vec3, forward: Vec3, speed: f32) -> Vehicle {
        let mut vehicle = Vehicle::new(VehicleLimits::default());
        vehicle.position = position;
        vehicle.set_forward(forward);
        vehicle.speed = speed;
        vehicle
    }

    fn straight_path() -> PolylinePath {
        PolylinePath::new(vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 40.0)], 2.0).unwrap()
    }

    fn no_leak() -> SteeringConfig {
        SteeringConfig {
            leak_through: 0.0,
            ..SteeringConfig::default()
        }
    }

    #[test]
    fn seek_points_at_target_minus_velocity() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        let force = steer_for_seek(&vehicle, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(force, Vec3::new(3.0, 0.0, -1.0));
    }

    #[test]
    fn obstacle_avoidance_is_zero_without_threats() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 2.0);
        let behind = SphericalObstacle::new(Vec3::new(0.0, 0.0, -10.0), 3.0).unwrap();
        let beyond_window = SphericalObstacle::new(Vec3::new(0.0, 0.0, 40.0), 3.0).unwrap();
        assert_eq!(steer_to_avoid_obstacles(&vehicle, 6.0, &[behind, beyond_window]), Vec3::ZERO);
        assert_eq!(steer_to_avoid_obstacles(&vehicle, 6.0, &[]), Vec3::ZERO);
    }

    #[test]
    fn obstacle_directly_ahead_triggers_within_expected_time() {
        // speed 2, surface of the grown sphere 10 - 3.5 = 6.5 ahead: 3.25s away
        let obstacle = SphericalObstacle::new(Vec3::new(0.0, 0.0, 10.0), 3.0).unwrap();
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 2.0);

        assert_eq!(steer_to_avoid_obstacles(&vehicle, 3.2, &[obstacle]), Vec3::ZERO);
        let force = steer_to_avoid_obstacles(&vehicle, 3.3, &[obstacle]);
        assert_abs_diff_eq!(force.length(), vehicle.max_force, epsilon = 1.0e-3);
        assert_abs_diff_eq!(force.dot(vehicle.forward), 0.0, epsilon = 1.0e-4);
    }

    #[test]
    fn obstacle_force_points_away_from_offset_obstacle() {
        let obstacle = SphericalObstacle::new(Vec3::new(1.0, 0.0, 8.0), 3.0).unwrap();
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 2.0);
        let force = steer_to_avoid_obstacles(&vehicle, 6.0, &[obstacle]);
        assert!(force.x < 0.0);
        assert!(force.dot(obstacle.center - vehicle.position) < 0.0);
    }

    #[test]
    fn nearest_approach_time_for_head_on_pair() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        let other = moving_vehicle(Vec3::new(0.0, 0.0, 10.0), -Vec3::FORWARD, 1.0).state();
        assert_abs_diff_eq!(predict_nearest_approach_time(&vehicle, &other), 5.0, epsilon = 1.0e-4);

        let lockstep = moving_vehicle(Vec3::new(3.0, 0.0, 0.0), Vec3::FORWARD, 1.0).state();
        assert_eq!(predict_nearest_approach_time(&vehicle, &lockstep), 0.0);
    }

    #[test]
    fn neighbor_avoidance_ignores_distant_future_collisions() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        let other = moving_vehicle(Vec3::new(0.0, 0.0, 10.0), -Vec3::FORWARD, 1.0).state();
        // collision in 5s, window is 3s
        assert_eq!(steer_to_avoid_neighbors(&vehicle, 3.0, &[other]), Vec3::ZERO);
        assert_eq!(steer_to_avoid_neighbors(&vehicle, 3.0, &[]), Vec3::ZERO);
    }

    #[test]
    fn head_on_neighbor_gives_lateral_steer() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        let other = moving_vehicle(Vec3::new(0.2, 0.0, 4.0), -Vec3::FORWARD, 1.0).state();
        let force = steer_to_avoid_neighbors(&vehicle, 3.0, &[other]);
        assert_abs_diff_eq!(force.length(), 1.0, epsilon = 1.0e-5);
        assert_abs_diff_eq!(force.dot(vehicle.forward), 0.0, epsilon = 1.0e-5);
        // threat is on the +x side, steer to -x
        assert!(force.x < 0.0);
    }

    #[test]
    fn soonest_threat_is_the_one_avoided() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        // left threat arrives in 1.5s, right threat in 2.5s
        let soon = moving_vehicle(Vec3::new(-0.2, 0.0, 3.0), -Vec3::FORWARD, 1.0).state();
        let later = moving_vehicle(Vec3::new(0.2, 0.0, 5.0), -Vec3::FORWARD, 1.0).state();
        let force = steer_to_avoid_neighbors(&vehicle, 3.0, &[later, soon]);
        assert!(force.x > 0.0);
    }

    #[test]
    fn overlapping_neighbor_is_pushed_away_sideways() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        let other = moving_vehicle(Vec3::new(0.5, 0.0, 0.3), Vec3::FORWARD, 1.0).state();
        let force = steer_to_avoid_neighbors(&vehicle, 3.0, &[other]);
        assert_abs_diff_eq!(force, Vec3::new(-0.5, 0.0, 0.0), epsilon = 1.0e-5);
    }

    #[test]
    fn path_following_is_quiet_inside_tube_in_the_right_direction() {
        let path = straight_path();
        let vehicle = moving_vehicle(Vec3::new(0.5, 0.0, 10.0), Vec3::FORWARD, 1.0);
        assert_eq!(steer_to_follow_path(&vehicle, 1.0, 3.0, &path), Vec3::ZERO);
        assert_eq!(steer_to_stay_on_path(&vehicle, 3.0, &path), Vec3::ZERO);
    }

    #[test]
    fn directed_following_turns_wrong_way_traveller_around() {
        let path = straight_path();
        let vehicle = moving_vehicle(Vec3::new(0.0, 0.0, 10.0), Vec3::FORWARD, 1.0);
        let force = steer_to_follow_path(&vehicle, -1.0, 3.0, &path);
        // target is 3 units upstream, velocity points downstream
        assert_abs_diff_eq!(force, Vec3::new(0.0, 0.0, -4.0), epsilon = 1.0e-4);
        // staying on path does not care about direction
        assert_eq!(steer_to_stay_on_path(&vehicle, 3.0, &path), Vec3::ZERO);
    }

    #[test]
    fn stray_vehicle_is_steered_back_to_the_tube() {
        let path = straight_path();
        let vehicle = moving_vehicle(Vec3::new(8.0, 0.0, 10.0), Vec3::FORWARD, 1.0);
        let follow = steer_to_follow_path(&vehicle, 1.0, 3.0, &path);
        let stay = steer_to_stay_on_path(&vehicle, 3.0, &path);
        assert!(follow.x < 0.0);
        assert!(stay.x < 0.0);
    }

    #[test]
    fn wander_stays_lateral_and_bounded() {
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 1.0);
        let mut wander = WanderState::default();
        let mut rng = ScriptedRandom::new(vec![0.9, 0.1, 0.7, 0.3]);
        for _ in 0..100 {
            let force = steer_for_wander(&vehicle, &mut wander, 12.0, 0.1, &mut rng);
            assert_abs_diff_eq!(force.dot(vehicle.forward), 0.0, epsilon = 1.0e-5);
            assert!(wander.side.abs() <= 1.0 && wander.up.abs() <= 1.0);
        }
        assert!(wander.side != 0.0);
    }

    struct CountingNeighbors {
        states: Vec<VehicleState>,
        queried_radius: Option<f32>,
    }

    impl NeighborSource for CountingNeighbors {
        fn neighbors_within(
            &mut self,
            _center: Vec3,
            radius: f32,
            results: &mut Vec<VehicleState>,
        ) -> SteerResult<()> {
            self.queried_radius = Some(radius);
            results.extend_from_slice(&self.states);
            Ok(())
        }
    }

    #[test]
    fn obstacle_avoidance_short_circuits_everything_else() {
        let path = straight_path();
        let obstacle = SphericalObstacle::new(Vec3::new(0.3, 0.0, 6.0), 2.0).unwrap();
        let config = no_leak();
        let inputs = SteeringInputs {
            path: &path,
            obstacles: &[obstacle],
            config: &config,
            path_following: PathFollowingMode::Directed,
            wander_enabled: true,
        };
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 2.0);
        let mut source = CountingNeighbors {
            states: vec![moving_vehicle(Vec3::new(0.2, 0.0, 2.0), -Vec3::FORWARD, 2.0).state()],
            queried_radius: None,
        };
        let mut wander = WanderState::default();
        let mut rng = ScriptedRandom::constant(0.5);
        let mut scratch = Vec::new();

        let (force, decision) = combined_steering(
            &vehicle,
            &mut wander,
            1.0,
            &inputs,
            &mut source,
            &mut scratch,
            &mut rng,
            0.1,
        )
        .unwrap();

        let expected = (vehicle.forward + steer_to_avoid_obstacles(&vehicle, 6.0, &[obstacle]))
            .set_y_to_zero();
        assert_eq!(decision, SteeringDecision::ObstacleAvoidance);
        assert_abs_diff_eq!(force, expected, epsilon = 1.0e-6);
        assert_eq!(source.queried_radius, None);
        assert_eq!(wander, WanderState::default());
    }

    #[test]
    fn neighbor_avoidance_wins_over_path_following() {
        let path = straight_path();
        let config = no_leak();
        let inputs = SteeringInputs {
            path: &path,
            obstacles: &[],
            config: &config,
            path_following: PathFollowingMode::Directed,
            wander_enabled: true,
        };
        let vehicle = moving_vehicle(Vec3::new(0.0, 0.0, 5.0), Vec3::FORWARD, 2.0);
        let threat = moving_vehicle(Vec3::new(0.2, 0.0, 9.0), -Vec3::FORWARD, 2.0).state();
        let mut source = CountingNeighbors {
            states: vec![threat],
            queried_radius: None,
        };
        let mut wander = WanderState::default();
        let mut rng = ScriptedRandom::constant(0.5);
        let mut scratch = Vec::new();

        let (force, decision) = combined_steering(
            &vehicle,
            &mut wander,
            1.0,
            &inputs,
            &mut source,
            &mut scratch,
            &mut rng,
            0.1,
        )
        .unwrap();

        let expected = vehicle.forward + steer_to_avoid_neighbors(&vehicle, 3.0, &[threat]) * 10.0;
        assert_eq!(decision, SteeringDecision::NeighborAvoidance);
        assert_abs_diff_eq!(force, expected, epsilon = 1.0e-6);
        assert_abs_diff_eq!(source.queried_radius.unwrap(), 12.0, epsilon = 1.0e-6);
        assert_eq!(wander, WanderState::default());
    }

    #[test]
    fn leak_through_skips_obstacle_check() {
        let path = straight_path();
        let obstacle = SphericalObstacle::new(Vec3::new(0.3, 0.0, 6.0), 2.0).unwrap();
        let config = SteeringConfig {
            leak_through: 0.1,
            ..SteeringConfig::default()
        };
        let inputs = SteeringInputs {
            path: &path,
            obstacles: &[obstacle],
            config: &config,
            path_following: PathFollowingMode::Directed,
            wander_enabled: false,
        };
        let vehicle = moving_vehicle(Vec3::ZERO, Vec3::FORWARD, 2.0);
        let mut neighbors: Vec<VehicleState> = Vec::new();
        let mut wander = WanderState::default();
        // first draw is below the leak-through probability
        let mut rng = ScriptedRandom::new(vec![0.05, 0.5]);
        let mut scratch = Vec::new();

        let (force, decision) = combined_steering(
            &vehicle,
            &mut wander,
            1.0,
            &inputs,
            &mut neighbors,
            &mut scratch,
            &mut rng,
            0.1,
        )
        .unwrap();

        assert_eq!(decision, SteeringDecision::PathAndWander);
        assert_abs_diff_eq!(force, vehicle.forward, epsilon = 1.0e-6);
    }

    #[test]
    fn calm_tick_blends_thrust_wander_and_half_path_force() {
        let path = straight_path();
        let config = no_leak();
        let inputs = SteeringInputs {
            path: &path,
            obstacles: &[],
            config: &config,
            path_following: PathFollowingMode::StayOnPath,
            wander_enabled: true,
        };
        let vehicle = moving_vehicle(Vec3::new(8.0, 0.0, 10.0), Vec3::FORWARD, 1.0);
        let mut neighbors: Vec<VehicleState> = Vec::new();
        let mut wander = WanderState::default();
        let mut rng = ScriptedRandom::constant(0.75);
        let mut scratch = Vec::new();

        let (force, decision) = combined_steering(
            &vehicle,
            &mut wander,
            1.0,
            &inputs,
            &mut neighbors,
            &mut scratch,
            &mut rng,
            0.1,
        )
        .unwrap();

        let wander_force = vehicle.side * wander.side + vehicle.up * wander.up;
        let expected = (vehicle.forward
            + wander_force
            + steer_to_stay_on_path(&vehicle, 3.0, &path) * 0.5)
            .set_y_to_zero();
        assert_eq!(decision, SteeringDecision::PathAndWander);
        assert!(wander.side > 0.0);
        assert_abs_diff_eq!(force, expected, epsilon = 1.0e-5);
        assert_eq!(force.y, 0.0);
    }
}
