use crate::annotation::{Annotator, Color};
use crate::clock::Clock;
use crate::config::SimConfig;
use crate::error::SteerResult;
use crate::math::Vec3;
use crate::obstacle::SphericalObstacle;
use crate::path::PolylinePath;
use crate::pedestrian::Pedestrian;
use crate::proximity::{new_index, IndexKind, ProximityIndex, ProximityToken};
use crate::random::{RandomSource, SeededRandom};
use crate::steering::{combined_steering, NeighborSource, PathFollowingMode, SteeringInputs};
use crate::vehicle::VehicleState;
use std::mem;

const VELOCITY_LINE_SECONDS: f32 = 1.0;

/// A crowd of pedestrians sharing one path, one obstacle set and one
/// proximity index. Agents are updated sequentially in spawn order, so each
/// agent sees the already-updated positions of the agents before it.
pub struct Simulation {
    config: SimConfig,
    path: PolylinePath,
    obstacles: Vec<SphericalObstacle>,
    index: Box<dyn ProximityIndex>,
    crowd: Vec<Pedestrian>,
    rng: Box<dyn RandomSource>,
    clock: Clock,
    path_following: PathFollowingMode,
    wander_enabled: bool,
    next_serial: u32,
    key_scratch: Vec<usize>,
    neighbor_scratch: Vec<VehicleState>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> SteerResult<Self> {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::from_seed(seed)),
            None => Box::new(SeededRandom::from_entropy()?),
        };
        Self::with_random_source(config, rng)
    }

    pub fn from_preset(name: &str) -> SteerResult<Self> {
        Self::new(SimConfig::preset(name)?)
    }

    /// Builds the simulation around a caller-supplied random source; the
    /// config's `seed` is ignored.
    pub fn with_random_source(config: SimConfig, rng: Box<dyn RandomSource>) -> SteerResult<Self> {
        config.validate()?;
        let path = config.build_path()?;
        let obstacles = config.build_obstacles()?;
        let index = new_index(config.index, &config.lattice)?;

        let mut simulation = Self {
            path,
            obstacles,
            index,
            crowd: Vec::with_capacity(config.population),
            rng,
            clock: Clock::new(config.clock),
            path_following: config.path_following,
            wander_enabled: config.wander_enabled,
            next_serial: 0,
            key_scratch: Vec::new(),
            neighbor_scratch: Vec::new(),
            config,
        };
        for _ in 0..simulation.config.population {
            simulation.spawn_agent();
        }
        log::info!(
            "simulation started: {} agents, {} index",
            simulation.crowd.len(),
            simulation.index.kind().name()
        );
        Ok(simulation)
    }

    fn spawn_agent(&mut self) {
        let key = self.crowd.len();
        let agent = Pedestrian::spawn(
            self.next_serial,
            key,
            self.config.vehicle,
            &self.path,
            self.index.as_mut(),
            self.rng.as_mut(),
        );
        self.next_serial += 1;
        self.crowd.push(agent);
    }

    /// Adds one pedestrian and returns the new population.
    pub fn add_agent(&mut self) -> usize {
        self.spawn_agent();
        log::info!("added pedestrian, population {}", self.crowd.len());
        self.crowd.len()
    }

    /// Removes the most recently added pedestrian and returns its serial
    /// number, or `None` when the crowd is empty.
    pub fn remove_agent(&mut self) -> SteerResult<Option<u32>> {
        let Some(agent) = self.crowd.pop() else {
            return Ok(None);
        };
        let Pedestrian {
            token,
            serial_number,
            ..
        } = agent;
        self.index.release(token)?;
        log::info!("removed pedestrian #{serial_number}, population {}", self.crowd.len());
        Ok(Some(serial_number))
    }

    /// Moves every agent onto a fresh index of `kind` at its current
    /// position, then drops the old index.
    pub fn set_active_index(&mut self, kind: IndexKind) -> SteerResult<()> {
        if kind == self.index.kind() {
            return Ok(());
        }
        let mut replacement = new_index(kind, &self.config.lattice)?;
        let fresh: Vec<ProximityToken> = self
            .crowd
            .iter()
            .enumerate()
            .map(|(key, agent)| replacement.allocate_token(key, agent.vehicle.position))
            .collect();
        // nothing below can fail; the old index goes away with its tokens
        for (agent, token) in self.crowd.iter_mut().zip(fresh) {
            agent.token = token;
        }
        let previous = mem::replace(&mut self.index, replacement);
        log::info!(
            "proximity index switched from {} to {} ({} agents)",
            previous.kind().name(),
            kind.name(),
            self.index.len()
        );
        Ok(())
    }

    /// Lattice, then brute force, then lattice again.
    pub fn cycle_index(&mut self) -> SteerResult<IndexKind> {
        let next = self.index.kind().next();
        self.set_active_index(next)?;
        Ok(next)
    }

    pub fn set_path_following_mode(&mut self, mode: PathFollowingMode) {
        self.path_following = mode;
    }

    pub fn toggle_path_following_mode(&mut self) -> PathFollowingMode {
        self.path_following = self.path_following.toggled();
        self.path_following
    }

    pub fn set_wander_enabled(&mut self, enabled: bool) {
        self.wander_enabled = enabled;
    }

    pub fn toggle_wander(&mut self) -> bool {
        self.wander_enabled = !self.wander_enabled;
        self.wander_enabled
    }

    /// Re-randomizes every agent in place.
    pub fn reset(&mut self) -> SteerResult<()> {
        for agent in &mut self.crowd {
            agent.reset(self.config.vehicle, &self.path, self.rng.as_mut());
            self.index
                .update_for_new_position(&agent.token, agent.vehicle.position)?;
        }
        log::info!("reset {} pedestrians", self.crowd.len());
        Ok(())
    }

    /// Advances the host clock by `real_elapsed` and steps the crowd by
    /// whatever simulation time passed.
    pub fn tick(&mut self, real_elapsed: f32) -> SteerResult<()> {
        let elapsed = self.clock.update(real_elapsed);
        if elapsed > 0.0 {
            self.step(self.clock.total_simulation_time(), elapsed)?;
        }
        Ok(())
    }

    /// One sequential update of every agent: steer, integrate, push the new
    /// position into the index, then check for endpoint reversal.
    pub fn step(&mut self, current_time: f32, elapsed_time: f32) -> SteerResult<()> {
        let inputs = SteeringInputs {
            path: &self.path,
            obstacles: &self.obstacles,
            config: &self.config.steering,
            path_following: self.path_following,
            wander_enabled: self.wander_enabled,
        };

        for key in 0..self.crowd.len() {
            let agent = &self.crowd[key];
            let mut wander = agent.wander;
            let mut neighbors = CrowdNeighbors {
                index: self.index.as_ref(),
                token: &agent.token,
                crowd: &self.crowd,
                self_key: key,
                keys: &mut self.key_scratch,
            };
            let (force, decision) = combined_steering(
                &agent.vehicle,
                &mut wander,
                agent.path_direction,
                &inputs,
                &mut neighbors,
                &mut self.neighbor_scratch,
                self.rng.as_mut(),
                elapsed_time,
            )?;

            let agent = &mut self.crowd[key];
            agent.wander = wander;
            agent.last_decision = decision;
            agent.vehicle.apply_steering_force(force, elapsed_time);
            self.index
                .update_for_new_position(&agent.token, agent.vehicle.position)?;
            agent.update_path_direction(&self.path);
        }

        log::trace!(
            "t={current_time:.3} dt={elapsed_time:.4}: updated {} pedestrians",
            self.crowd.len()
        );
        Ok(())
    }

    pub fn agents(&self) -> &[Pedestrian] {
        &self.crowd
    }

    pub fn len(&self) -> usize {
        self.crowd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crowd.is_empty()
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index.kind()
    }

    pub fn indexed_count(&self) -> usize {
        self.index.len()
    }

    pub fn path(&self) -> &PolylinePath {
        &self.path
    }

    pub fn obstacles(&self) -> &[SphericalObstacle] {
        &self.obstacles
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn path_following_mode(&self) -> PathFollowingMode {
        self.path_following
    }

    pub fn wander_enabled(&self) -> bool {
        self.wander_enabled
    }

    /// Overwrites `out` with x, y, z triples in agent order.
    pub fn write_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.crowd.len() * 3);
        for agent in &self.crowd {
            let p = agent.vehicle.position;
            out.extend_from_slice(&[p.x, p.y, p.z]);
        }
    }

    pub fn nearest_agent_to(&self, point: Vec3) -> Option<&Pedestrian> {
        self.crowd.iter().min_by(|a, b| {
            a.vehicle
                .position
                .distance(point)
                .total_cmp(&b.vehicle.position.distance(point))
        })
    }

    pub fn draw(&self, annotator: &mut dyn Annotator) {
        for segment in self.path.points().windows(2) {
            annotator.line(segment[0], segment[1], Color::RED);
        }
        annotator.circle_xz(self.path.first_point(), self.path.radius(), Color::GREEN);
        annotator.circle_xz(self.path.last_point(), self.path.radius(), Color::GREEN);
        for obstacle in &self.obstacles {
            annotator.circle_xz(obstacle.center, obstacle.radius, Color::WHITE);
        }

        for agent in &self.crowd {
            let vehicle = &agent.vehicle;
            annotator.circle_xz(vehicle.position, vehicle.radius, Color::GRAY);
            annotator.line(
                vehicle.position,
                vehicle.position + vehicle.velocity() * VELOCITY_LINE_SECONDS,
                Color::YELLOW,
            );
        }

        let label = format!("{} pedestrians, {} index", self.crowd.len(), self.index.kind().name());
        annotator.text_at(self.path.first_point() + Vec3::new(0.0, 0.25, 0.0), &label, Color::TEXT);
    }
}

/// Neighbor lookups for one agent: index query, minus the agent itself,
/// resolved to the neighbors' current kinematic state.
struct CrowdNeighbors<'a> {
    index: &'a dyn ProximityIndex,
    token: &'a ProximityToken,
    crowd: &'a [Pedestrian],
    self_key: usize,
    keys: &'a mut Vec<usize>,
}

impl NeighborSource for CrowdNeighbors<'_> {
    fn neighbors_within(
        &mut self,
        center: Vec3,
        radius: f32,
        results: &mut Vec<VehicleState>,
    ) -> SteerResult<()> {
        self.keys.clear();
        self.index
            .find_neighbors(self.token, center, radius, self.keys)?;
        let self_key = self.self_key;
        results.extend(
            self.keys
                .iter()
                .filter(|&&key| key != self_key)
                .filter_map(|&key| self.crowd.get(key))
                .map(|agent| agent.vehicle.state()),
        );
        Ok(())
    }
}
