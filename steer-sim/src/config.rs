use crate::clock::ClockConfig;
use crate::error::{SteerError, SteerResult};
use crate::math::Vec3;
use crate::obstacle::SphericalObstacle;
use crate::path::PolylinePath;
use crate::proximity::{IndexKind, LatticeConfig};
use crate::steering::{PathFollowingMode, SteeringConfig};
use crate::vehicle::VehicleLimits;
use serde::{Deserialize, Serialize};

pub const PRESET_NAMES: &[&str] = &["pedestrians", "pedestrian-pair"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    pub points: Vec<Vec3>,
    pub radius: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            points: crossing_path_points().to_vec(),
            radius: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub population: usize,
    /// `None` seeds the random source from OS entropy.
    pub seed: Option<u64>,
    pub index: IndexKind,
    pub lattice: LatticeConfig,
    pub path: PathConfig,
    pub obstacles: Vec<ObstacleConfig>,
    pub vehicle: VehicleLimits,
    pub steering: SteeringConfig,
    pub path_following: PathFollowingMode,
    pub wander_enabled: bool,
    pub clock: ClockConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        let points = crossing_path_points();
        Self {
            population: 100,
            seed: None,
            index: IndexKind::default(),
            lattice: LatticeConfig::default(),
            path: PathConfig::default(),
            obstacles: vec![
                ObstacleConfig {
                    center: Vec3::interpolate(0.2, points[0], points[1]),
                    radius: 3.0,
                },
                ObstacleConfig {
                    center: Vec3::interpolate(0.5, points[2], points[3]),
                    radius: 5.0,
                },
            ],
            vehicle: VehicleLimits::default(),
            steering: SteeringConfig::default(),
            path_following: PathFollowingMode::default(),
            wander_enabled: true,
            clock: ClockConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parses a TOML document. Missing tables and fields take their
    /// defaults; the result is validated before it is returned.
    pub fn from_toml_str(source: &str) -> SteerResult<Self> {
        let config: SimConfig = toml::from_str(source)?;
        config.validate()?;
        log::debug!(
            "loaded config: {} agents, {} index, {} waypoints, {} obstacles",
            config.population,
            config.index.name(),
            config.path.points.len(),
            config.obstacles.len()
        );
        Ok(config)
    }

    pub fn preset(name: &str) -> SteerResult<Self> {
        let config = match name {
            "pedestrians" => Self::default(),
            "pedestrian-pair" => Self {
                population: 2,
                path: PathConfig {
                    points: vec![Vec3::new(0.0, 0.0, -20.0), Vec3::new(0.0, 0.0, 20.0)],
                    radius: 2.0,
                },
                obstacles: Vec::new(),
                wander_enabled: false,
                ..Self::default()
            },
            _ => {
                return Err(SteerError::UnknownPreset {
                    name: name.to_string(),
                })
            }
        };
        log::debug!("using preset {name}");
        Ok(config)
    }

    pub fn validate(&self) -> SteerResult<()> {
        self.build_path()?;
        self.build_obstacles()?;
        self.lattice.validate()?;
        self.clock.validate()?;

        let limits = &self.vehicle;
        let limits_ok = [limits.max_speed, limits.max_force, limits.radius, limits.mass]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !limits_ok {
            return Err(SteerError::InvalidConfig {
                reason: format!("vehicle limits must be positive, got {limits:?}"),
            });
        }

        let steering = &self.steering;
        if !(0.0..=1.0).contains(&steering.leak_through) {
            return Err(SteerError::InvalidConfig {
                reason: format!(
                    "leak_through must lie in [0, 1], got {}",
                    steering.leak_through
                ),
            });
        }
        let lookaheads = [
            steering.obstacle_lookahead,
            steering.neighbor_lookahead,
            steering.path_lookahead,
            steering.wander_rate,
        ];
        if lookaheads.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(SteerError::InvalidConfig {
                reason: format!("steering times and rates must be non-negative, got {steering:?}"),
            });
        }
        Ok(())
    }

    pub fn build_path(&self) -> SteerResult<PolylinePath> {
        PolylinePath::new(self.path.points.clone(), self.path.radius)
    }

    pub fn build_obstacles(&self) -> SteerResult<Vec<SphericalObstacle>> {
        self.obstacles
            .iter()
            .map(|o| SphericalObstacle::new(o.center, o.radius))
            .collect()
    }
}

/// Seven-waypoint path that crosses itself twice, laid out on the ground
/// plane:
///
/// ```text
///        f      b
///        |\    /\
///        | \  /  \
///        |  \/    \
///        |  /\     \
///        | /  \     c
///        |/    \g  /
///        /        /
///       /|       /
///      / |______/
///     /  e      d
///   a/
/// ```
fn crossing_path_points() -> [Vec3; 7] {
    let size = 30.0;
    let top = 2.0 * size;
    let gap = 1.2 * size;
    let out = 2.0 * size;
    let h = 0.5;
    [
        Vec3::new(h + gap - out, 0.0, h + top - out),
        Vec3::new(h + gap, 0.0, h + top),
        Vec3::new(h + gap + top / 2.0, 0.0, h + top / 2.0),
        Vec3::new(h + gap, 0.0, h),
        Vec3::new(h, 0.0, h),
        Vec3::new(h, 0.0, h + top),
        Vec3::new(h + gap, 0.0, h + top / 2.0),
    ]
}
