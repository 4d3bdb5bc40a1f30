use wasm_bindgen::prelude::*;

pub mod annotation;
pub mod clock;
pub mod config;
pub mod error;
pub mod math;
pub mod obstacle;
pub mod path;
pub mod pedestrian;
pub mod proximity;
pub mod random;
pub mod simulation;
pub mod steering;
pub mod vehicle;

pub use config::{SimConfig, PRESET_NAMES};
pub use error::{SteerError, SteerResult};
pub use math::Vec3;
pub use proximity::IndexKind;
pub use simulation::Simulation;
pub use steering::PathFollowingMode;

#[wasm_bindgen]
pub struct Sim {
    simulation: Simulation,
    positions: Vec<f32>,
}

#[wasm_bindgen]
impl Sim {
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32) -> Result<Sim, JsError> {
        let mut config = SimConfig::preset("pedestrians")?;
        config.population = count;
        config.seed = Some(u64::from(seed));
        Ok(Sim {
            simulation: Simulation::new(config)?,
            positions: Vec::new(),
        })
    }

    pub fn step(&mut self, dt: f32) -> Result<(), JsError> {
        self.simulation.tick(dt)?;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.simulation.len()
    }

    pub fn add_agent(&mut self) -> usize {
        self.simulation.add_agent()
    }

    /// Returns false when there was nobody left to remove.
    pub fn remove_agent(&mut self) -> Result<bool, JsError> {
        Ok(self.simulation.remove_agent()?.is_some())
    }

    pub fn cycle_index(&mut self) -> Result<(), JsError> {
        self.simulation.cycle_index()?;
        Ok(())
    }

    /// Returns true when the crowd is now in stay-on-path mode.
    pub fn toggle_path_following(&mut self) -> bool {
        self.simulation.toggle_path_following_mode() == PathFollowingMode::StayOnPath
    }

    pub fn toggle_wander(&mut self) -> bool {
        self.simulation.toggle_wander()
    }

    /// Flat x, y, z positions in agent order.
    pub fn positions(&mut self) -> Vec<f32> {
        self.simulation.write_positions(&mut self.positions);
        self.positions.clone()
    }

    pub fn index_name(&self) -> String {
        self.simulation.index_kind().name().to_string()
    }
}
