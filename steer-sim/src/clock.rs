use crate::error::{SteerError, SteerResult};
use crate::math::clamp_finite;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// When set, every unpaused update advances simulation time by exactly
    /// this many seconds regardless of the real frame time.
    pub fixed_step: Option<f32>,
    /// Upper bound on one variable step, so a stalled host does not make
    /// agents jump.
    pub max_elapsed: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_step: None,
            max_elapsed: 0.1,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> SteerResult<()> {
        if !(self.max_elapsed.is_finite() && self.max_elapsed > 0.0) {
            return Err(SteerError::InvalidConfig {
                reason: format!("clock max_elapsed must be positive, got {}", self.max_elapsed),
            });
        }
        if let Some(step) = self.fixed_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(SteerError::InvalidConfig {
                    reason: format!("clock fixed_step must be positive, got {step}"),
                });
            }
        }
        Ok(())
    }
}

/// Host-driven simulation clock. The host reports real frame time through
/// [`Clock::update`]; the clock decides how much simulation time passes.
#[derive(Clone, Debug, PartialEq)]
pub struct Clock {
    config: ClockConfig,
    paused: bool,
    pending_manual_step: Option<f32>,
    total_real_time: f32,
    total_paused_time: f32,
    total_simulation_time: f32,
    elapsed_real_time: f32,
    elapsed_simulation_time: f32,
}

impl Clock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            paused: false,
            pending_manual_step: None,
            total_real_time: 0.0,
            total_paused_time: 0.0,
            total_simulation_time: 0.0,
            elapsed_real_time: 0.0,
            elapsed_simulation_time: 0.0,
        }
    }

    /// Advances the clock by one host frame and returns the simulation
    /// time that elapsed during it (zero while paused).
    pub fn update(&mut self, real_elapsed: f32) -> f32 {
        if !(real_elapsed.is_finite() && real_elapsed >= 0.0) {
            log::warn!("ignoring invalid frame time {real_elapsed}");
        }
        let real = clamp_finite(real_elapsed, 0.0, f32::MAX, 0.0);
        self.elapsed_real_time = real;
        self.total_real_time += real;

        self.elapsed_simulation_time = if let Some(step) = self.pending_manual_step.take() {
            step
        } else if self.paused {
            self.total_paused_time += real;
            0.0
        } else {
            match self.config.fixed_step {
                Some(step) => step,
                None => real.min(self.config.max_elapsed),
            }
        };
        self.total_simulation_time += self.elapsed_simulation_time;
        self.elapsed_simulation_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Forces the next update to advance simulation time by `seconds`,
    /// even while paused. Used for single-stepping.
    pub fn advance_simulation_time(&mut self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.pending_manual_step = Some(seconds);
        }
    }

    pub fn total_real_time(&self) -> f32 {
        self.total_real_time
    }

    pub fn total_paused_time(&self) -> f32 {
        self.total_paused_time
    }

    pub fn total_simulation_time(&self) -> f32 {
        self.total_simulation_time
    }

    pub fn elapsed_real_time(&self) -> f32 {
        self.elapsed_real_time
    }

    pub fn elapsed_simulation_time(&self) -> f32 {
        self.elapsed_simulation_time
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}
