// All tunable simulation constants in one place.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// Track
pub const MAP_WIDTH: u32 = 1920;
pub const MAP_HEIGHT: u32 = 1080;
pub const WALL_COLOR: [u8; 4] = [0, 0, 0, 255];

// Car body
pub const CAR_WIDTH: f32 = 60.0;
pub const CAR_HEIGHT: f32 = 60.0;
pub const START_X: f32 = 830.0;
pub const START_Y: f32 = 920.0;
pub const START_ANGLE: f32 = 0.0;

// Kinematics
pub const DEFAULT_SPEED: f32 = 20.0;
pub const MIN_SPEED: f32 = 12.0;
pub const SPEED_STEP: f32 = 2.0;
pub const TURN_STEP: f32 = 10.0;

// Position clamp: [EDGE_MARGIN_MIN, extent - EDGE_MARGIN_MAX] on both axes.
pub const EDGE_MARGIN_MIN: f32 = 20.0;
pub const EDGE_MARGIN_MAX: f32 = 120.0;

// Sensors
pub const NUM_RADARS: usize = 5;
pub const RADAR_OFFSETS: [f32; NUM_RADARS] = [-90.0, -45.0, 0.0, 45.0, 90.0];
pub const RADAR_MAX_RANGE: i32 = 300;
pub const SENSOR_SCALE: i32 = 30;

// Corner diagonals relative to heading, in degrees.
pub const CORNER_OFFSETS: [f32; 4] = [30.0, 150.0, 210.0, 330.0];

// Generation
pub const TICK_BUDGET: u32 = 30 * 40;

// Policy network
pub const NUM_ACTIONS: usize = 4;
pub const HIDDEN_NEURONS: usize = 6;

// Evolution
pub const POPULATION_SIZE: usize = 30;
pub const ELITE_FRACTION: f32 = 0.2;
pub const TOURNAMENT_SIZE: usize = 3;
pub const MUTATION_RATE: f32 = 0.1;
pub const MUTATION_SIGMA: f32 = 0.15;

/// Shared per-generation configuration handed to the evaluator.
///
/// Every field falls back to the constant above when missing from a JSON file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub car_width: f32,
    pub car_height: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub start_angle: f32,
    pub default_speed: f32,
    pub min_speed: f32,
    pub speed_step: f32,
    pub turn_step: f32,
    pub edge_margin_min: f32,
    pub edge_margin_max: f32,
    pub radar_range: i32,
    pub sensor_scale: i32,
    pub tick_budget: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            car_width: CAR_WIDTH,
            car_height: CAR_HEIGHT,
            start_x: START_X,
            start_y: START_Y,
            start_angle: START_ANGLE,
            default_speed: DEFAULT_SPEED,
            min_speed: MIN_SPEED,
            speed_step: SPEED_STEP,
            turn_step: TURN_STEP,
            edge_margin_min: EDGE_MARGIN_MIN,
            edge_margin_max: EDGE_MARGIN_MAX,
            radar_range: RADAR_MAX_RANGE,
            sensor_scale: SENSOR_SCALE,
            tick_budget: TICK_BUDGET,
        }
    }
}

impl SimConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.car_width > 0.0 && self.car_height > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "car size must be positive, got {}x{}",
                self.car_width, self.car_height
            )));
        }
        if self.sensor_scale <= 0 {
            return Err(SimError::InvalidConfig(format!(
                "sensor_scale must be positive, got {}",
                self.sensor_scale
            )));
        }
        if self.radar_range < 0 {
            return Err(SimError::InvalidConfig(format!(
                "radar_range must not be negative, got {}",
                self.radar_range
            )));
        }
        if self.tick_budget == 0 {
            return Err(SimError::InvalidConfig("tick_budget must be at least 1".into()));
        }
        if !(self.edge_margin_min >= 0.0 && self.edge_margin_max >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "edge margins must not be negative, got {}/{}",
                self.edge_margin_min, self.edge_margin_max
            )));
        }
        if self.min_speed > self.default_speed {
            return Err(SimError::InvalidConfig(format!(
                "min_speed {} exceeds default_speed {}",
                self.min_speed, self.default_speed
            )));
        }
        Ok(())
    }

    /// Smallest map extent on which the position clamp `[min, extent - max]` is non-empty.
    pub fn min_track_extent(&self) -> u32 {
        (self.edge_margin_min + self.edge_margin_max).ceil() as u32
    }

    /// Reject maps too small for the position clamp on either axis.
    pub fn check_track(&self, width: u32, height: u32) -> Result<()> {
        let min = self.min_track_extent();
        if width < min || height < min {
            return Err(SimError::TrackTooSmall { width, height, min });
        }
        Ok(())
    }

    /// Distance from the car centre to each collision corner.
    pub fn corner_reach(&self) -> f32 {
        0.5 * self.car_width
    }
}
