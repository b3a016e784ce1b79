use macroquad::prelude::*;

use crate::collision;
use crate::config::{SimConfig, CORNER_OFFSETS, NUM_RADARS, RADAR_OFFSETS};
use crate::policy::{Action, SensorVector};
use crate::radar::{self, heading_vector, RadarHit};
use crate::track::BoundaryMask;

/// One simulated car. Alive until a corner touches a wall, then frozen for good.
#[derive(Clone, Debug)]
pub struct CarAgent {
    position: Vec2,
    angle: f32,
    speed: f32,
    speed_set: bool,
    center: Vec2,
    corners: [Vec2; 4],
    radars: Vec<RadarHit>,
    alive: bool,
    distance_traveled: f32,
    ticks_alive: u32,
    params: SimConfig,
    map_size: Vec2,
}

impl CarAgent {
    /// Spawn at the config's start pose on a map of the given extents.
    pub fn new(params: SimConfig, map_width: u32, map_height: u32) -> Self {
        let position = vec2(params.start_x, params.start_y);
        let center = position + vec2(params.car_width, params.car_height) * 0.5;
        let mut car = Self {
            position,
            angle: params.start_angle,
            speed: 0.0,
            speed_set: false,
            center,
            corners: [center; 4],
            radars: Vec::with_capacity(NUM_RADARS),
            alive: true,
            distance_traveled: 0.0,
            ticks_alive: 0,
            params,
            map_size: vec2(map_width as f32, map_height as f32),
        };
        car.corners = car.compute_corners();
        car
    }

    pub fn apply_action(&mut self, action: Action) {
        if !self.alive {
            return;
        }
        match action {
            Action::TurnLeft => self.angle += self.params.turn_step,
            Action::TurnRight => self.angle -= self.params.turn_step,
            Action::Slow => {
                if self.speed - self.params.speed_step >= self.params.min_speed {
                    self.speed -= self.params.speed_step;
                }
            }
            Action::SpeedUp => self.speed += self.params.speed_step,
        }
    }

    /// Advance one tick: move, clamp, rebuild geometry, test collision, re-cast radars.
    pub fn update<M: BoundaryMask + ?Sized>(&mut self, mask: &M) {
        if !self.alive {
            return;
        }
        if !self.speed_set {
            self.speed = self.params.default_speed;
            self.speed_set = true;
        }

        let dir = heading_vector(self.angle);
        let lo = self.params.edge_margin_min;
        let hi = self.map_size - Vec2::splat(self.params.edge_margin_max);
        self.position.x = (self.position.x + dir.x * self.speed).max(lo).min(hi.x);
        self.position.y = (self.position.y + dir.y * self.speed).max(lo).min(hi.y);

        self.distance_traveled += self.speed;
        self.ticks_alive += 1;

        self.center = vec2(
            self.position.x.trunc() + self.params.car_width * 0.5,
            self.position.y.trunc() + self.params.car_height * 0.5,
        );
        self.corners = self.compute_corners();

        self.alive = collision::check_alive(&self.corners, mask);
        self.radars.clear();
        if !self.alive {
            return;
        }

        for offset in RADAR_OFFSETS {
            let hit = radar::cast(self.center, self.angle, offset, self.params.radar_range, mask);
            self.radars.push(hit);
        }
    }

    fn compute_corners(&self) -> [Vec2; 4] {
        let reach = self.params.corner_reach();
        CORNER_OFFSETS.map(|offset| self.center + heading_vector(self.angle + offset) * reach)
    }

    /// Radar distances divided down to coarse integers, zero where no reading exists.
    pub fn sense_vector(&self) -> SensorVector {
        let mut values = [0; NUM_RADARS];
        for (slot, hit) in values.iter_mut().zip(&self.radars) {
            *slot = hit.distance / self.params.sensor_scale;
        }
        values
    }

    pub fn fitness(&self) -> f64 {
        self.distance_traveled as f64 / (self.params.car_width as f64 / 2.0)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn corners(&self) -> &[Vec2; 4] {
        &self.corners
    }

    pub fn radars(&self) -> &[RadarHit] {
        &self.radars
    }

    pub fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    pub fn ticks_alive(&self) -> u32 {
        self.ticks_alive
    }
}
