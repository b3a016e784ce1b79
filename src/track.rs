use std::path::Path;

use macroquad::prelude::*;
use noise::{Fbm, NoiseFn, Perlin};

use crate::config::{self, SimConfig};
use crate::error::{Result, SimError};

/// Read-only wall lookup over a fixed-size pixel grid.
///
/// Radar rays march up to the radar range from a car's centre, so `is_wall` is
/// also queried for coordinates outside `0..width` x `0..height`, including
/// negative ones. Implementations must answer those without panicking and
/// should report them as walls, otherwise rays run off the map.
pub trait BoundaryMask {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// True when the pixel at `(x, y)` is a wall. Out-of-grid pixels are walls.
    fn is_wall(&self, x: i32, y: i32) -> bool;
}

/// Row-major wall grid. Pixels outside the grid count as wall.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackMask {
    width: u32,
    height: u32,
    walls: Vec<bool>,
}

impl TrackMask {
    pub fn from_fn(width: u32, height: u32, mut is_wall: impl FnMut(u32, u32) -> bool) -> Self {
        let mut walls = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                walls.push(is_wall(x, y));
            }
        }
        Self {
            width,
            height,
            walls,
        }
    }

    /// Classify an RGBA image: exact matches of `wall_rgba` are walls.
    pub fn from_image(image: &Image, wall_rgba: [u8; 4]) -> Self {
        let width = image.width as u32;
        Self::from_fn(width, image.height as u32, |x, y| {
            let i = ((y * width + x) * 4) as usize;
            image.bytes.get(i..i + 4) == Some(&wall_rgba[..])
        })
    }

    /// Decode a track image from disk using the default wall colour.
    ///
    /// Images smaller than the default position clamp allows are rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, Image)> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Image::from_file_with_format(&bytes, None).map_err(|e| SimError::Image {
            path: path.to_path_buf(),
            message: format!("{e:?}"),
        })?;
        SimConfig::default().check_track(image.width as u32, image.height as u32)?;
        Ok((Self::from_image(&image, config::WALL_COLOR), image))
    }

    /// Render the mask back into an image: walls black, track grey.
    pub fn to_image(&self) -> Image {
        let mut bytes = Vec::with_capacity(self.walls.len() * 4);
        for &wall in &self.walls {
            if wall {
                bytes.extend_from_slice(&config::WALL_COLOR);
            } else {
                bytes.extend_from_slice(&[140, 140, 140, 255]);
            }
        }
        Image {
            bytes,
            width: self.width as u16,
            height: self.height as u16,
        }
    }
}

impl BoundaryMask for TrackMask {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_wall(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return true;
        }
        self.walls[y as usize * self.width as usize + x as usize]
    }
}

/// Where a car should begin: centre point and heading in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartPose {
    pub center: Vec2,
    pub angle: f32,
}

impl StartPose {
    /// Move the config's spawn point so the car body is centred on this pose.
    pub fn apply(&self, config: &mut SimConfig) {
        config.start_x = self.center.x - config.car_width * 0.5;
        config.start_y = self.center.y - config.car_height * 0.5;
        config.start_angle = self.angle;
    }
}

const RING_MIN_SIZE: u32 = 400;
const RING_HALF_WIDTH: f32 = 70.0;
const RING_WOBBLE: f32 = 0.08;
const WOBBLE_SAMPLES: usize = 1024;

/// Generate an elliptical ring track whose radius is perturbed by fractal noise.
///
/// The returned start pose sits on the bottom of the ring's centreline, heading +x.
pub fn generate_ring(width: u32, height: u32, seed: u32) -> Result<(TrackMask, StartPose)> {
    if width < RING_MIN_SIZE || height < RING_MIN_SIZE {
        return Err(SimError::TrackTooSmall {
            width,
            height,
            min: RING_MIN_SIZE,
        });
    }

    let fbm: Fbm<Perlin> = Fbm::new(seed);
    let wobble: Vec<f32> = (0..WOBBLE_SAMPLES)
        .map(|i| {
            let theta = i as f64 / WOBBLE_SAMPLES as f64 * std::f64::consts::TAU;
            let sample = fbm.get([theta.cos() * 1.5 + 10.0, theta.sin() * 1.5 + 10.0]) as f32;
            1.0 + RING_WOBBLE * sample.clamp(-1.0, 1.0)
        })
        .collect();
    let wobble_at = |theta: f32| {
        let t = theta.rem_euclid(std::f32::consts::TAU) / std::f32::consts::TAU;
        wobble[((t * WOBBLE_SAMPLES as f32) as usize).min(WOBBLE_SAMPLES - 1)]
    };

    let center = vec2(width as f32 * 0.5, height as f32 * 0.5);
    let rx = width as f32 * 0.38;
    let ry = height as f32 * 0.33;
    let scale = rx.min(ry);

    let mask = TrackMask::from_fn(width, height, |x, y| {
        let dx = (x as f32 - center.x) / rx;
        let dy = (y as f32 - center.y) / ry;
        let rho = (dx * dx + dy * dy).sqrt();
        let theta = dy.atan2(dx);
        (rho - wobble_at(theta)).abs() * scale > RING_HALF_WIDTH
    });

    let bottom = std::f32::consts::FRAC_PI_2;
    let start = StartPose {
        center: vec2(center.x, center.y + ry * wobble_at(bottom)),
        angle: 0.0,
    };
    Ok((mask, start))
}

/// Fold a 64-bit run seed into the 32-bit seed the noise generator takes,
/// so seeds differing only in their high bits still give different tracks.
pub fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Load the track at `path`, or generate a ring from `seed` when no path is given.
/// A generated ring also moves the config's start pose onto the ring.
pub fn load_or_generate(
    path: Option<&Path>,
    seed: u64,
    config: &mut SimConfig,
) -> Result<(TrackMask, Image)> {
    let (mask, image) = match path {
        Some(path) => TrackMask::load(path)?,
        None => {
            let (mask, start) =
                generate_ring(config::MAP_WIDTH, config::MAP_HEIGHT, noise_seed(seed))?;
            start.apply(config);
            let image = mask.to_image();
            (mask, image)
        }
    };
    config.check_track(mask.width(), mask.height())?;
    Ok((mask, image))
}
