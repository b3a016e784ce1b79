use macroquad::prelude::*;

use crate::track::BoundaryMask;

/// Point-sample each corner against the mask. Any corner on a wall pixel means dead.
///
/// Thin walls that slip between two corners are not detected.
pub fn check_alive<M: BoundaryMask + ?Sized>(corners: &[Vec2; 4], mask: &M) -> bool {
    corners
        .iter()
        .all(|corner| !mask.is_wall(corner.x as i32, corner.y as i32))
}
