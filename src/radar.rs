use macroquad::prelude::*;

use crate::track::BoundaryMask;

/// One distance probe: where the ray stopped and how far that is from its origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadarHit {
    pub point: (i32, i32),
    pub distance: i32,
}

/// Unit direction for a heading in degrees. Screen y grows downward, so the
/// angle is mirrored to keep positive headings counter-clockwise on screen.
#[inline]
pub fn heading_vector(degrees: f32) -> Vec2 {
    let radians = (360.0 - degrees).to_radians();
    vec2(radians.cos(), radians.sin())
}

/// March a ray one unit at a time from `origin` until it lands on a wall or
/// reaches `max_range`.
pub fn cast<M: BoundaryMask + ?Sized>(
    origin: Vec2,
    heading: f32,
    offset: f32,
    max_range: i32,
    mask: &M,
) -> RadarHit {
    let dir = heading_vector(heading + offset);
    let sample = |length: i32| {
        let p = origin + dir * length as f32;
        (p.x as i32, p.y as i32)
    };

    let mut length = 0;
    let (mut x, mut y) = sample(length);
    while !mask.is_wall(x, y) && length < max_range {
        length += 1;
        (x, y) = sample(length);
    }

    let dx = x as f32 - origin.x;
    let dy = y as f32 - origin.y;
    // Pixel truncation can push the endpoint a hair past the range.
    let distance = ((dx * dx + dy * dy).sqrt() as i32).min(max_range);

    RadarHit {
        point: (x, y),
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackMask;

    fn open(width: u32, height: u32) -> TrackMask {
        TrackMask::from_fn(width, height, |_, _| false)
    }

    #[test]
    fn heading_vector_points_right_and_up() {
        let right = heading_vector(0.0);
        assert!((right.x - 1.0).abs() < 1e-6);
        assert!(right.y.abs() < 1e-5);

        // +90 degrees turns toward negative screen y.
        let up = heading_vector(90.0);
        assert!(up.x.abs() < 1e-5);
        assert!((up.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn open_track_caps_at_max_range() {
        let mask = open(1000, 1000);
        for offset in crate::config::RADAR_OFFSETS {
            let hit = cast(vec2(500.0, 500.0), 17.0, offset, 300, &mask);
            assert!(hit.distance >= 298 && hit.distance <= 300, "{hit:?}");
        }
    }

    #[test]
    fn ray_stops_on_first_wall_pixel() {
        let mask = TrackMask::from_fn(400, 200, |x, _| x >= 150);
        let hit = cast(vec2(100.0, 100.0), 0.0, 0.0, 300, &mask);
        assert_eq!(hit.point, (150, 100));
        assert_eq!(hit.distance, 50);
    }

    #[test]
    fn origin_on_wall_has_zero_distance() {
        let mask = TrackMask::from_fn(10, 10, |_, _| true);
        let hit = cast(vec2(5.0, 5.0), 0.0, 45.0, 300, &mask);
        assert_eq!(hit.point, (5, 5));
        assert_eq!(hit.distance, 0);
    }

    #[test]
    fn grid_edge_acts_as_wall() {
        let mask = open(120, 120);
        let hit = cast(vec2(60.0, 60.0), 0.0, 90.0, 300, &mask);
        // Heading 90 points toward y = 0; the first off-grid row is y = -1.
        assert_eq!(hit.point.1, -1);
        assert_eq!(hit.distance, 61);
    }

    #[test]
    fn distance_never_exceeds_range() {
        let mask = open(2000, 2000);
        for heading in (0..360).step_by(7) {
            let hit = cast(vec2(1000.0, 1000.0), heading as f32, -45.0, 300, &mask);
            assert!((0..=300).contains(&hit.distance));
        }
    }
}
