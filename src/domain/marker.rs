/// Start-marker location.
///
/// ## Heuristic
///
/// The marker is a roughly circular blob of marker-red pixels
/// (see `Rgb::is_marker_red`). It is found with a first-match scan:
///
///   1. Walk the image row-major from (0, 0).
///   2. At each red pixel, probe outward: for radius 1..=20, sample the
///      8 compass points at 45° steps. A ring is accepted when every
///      in-canvas probe point is red. Probe points that land off the
///      canvas are skipped.
///   3. The first rejected ring stops probing. The radius is the last
///      accepted ring.
///   4. The first pixel with radius > 0 wins and the scan stops, even if a
///      bigger marker appears later in scan order.
///
/// This is an approximate real-time heuristic, not a circle fit. For a
/// solid disc the winning pixel is the first one (top rows, leftmost) whose
/// radius-1 ring is fully red, not the geometric centre. Maze assets are
/// authored against exactly these thresholds, so they must not drift.

use std::f64::consts::FRAC_PI_4;

use super::entity::Point;
use super::raster::RasterImage;
use crate::error::MazeError;

/// Largest ring probed.
pub const MAX_PROBE_RADIUS: u32 = 20;

/// Fallback when no marker is found.
pub const DEFAULT_START: Point = Point::new(30, 30);
pub const DEFAULT_RADIUS: u32 = 5;

const PROBE_ANGLES: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Marker {
    pub center: Point,
    pub radius: u32,
}

impl Marker {
    pub fn fallback() -> Self {
        Marker { center: DEFAULT_START, radius: DEFAULT_RADIUS }
    }
}

/// Scan `image` for the start marker.
pub fn locate_marker(image: &RasterImage) -> Result<Marker, MazeError> {
    let size = image.size() as i32;
    for y in 0..size {
        for x in 0..size {
            if !is_red(image, x, y) {
                continue;
            }
            let radius = probe_radius(image, Point::new(x, y));
            if radius > 0 {
                return Ok(Marker { center: Point::new(x, y), radius });
            }
        }
    }
    Err(MazeError::MarkerNotFound)
}

/// Largest fully-red ring around `center`, capped at `MAX_PROBE_RADIUS`.
fn probe_radius(image: &RasterImage, center: Point) -> u32 {
    let size = image.size();
    let mut accepted = 0;
    for radius in 1..=MAX_PROBE_RADIUS {
        let ring_ok = ring_points(center, radius)
            .filter(|p| p.in_bounds(size))
            .all(|p| is_red(image, p.x, p.y));
        if !ring_ok {
            break;
        }
        accepted = radius;
    }
    accepted
}

/// The 8 probe points at `radius`, starting at angle 0 and turning
/// clockwise in image space (y down).
pub fn ring_points(center: Point, radius: u32) -> impl Iterator<Item = Point> {
    let r = radius as f64;
    (0..PROBE_ANGLES).map(move |i| {
        let angle = i as f64 * FRAC_PI_4;
        Point::new(
            round_half_up(center.x as f64 + r * angle.cos()),
            round_half_up(center.y as f64 + r * angle.sin()),
        )
    })
}

/// Halves round toward +∞ (asset compatibility; `f64::round` goes away from zero).
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

fn is_red(image: &RasterImage, x: i32, y: i32) -> bool {
    image.color_at(x, y).map(|c| c.is_marker_red()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::raster::test_support::*;
    use crate::domain::raster::Rgb;

    const RED: Rgb = Rgb::new(200, 0, 0);

    /// Paint the centre plus every probe point for radius 1..=r, i.e. an
    /// 8-armed star that the probe accepts exactly up to `r`.
    fn paint_star(img: &mut image::RgbaImage, c: Point, r: u32) {
        paint(img, c.x as u32, c.y as u32, RED);
        for radius in 1..=r {
            for p in ring_points(c, radius) {
                paint(img, p.x as u32, p.y as u32, RED);
            }
        }
    }

    #[test]
    fn ring_points_cover_compass_directions() {
        let pts: Vec<Point> = ring_points(Point::new(100, 100), 8).collect();
        assert_eq!(pts.len(), 8);
        assert_eq!(pts[0], Point::new(108, 100));
        assert_eq!(pts[1], Point::new(106, 106));
        assert_eq!(pts[2], Point::new(100, 108));
        assert_eq!(pts[4], Point::new(92, 100));
        assert_eq!(pts[6], Point::new(100, 92));
    }

    #[test]
    fn star_marker_reports_centre_and_radius() {
        let mut img = canvas(800, WHITE);
        paint_star(&mut img, Point::new(100, 100), 8);
        let m = locate_marker(&raster(img)).unwrap();
        assert_eq!(m.center, Point::new(100, 100));
        assert_eq!(m.radius, 8);
    }

    #[test]
    fn disc_marker_wins_at_first_fully_ringed_pixel() {
        // Disc of radius 8 at (100,100): the first pixel in scan order whose
        // radius-1 ring is all red sits near the top-left of the disc.
        let mut img = canvas(800, WHITE);
        fill_disc(&mut img, 100, 100, 8, RED);
        let m = locate_marker(&raster(img)).unwrap();
        assert_eq!(m.center, Point::new(98, 94));
        assert_eq!(m.radius, 1);
        assert!(m.radius <= 8);
    }

    #[test]
    fn first_match_beats_larger_marker_later() {
        let mut img = canvas(800, WHITE);
        paint_star(&mut img, Point::new(400, 50), 3);
        paint_star(&mut img, Point::new(100, 300), 15);
        let m = locate_marker(&raster(img)).unwrap();
        assert_eq!(m.center, Point::new(400, 50));
        assert_eq!(m.radius, 3);
    }

    #[test]
    fn radius_is_capped() {
        let img = canvas(64, RED);
        let m = locate_marker(&raster(img)).unwrap();
        // (0,0) wins: off-canvas probe points are skipped, the rest are red.
        assert_eq!(m.center, Point::new(0, 0));
        assert_eq!(m.radius, MAX_PROBE_RADIUS);
    }

    #[test]
    fn isolated_red_pixel_is_not_a_marker() {
        let mut img = canvas(50, WHITE);
        paint(&mut img, 10, 10, RED);
        assert!(matches!(locate_marker(&raster(img)), Err(MazeError::MarkerNotFound)));
    }

    #[test]
    fn no_red_reports_not_found() {
        let img = canvas(50, Rgb::BLACK);
        assert!(matches!(locate_marker(&raster(img)), Err(MazeError::MarkerNotFound)));
    }

    #[test]
    fn dark_red_is_ignored() {
        let mut img = canvas(200, WHITE);
        fill_disc(&mut img, 50, 50, 10, Rgb::new(90, 0, 0));
        assert!(locate_marker(&raster(img)).is_err());
    }

    #[test]
    fn locating_is_deterministic() {
        let mut img = canvas(300, WHITE);
        fill_disc(&mut img, 150, 120, 12, RED);
        let r = raster(img);
        let a = locate_marker(&r).unwrap();
        let b = locate_marker(&r).unwrap();
        assert_eq!(a, b);
    }
}
