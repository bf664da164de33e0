/// Exit detection: a coarse brightness check in the bottom-right corner.
///
/// The player has reached the exit when both coordinates are strictly past
/// `S - EXIT_MARGIN`, and the 40×40 block at (`S-50`, `S-50`) holds at least
/// one pixel whose red channel exceeds `EXIT_BRIGHTNESS`. Only the red
/// channel is looked at, so any near-white pixel counts. This is a presence
/// test, not a goal-shape match.

use super::entity::PlayerState;
use super::raster::RasterImage;

pub const EXIT_MARGIN: u32 = 50;
pub const EXIT_SAMPLE: u32 = 40;
pub const EXIT_BRIGHTNESS: u8 = 200;

pub fn reached_exit(image: &RasterImage, player: &PlayerState) -> bool {
    let size = image.size();
    if size < EXIT_MARGIN {
        return false;
    }
    let edge = (size - EXIT_MARGIN) as i32;
    let pos = player.position;
    if pos.x <= edge || pos.y <= edge {
        return false;
    }
    exit_region_is_bright(image)
}

/// Does the exit block contain any bright pixel?
pub fn exit_region_is_bright(image: &RasterImage) -> bool {
    let size = image.size();
    let origin = size.saturating_sub(EXIT_MARGIN) as i32;
    let span = EXIT_SAMPLE.min(size);
    match image.region_at(origin, origin, span, span) {
        Ok(pixels) => pixels.iter().any(|c| c.r > EXIT_BRIGHTNESS),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Point;
    use crate::domain::raster::test_support::*;
    use crate::domain::raster::Rgb;

    fn at(x: i32, y: i32) -> PlayerState {
        PlayerState::new(Point::new(x, y), 5)
    }

    #[test]
    fn inside_bright_corner_is_exit() {
        let r = raster(canvas(800, WHITE));
        assert!(reached_exit(&r, &at(760, 760)));
        assert!(reached_exit(&r, &at(751, 799)));
    }

    #[test]
    fn boundary_is_exclusive() {
        let r = raster(canvas(800, WHITE));
        assert!(!reached_exit(&r, &at(750, 760)));
        assert!(!reached_exit(&r, &at(760, 750)));
    }

    #[test]
    fn outside_corner_is_not_exit() {
        let r = raster(canvas(800, WHITE));
        assert!(!reached_exit(&r, &at(400, 400)));
        assert!(!reached_exit(&r, &at(790, 100)));
    }

    #[test]
    fn dark_corner_is_not_exit() {
        let mut img = canvas(800, WHITE);
        fill_rect(&mut img, 740, 740, 60, 60, Rgb::new(200, 200, 200));
        let r = raster(img);
        assert!(!reached_exit(&r, &at(770, 770)));
    }

    #[test]
    fn single_bright_pixel_is_enough() {
        let mut img = canvas(800, Rgb::BLACK);
        paint(&mut img, 789, 789, Rgb::new(201, 0, 0));
        let r = raster(img);
        assert!(reached_exit(&r, &at(770, 770)));
    }

    #[test]
    fn bright_pixel_outside_sampled_block_is_ignored() {
        let mut img = canvas(800, Rgb::BLACK);
        // last 10 rows/cols of the corner are outside the 40×40 sample
        fill_rect(&mut img, 790, 790, 10, 10, WHITE);
        let r = raster(img);
        assert!(!reached_exit(&r, &at(795, 795)));
    }
}
