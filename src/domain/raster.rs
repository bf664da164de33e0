/// Raster maze image and pixel sampling.
///
/// A maze has no explicit cell grid. Walls, the start marker and the exit
/// are all read back from pixel colour, so this module is the single
/// source of truth for colour classification (the same way tile
/// properties are centralised on one type rather than scattered as flags).
///
/// Collision only needs one question answered, "is this point a wall?",
/// which is the `WallOracle` seam. Anything that can answer it can stand
/// in for a raster maze.

use image::RgbaImage;

use super::entity::Point;
use crate::error::MazeError;

/// Channels strictly below this on all of r, g, b count as wall.
pub const WALL_MAX: u8 = 50;

/// Marker-red classifier thresholds.
const RED_MIN: u8 = 100;
const RED_OTHER_MAX: u8 = 100;
const RED_DOMINANCE: i16 = 50;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Near-black. Tolerates compression noise in dark wall pixels.
    pub fn is_wall(self) -> bool {
        self.r < WALL_MAX && self.g < WALL_MAX && self.b < WALL_MAX
    }

    /// Start-marker red: bright red channel that dominates both others.
    pub fn is_marker_red(self) -> bool {
        self.r > RED_MIN
            && self.g < RED_OTHER_MAX
            && self.b < RED_OTHER_MAX
            && (self.r as i16 - self.g.max(self.b) as i16) > RED_DOMINANCE
    }
}

/// Anything that can say whether a point is blocked.
pub trait WallOracle {
    fn is_wall(&self, p: Point) -> bool;
}

/// Decoded, square, read-only maze image.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn new(pixels: RgbaImage) -> Result<Self, MazeError> {
        let (width, height) = pixels.dimensions();
        if width != height || width == 0 {
            return Err(MazeError::NotSquare { width, height });
        }
        Ok(RasterImage { pixels })
    }

    /// Side length `S` in pixels.
    pub fn size(&self) -> u32 {
        self.pixels.width()
    }

    /// Underlying pixels, for rendering.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn color_at(&self, x: i32, y: i32) -> Result<Rgb, MazeError> {
        if !Point::new(x, y).in_bounds(self.size()) {
            return Err(MazeError::OutOfBounds { x, y });
        }
        let [r, g, b, _] = self.pixels.get_pixel(x as u32, y as u32).0;
        Ok(Rgb::new(r, g, b))
    }

    /// Row-major colours of a `w`×`h` block with top-left at (x, y).
    /// Fails if any part of the block leaves the canvas, matching the
    /// conservative treatment of out-of-bounds reads elsewhere.
    pub fn region_at(&self, x: i32, y: i32, w: u32, h: u32) -> Result<Vec<Rgb>, MazeError> {
        if w == 0 || h == 0 {
            return Ok(Vec::new());
        }
        let far_x = x as i64 + w as i64 - 1;
        let far_y = y as i64 + h as i64 - 1;
        let size = self.size() as i64;
        if x < 0 || y < 0 {
            return Err(MazeError::OutOfBounds { x, y });
        }
        if far_x >= size || far_y >= size {
            return Err(MazeError::OutOfBounds {
                x: far_x.min(i32::MAX as i64) as i32,
                y: far_y.min(i32::MAX as i64) as i32,
            });
        }

        let mut out = Vec::with_capacity((w * h) as usize);
        for py in y as u32..y as u32 + h {
            for px in x as u32..x as u32 + w {
                let [r, g, b, _] = self.pixels.get_pixel(px, py).0;
                out.push(Rgb::new(r, g, b));
            }
        }
        Ok(out)
    }
}

impl WallOracle for RasterImage {
    /// Off-canvas reads are walls.
    fn is_wall(&self, p: Point) -> bool {
        self.color_at(p.x, p.y).map(Rgb::is_wall).unwrap_or(true)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{Rgba, RgbaImage};

    use super::{RasterImage, Rgb};

    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Solid canvas of one colour.
    pub fn canvas(size: u32, fill: Rgb) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([fill.r, fill.g, fill.b, 255]))
    }

    pub fn paint(img: &mut RgbaImage, x: u32, y: u32, c: Rgb) {
        img.put_pixel(x, y, Rgba([c.r, c.g, c.b, 255]));
    }

    /// Axis-aligned filled rectangle, clipped to the canvas.
    pub fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, c: Rgb) {
        for py in y..(y + h).min(img.height()) {
            for px in x..(x + w).min(img.width()) {
                paint(img, px, py, c);
            }
        }
    }

    /// Filled disc: every pixel with dx² + dy² <= r².
    pub fn fill_disc(img: &mut RgbaImage, cx: i32, cy: i32, r: i32, c: Rgb) {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r
                    && x >= 0 && y >= 0
                    && (x as u32) < img.width() && (y as u32) < img.height()
                {
                    paint(img, x as u32, y as u32, c);
                }
            }
        }
    }

    pub fn raster(img: RgbaImage) -> RasterImage {
        RasterImage::new(img).unwrap()
    }
}
