/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The maze canvas is far larger than any terminal, so it is shown
/// downsampled: each terminal cell is one `▀` glyph whose foreground is the
/// upper block of pixels and whose background is the lower block. A block
/// that contains any wall pixel is drawn as wall so thin walls survive the
/// reduction. The right-hand panel carries progress, status and help.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::raster::{RasterImage, Rgb};
use crate::sim::progress::{MazeIndex, MazeStatus};
use crate::sim::session::SessionState;
use crate::sim::world::World;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, also used
    /// for `Clear` so inter-row gaps match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).as_str().to_string()).collect()
    }
}

// ── Downsampled maze ──

/// Canvas reduced to `side`×`side` blocks of `scale`×`scale` pixels.
struct MapCache {
    maze: MazeIndex,
    scale: u32,
    side: usize,
    blocks: Vec<Rgb>,
}

impl MapCache {
    fn build(maze: MazeIndex, image: &RasterImage, scale: u32) -> Self {
        let size = image.size();
        let scale = scale.max(1);
        let side = size.div_ceil(scale) as usize;
        let pixels = image.pixels();
        let mut blocks = Vec::with_capacity(side * side);

        for by in 0..side as u32 {
            for bx in 0..side as u32 {
                let (x0, y0) = (bx * scale, by * scale);
                let (x1, y1) = ((x0 + scale).min(size), (y0 + scale).min(size));
                let mut sum = [0u32; 3];
                let mut wall = false;
                let mut red = false;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let [r, g, b, _] = pixels.get_pixel(x, y).0;
                        let c = Rgb::new(r, g, b);
                        wall |= c.is_wall();
                        red |= c.is_marker_red();
                        sum[0] += r as u32;
                        sum[1] += g as u32;
                        sum[2] += b as u32;
                    }
                }
                let n = (x1 - x0) * (y1 - y0);
                blocks.push(if wall {
                    Rgb::BLACK
                } else if red {
                    MARKER_RED
                } else {
                    Rgb::new((sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8)
                });
            }
        }
        MapCache { maze, scale, side, blocks }
    }

    fn block(&self, bx: usize, by: usize) -> Option<Rgb> {
        (bx < self.side && by < self.side).then(|| self.blocks[by * self.side + bx])
    }
}

const MARKER_RED: Rgb = Rgb::new(230, 30, 30);
const PATH_COLOR: Color = Color::Rgb { r: 70, g: 150, b: 255 };
const PLAYER_COLOR: Color = Color::Rgb { r: 255, g: 220, b: 50 };

fn to_color(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

// ── Renderer ──

const HEADER_ROW: usize = 0;
const MAP_ROW: usize = 1;
const PANEL_W: usize = 30;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    map: Option<MapCache>,
    last_reveal: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            map: None,
            last_reveal: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &World) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Reward screen toggled → clear for clean transition
        if self.last_reveal != world.reveal {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_reveal = world.reveal;
        }

        self.compose(world);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn compose(&mut self, world: &World) {
        self.front.clear();
        let map_cols = self.compose_map(world);
        self.compose_panel(world, map_cols + 2);
        if world.reveal {
            self.compose_reveal(world);
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at start of frame; ResetColor would fall back
        // to the terminal's own default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    /// Draw the maze, path and player. Returns the columns used.
    fn compose_map(&mut self, w: &World) -> usize {
        let title = match w.session.maze() {
            Some(index) => format!(" Maze {index} "),
            None => " Pixel Maze ".to_string(),
        };
        self.front.put_str(1, HEADER_ROW, &title, PLAYER_COLOR, Color::Reset);

        let Some(image) = w.session.image() else {
            self.front.put_str(2, MAP_ROW + 1, "No maze loaded", Color::DarkGrey, Color::Reset);
            return 20;
        };
        let Some(maze) = w.session.maze() else {
            return 20;
        };
        let size = image.size();

        let avail_cols = self.front.width.saturating_sub(PANEL_W + 2).max(1);
        let avail_rows = self.front.height.saturating_sub(MAP_ROW + 1).max(1);
        let fit = avail_cols.min(avail_rows * 2).max(1) as u32;
        let scale = size.div_ceil(fit).max(1);

        let stale = self.map.as_ref().map_or(true, |m| m.maze != maze || m.scale != scale);
        if stale {
            log::debug!("rebuilding map for maze {maze} at 1/{scale}");
            self.map = Some(MapCache::build(maze, image, scale));
        }
        let Some(map) = self.map.as_ref() else {
            return 20;
        };
        let side = map.side;

        // Block colours, then path and player on top
        let mut colors: Vec<Color> = map.blocks.iter().map(|&c| to_color(c)).collect();
        let block_of = |x: i32, y: i32| -> Option<usize> {
            if x < 0 || y < 0 {
                return None;
            }
            let (bx, by) = (x as u32 / scale, y as u32 / scale);
            map.block(bx as usize, by as usize).map(|_| by as usize * side + bx as usize)
        };
        for p in w.session.path() {
            if let Some(i) = block_of(p.x, p.y) {
                colors[i] = PATH_COLOR;
            }
        }
        let player = w.session.player();
        let r = (player.marker_radius / scale) as i32;
        let (pbx, pby) = (player.position.x / scale as i32, player.position.y / scale as i32);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let (bx, by) = (pbx + dx, pby + dy);
                if bx >= 0 && by >= 0 && (bx as usize) < side && (by as usize) < side {
                    colors[by as usize * side + bx as usize] = PLAYER_COLOR;
                }
            }
        }

        for row in 0..side.div_ceil(2) {
            for col in 0..side {
                let top = colors[2 * row * side + col];
                let bottom = if 2 * row + 1 < side {
                    colors[(2 * row + 1) * side + col]
                } else {
                    Cell::BASE_BG
                };
                self.front.set(1 + col, MAP_ROW + row, Cell::from_char('▀', top, bottom));
            }
        }
        side + 1
    }

    fn compose_panel(&mut self, w: &World, x: usize) {
        let hdr = Color::Rgb { r: 255, g: 200, b: 50 };
        let dim = Color::DarkGrey;
        let desc = Color::Rgb { r: 180, g: 180, b: 180 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };

        self.front.put_str(x, HEADER_ROW, "╔══════════════════════╗", hdr, Color::Reset);
        self.front.put_str(x, HEADER_ROW + 1, "║      PIXEL MAZE      ║", hdr, Color::Reset);
        self.front.put_str(x, HEADER_ROW + 2, "╚══════════════════════╝", hdr, Color::Reset);

        // Progress list
        let mut row = HEADER_ROW + 4;
        let progress = w.progress.state();
        let summary = format!("Unlocked {}/{}", progress.highest_unlocked, w.progress.max_index());
        self.front.put_str(x, row, &summary, desc, Color::Reset);
        row += 1;
        for (index, status) in w.progress.statuses() {
            let (icon, fg) = match status {
                MazeStatus::Current => ('▶', Color::Rgb { r: 80, g: 255, b: 80 }),
                MazeStatus::Completed => ('✓', Color::Rgb { r: 80, g: 180, b: 80 }),
                MazeStatus::Unlocked => ('○', Color::White),
                MazeStatus::Locked => ('✕', dim),
            };
            let label = if status == MazeStatus::Locked {
                format!(" {icon} Maze {index}  locked")
            } else {
                format!(" {icon} Maze {index}")
            };
            self.front.put_str(x, row, &label, fg, Color::Reset);
            row += 1;
        }

        // Session status
        row += 1;
        let player = w.session.player();
        let pos = format!("Pos   {:>4},{:<4}", player.position.x, player.position.y);
        let moves = format!("Moves {}", w.session.path().len());
        self.front.put_str(x, row, &pos, desc, Color::Reset);
        self.front.put_str(x, row + 1, &moves, desc, Color::Reset);
        let (status, fg) = match w.session.state() {
            SessionState::Idle => ("Waiting".to_string(), dim),
            SessionState::Loading => {
                const SPIN: [char; 4] = ['|', '/', '-', '\\'];
                let spin = SPIN[(w.anim_tick / 6) as usize % SPIN.len()];
                let index = w.session.pending_maze().unwrap_or(progress.current);
                (format!("Loading maze {index} {spin}"), key_c)
            }
            SessionState::Ready => ("Find the exit!".to_string(), Color::White),
            SessionState::Completed => ("Exit reached!".to_string(), Color::Rgb { r: 80, g: 255, b: 80 }),
        };
        self.front.put_str(x, row + 2, &status, fg, Color::Reset);

        // Message + help anchored to the bottom
        let help = [
            "WASD/←↑→↓ Move   R Reset",
            "1-9 Select maze  Q Quit",
        ];
        let help_top = self.front.height.saturating_sub(help.len());
        for (i, line) in help.iter().enumerate() {
            self.front.put_str(x, help_top + i, line, key_c, Color::Reset);
        }
        if !w.message.is_empty() && help_top >= 2 {
            let max = self.front.width.saturating_sub(x);
            let msg: String = w.message.chars().take(max).collect();
            self.front.put_str(x, help_top - 2, &msg, hdr, Color::Reset);
        }
    }

    fn compose_reveal(&mut self, w: &World) {
        let bg = Color::Rgb { r: 40, g: 30, b: 50 };
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        let pink = Color::Rgb { r: 255, g: 120, b: 170 };

        let box_w = 36_usize.min(self.front.width);
        let box_h = 9_usize.min(self.front.height);
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = self.front.height.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, bg));
            }
        }

        let blink = (w.anim_tick / 10) % 2 == 0;
        let star = if blink { '★' } else { '☆' };
        let title = format!("{star} ALL MAZES COMPLETE {star}");
        let lines = [
            (title, gold),
            (String::new(), gold),
            ("Your reward:".to_string(), Color::White),
            (w.reward_token().to_string(), pink),
            (String::new(), gold),
            ("ENTER: close".to_string(), Color::DarkGrey),
        ];
        for (i, (text, fg)) in lines.iter().enumerate() {
            let len = text.chars().count();
            let x = box_x + box_w.saturating_sub(len) / 2;
            self.front.put_str(x, box_y + 1 + i, text, *fg, bg);
        }
    }
}
