/// Maze asset loading.
///
/// ## Naming
///   Maze N is the asset `maze<N>`, stored as `<mazes_dir>/maze<N>.png`.
///
/// ## Normalisation
///   Every decoded image is converted to RGBA8 and stretched onto the
///   `canvas_size`×`canvas_size` canvas (Triangle filter) when its size
///   differs, so all sampling happens in canvas coordinates. Fully
///   transparent pixels become black first, so they read as wall.
///
/// ## Background decode
///   `AssetLoader` owns one worker thread. Requests carry a `LoadTicket`;
///   results come back tagged with the same ticket and are drained with
///   `poll()` once per frame. If several requests are queued when the
///   worker wakes up, only the newest is decoded. The session drops any
///   result whose ticket is not the active one.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::domain::raster::RasterImage;
use crate::error::MazeError;
use crate::sim::progress::MazeIndex;

/// Identifies one load request. Strictly increasing per session.
pub type LoadTicket = u64;

/// Asset name for a maze.
pub fn asset_name(index: MazeIndex) -> String {
    format!("maze{index}")
}

/// Anything that can produce a decoded maze for an index.
pub trait MazeSource: Send + 'static {
    fn fetch(&self, index: MazeIndex) -> Result<RasterImage, MazeError>;
}

/// Reads `maze<N>.png` files from a directory.
pub struct DirSource {
    dir: PathBuf,
    canvas_size: u32,
}

impl DirSource {
    pub fn new(dir: impl AsRef<Path>, canvas_size: u32) -> Self {
        DirSource { dir: dir.as_ref().to_path_buf(), canvas_size }
    }

    pub fn path_for(&self, index: MazeIndex) -> PathBuf {
        self.dir.join(format!("{}.png", asset_name(index)))
    }
}

impl MazeSource for DirSource {
    fn fetch(&self, index: MazeIndex) -> Result<RasterImage, MazeError> {
        let decoded = image::open(self.path_for(index)).map_err(|source| MazeError::AssetLoad {
            name: asset_name(index),
            source,
        })?;
        normalize(decoded.to_rgba8(), self.canvas_size)
    }
}

/// Fit decoded pixels onto the square canvas.
pub fn normalize(mut pixels: RgbaImage, canvas_size: u32) -> Result<RasterImage, MazeError> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 || canvas_size == 0 {
        return Err(MazeError::NotSquare { width, height });
    }
    clear_transparent(&mut pixels);
    if width == canvas_size && height == canvas_size {
        return RasterImage::new(pixels);
    }
    RasterImage::new(imageops::resize(&pixels, canvas_size, canvas_size, FilterType::Triangle))
}

/// Zero the colour of every alpha-0 pixel.
fn clear_transparent(pixels: &mut RgbaImage) {
    for px in pixels.pixels_mut().filter(|px| px[3] == 0) {
        px[0] = 0;
        px[1] = 0;
        px[2] = 0;
    }
}

/// A finished (or failed) load.
#[derive(Debug)]
pub struct LoadResult {
    pub ticket: LoadTicket,
    pub index: MazeIndex,
    pub result: Result<RasterImage, MazeError>,
}

type Job = (LoadTicket, MazeIndex);

pub struct AssetLoader {
    requests: Option<Sender<Job>>,
    results: Receiver<LoadResult>,
    /// Results produced locally when the worker is unreachable.
    orphaned: Vec<LoadResult>,
    worker: Option<JoinHandle<()>>,
}

impl AssetLoader {
    pub fn spawn(source: impl MazeSource) -> io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Job>();
        let (res_tx, res_rx) = mpsc::channel::<LoadResult>();

        let worker = thread::Builder::new()
            .name("maze-loader".into())
            .spawn(move || {
                while let Ok(mut job) = req_rx.recv() {
                    // A newer request supersedes anything still queued.
                    if let Some(newest) = req_rx.try_iter().last() {
                        log::debug!("skipping superseded load of {}", asset_name(job.1));
                        job = newest;
                    }
                    let (ticket, index) = job;
                    let result = source.fetch(index);
                    if res_tx.send(LoadResult { ticket, index, result }).is_err() {
                        break;
                    }
                }
            })?;

        Ok(AssetLoader {
            requests: Some(req_tx),
            results: res_rx,
            orphaned: Vec::new(),
            worker: Some(worker),
        })
    }

    /// Queue a decode. Never blocks.
    pub fn request(&mut self, ticket: LoadTicket, index: MazeIndex) {
        let sent = self
            .requests
            .as_ref()
            .map(|tx| tx.send((ticket, index)).is_ok())
            .unwrap_or(false);
        if !sent {
            log::error!("maze loader worker is gone; failing {}", asset_name(index));
            let source = image::ImageError::IoError(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "loader worker stopped",
            ));
            self.orphaned.push(LoadResult {
                ticket,
                index,
                result: Err(MazeError::AssetLoad { name: asset_name(index), source }),
            });
        }
    }

    /// Drain every result that is ready.
    pub fn poll(&mut self) -> Vec<LoadResult> {
        let mut out = std::mem::take(&mut self.orphaned);
        out.extend(self.results.try_iter());
        out
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
