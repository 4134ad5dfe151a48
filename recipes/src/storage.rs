//! Storage boundary: loading headers and arrays behind a frame reference.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::header::PropertyList;
use crate::image::Image;

/// Header data unit holding the primary header and calibration arrays.
pub const PRIMARY_HDU: usize = 0;
/// Header data unit holding raw detector arrays.
pub const DATA_HDU: usize = 1;

/// Blocking access to stored frames.
///
/// Implementations must be `Sync`: raw arrays of a run may be loaded in
/// parallel.
pub trait FrameStore: Sync {
    /// Primary header of `frame`.
    fn load_header(&self, frame: &Frame) -> Result<PropertyList>;

    /// Image array stored in `hdu` of `frame`.
    fn load_image(&self, frame: &Frame, hdu: usize) -> Result<Image>;
}

#[derive(Debug, Clone, Default)]
struct StoredFrame {
    header: PropertyList,
    images: BTreeMap<usize, Image>,
}

/// In-memory frame store.
///
/// Counts image loads so callers can check that calibration arrays are read
/// only once per run.
#[derive(Debug, Default)]
pub struct MemoryStore {
    frames: HashMap<PathBuf, StoredFrame>,
    image_loads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `image` in `hdu` of `file`, creating the entry if needed.
    pub fn insert_image(&mut self, file: impl Into<PathBuf>, hdu: usize, image: Image) {
        let file = file.into();
        let image = image.with_origin(file.display().to_string());
        self.frames.entry(file).or_default().images.insert(hdu, image);
    }

    pub fn insert_header(&mut self, file: impl Into<PathBuf>, header: PropertyList) {
        self.frames.entry(file.into()).or_default().header = header;
    }

    /// Convenience for raw frames: header plus array in [`DATA_HDU`].
    pub fn insert_raw(&mut self, file: impl Into<PathBuf>, header: PropertyList, image: Image) {
        let file = file.into();
        self.insert_header(file.clone(), header);
        self.insert_image(file, DATA_HDU, image);
    }

    /// Convenience for calibration frames: array in [`PRIMARY_HDU`].
    pub fn insert_calibration(&mut self, file: impl Into<PathBuf>, image: Image) {
        self.insert_image(file, PRIMARY_HDU, image);
    }

    /// Number of `load_image` calls served so far.
    pub fn image_loads(&self) -> usize {
        self.image_loads.load(Ordering::Relaxed)
    }

    fn entry(&self, path: &Path) -> Result<&StoredFrame> {
        self.frames.get(path).ok_or_else(|| Error::Load {
            path: path.to_path_buf(),
            source: anyhow!("frame is not in the store").into(),
        })
    }
}

impl FrameStore for MemoryStore {
    fn load_header(&self, frame: &Frame) -> Result<PropertyList> {
        Ok(self.entry(frame.file())?.header.clone())
    }

    fn load_image(&self, frame: &Frame, hdu: usize) -> Result<Image> {
        let stored = self.entry(frame.file())?;
        self.image_loads.fetch_add(1, Ordering::Relaxed);
        stored.images.get(&hdu).cloned().ok_or_else(|| Error::Load {
            path: frame.file().to_path_buf(),
            source: anyhow!("no image in HDU {hdu}").into(),
        })
    }
}
