//! FITS-backed storage and product sink.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use fitsio::FitsFile;
use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::images::{ImageDescription, ImageType};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::header::{PropertyList, PropertyValue};
use crate::image::Image;
use crate::metis::DPR_TECH;
use crate::sink::{ProductSink, SaveRequest};
use crate::storage::FrameStore;

const DEFAULT_KEYS: [&str; 6] = [
    DPR_TECH,
    "OBJECT",
    "INSTRUME",
    "DATE-OBS",
    "EXPTIME",
    "ESO PRO CATG",
];

/// Reads frames from FITS files on disk.
///
/// Only the configured keywords are read into headers.
#[derive(Debug, Clone)]
pub struct FitsStore {
    keys: Vec<String>,
}

impl Default for FitsStore {
    fn default() -> Self {
        Self::with_keys(DEFAULT_KEYS)
    }
}

impl FitsStore {
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl FrameStore for FitsStore {
    fn load_header(&self, frame: &Frame) -> Result<PropertyList> {
        read_header(frame.file(), &self.keys).map_err(|e| load_error(frame.file(), e))
    }

    fn load_image(&self, frame: &Frame, hdu: usize) -> Result<Image> {
        let image = read_image(frame.file(), hdu).map_err(|e| load_error(frame.file(), e))?;
        Ok(image.with_origin(frame.id()))
    }
}

fn load_error(path: &Path, source: anyhow::Error) -> Error {
    Error::Load {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

fn open(path: &Path) -> anyhow::Result<FitsFile> {
    FitsFile::open(path).with_context(|| format!("Failed to open FITS file: {}", path.display()))
}

fn read_header(path: &Path, keys: &[String]) -> anyhow::Result<PropertyList> {
    let mut fptr = open(path)?;
    let hdu = fptr.primary_hdu().context("Failed to access primary HDU")?;

    let mut header = PropertyList::new();
    for key in keys {
        if let Some(value) = read_value(&hdu, &mut fptr, key) {
            header.set(key, value);
        }
    }
    Ok(header)
}

/// Numeric if the value parses as a number, integral numbers as integers.
/// Read as a string, cfitsio returns the raw text of any value.
fn read_value(hdu: &FitsHdu, fptr: &mut FitsFile, key: &str) -> Option<PropertyValue> {
    if let Ok(number) = hdu.read_key::<f64>(fptr, key) {
        return Some(if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
            PropertyValue::Int(number as i64)
        } else {
            PropertyValue::Float(number)
        });
    }
    hdu.read_key::<String>(fptr, key)
        .ok()
        .map(PropertyValue::String)
}

fn read_image(path: &Path, index: usize) -> anyhow::Result<Image> {
    let mut fptr = open(path)?;
    let hdu = fptr
        .hdu(index)
        .with_context(|| format!("Failed to access HDU {index}"))?;

    // FITS shape is [NAXIS2, NAXIS1] = [height, width]
    let (height, width) = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } if shape.len() == 2 => (shape[0], shape[1]),
        HduInfo::ImageInfo { shape, .. } => {
            bail!("Expected a 2-D image in HDU {index}, got {} axes", shape.len())
        }
        _ => bail!("HDU {index} is not an image"),
    };

    let pixels: Vec<f32> = hdu
        .read_image(&mut fptr)
        .context("Failed to read image data")?;
    if pixels.len() != width * height {
        bail!("Pixel count {} does not match {width}x{height}", pixels.len());
    }

    Ok(Image::new(width, height, pixels))
}

/// Writes products as single-HDU FITS files into a directory.
#[derive(Debug, Clone)]
pub struct FitsSink {
    output_dir: PathBuf,
}

impl FitsSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Frame pointing at the file written for `product_frame`, for use as a
    /// calibration input (array in [`crate::storage::PRIMARY_HDU`]).
    pub fn written_frame(&self, product_frame: &Frame) -> Frame {
        Frame::new(self.path_of(&product_frame.id()), product_frame.tag())
    }

    fn write(&self, request: &SaveRequest<'_>) -> anyhow::Result<PathBuf> {
        let path = self.path_of(request.file_name);

        // fitsio won't overwrite
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }

        let (width, height) = request.image.shape();
        let description = ImageDescription {
            data_type: ImageType::Float,
            dimensions: &[height, width],
        };
        let mut fptr = FitsFile::create(&path)
            .with_custom_primary(&description)
            .open()
            .with_context(|| format!("Failed to create FITS file: {}", path.display()))?;
        let hdu = fptr.primary_hdu().context("Failed to get primary HDU")?;

        hdu.write_image(&mut fptr, request.image.pixels())
            .context("Failed to write FITS image data")?;

        for property in &request.output_header() {
            let name = property.name.as_str();
            let written = match &property.value {
                PropertyValue::String(text) => hdu.write_key(&mut fptr, name, text.as_str()),
                PropertyValue::Int(value) => hdu.write_key(&mut fptr, name, *value),
                PropertyValue::Float(value) => hdu.write_key(&mut fptr, name, *value),
                PropertyValue::Bool(value) => {
                    hdu.write_key(&mut fptr, name, if *value { "T" } else { "F" })
                }
            };
            written.with_context(|| format!("Failed to write keyword '{name}'"))?;
        }

        Ok(path)
    }
}

impl ProductSink for FitsSink {
    fn save(&self, request: &SaveRequest<'_>) -> Result<()> {
        let path = self.write(request).map_err(|e| Error::Save {
            file_name: request.file_name.to_string(),
            source: e.into(),
        })?;
        tracing::info!(path = %path.display(), recipe = request.recipe, "Wrote product");
        Ok(())
    }
}
