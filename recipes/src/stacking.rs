//! Combination of calibrated raw arrays into one image.

use std::str::FromStr;

use rayon::prelude::*;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{Error, Result};
use crate::image::Image;
use crate::math;

/// Method used for combining frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum StackingMethod {
    /// Pixel-wise sum, folded left in input order.
    Add,
    /// Pixel-wise mean.
    Average,
    /// Pixel-wise median; mean of the two middle values for even counts.
    Median,
}

impl StackingMethod {
    /// Parse a configured method name. Names are case-sensitive.
    pub fn from_config(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(|_| Error::UnknownStackingMethod(value.to_string()))
    }
}

/// Combine `images` with `method`.
///
/// Inputs must share one shape. A single image is returned unchanged.
pub fn combine(images: &[Image], method: StackingMethod) -> Result<Image> {
    let (first, rest) = images.split_first().ok_or(Error::NoRawFramesFound)?;
    for image in rest {
        first.ensure_same_shape(image)?;
    }

    tracing::info!(
        method = %method,
        frame_count = images.len(),
        width = first.width(),
        height = first.height(),
        "Combining frames"
    );

    if rest.is_empty() {
        return Ok(first.clone());
    }

    let combined = match method {
        StackingMethod::Add => {
            let mut sum = first.clone();
            for image in rest {
                sum.add(image)?;
            }
            sum
        }
        StackingMethod::Average => reduce_per_pixel(images, |values| math::mean_f32(values)),
        StackingMethod::Median => reduce_per_pixel(images, math::median_f32_mut),
    };

    Ok(combined.with_origin(format!("{method} of {} frames", images.len())))
}

/// Like [`combine`], with the method given by name.
pub fn combine_named(images: &[Image], method: &str) -> Result<Image> {
    combine(images, StackingMethod::from_config(method)?)
}

/// Apply `reduce` to each pixel's stack of values, gathered in input order.
fn reduce_per_pixel<F>(images: &[Image], reduce: F) -> Image
where
    F: Fn(&mut [f32]) -> f32 + Sync,
{
    let (width, height) = images[0].shape();
    let mut output = vec![0.0f32; width * height];

    output.par_iter_mut().enumerate().for_each_init(
        || Vec::with_capacity(images.len()),
        |values, (idx, out)| {
            values.clear();
            values.extend(images.iter().map(|image| image.pixels()[idx]));
            *out = reduce(values.as_mut_slice());
        },
    );

    Image::new(width, height, output)
}
