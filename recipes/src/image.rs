//! In-memory 2-D images.
//!
//! Every image remembers where it came from (usually the frame file) so that
//! shape errors can name both operands.

use common::buffer2::Buffer2;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::math;

/// A row-major `f32` image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Buffer2<f32>,
    origin: String,
}

impl Image {
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Self {
        Self {
            data: Buffer2::new(width, height, pixels),
            origin: String::from("<memory>"),
        }
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            data: Buffer2::new_filled(width, height, value),
            origin: String::from("<memory>"),
        }
    }

    /// Build from rows of equal length.
    pub fn from_rows<R>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = f32>,
    {
        Self {
            data: Buffer2::from_rows(rows),
            origin: String::from("<memory>"),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn pixels(&self) -> &[f32] {
        self.data.pixels()
    }

    pub fn pixels_mut(&mut self) -> &mut [f32] {
        self.data.pixels_mut()
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        *self.data.get(x, y)
    }

    pub fn into_buffer(self) -> Buffer2<f32> {
        self.data
    }

    pub fn ensure_same_shape(&self, other: &Image) -> Result<()> {
        if self.data.same_shape(&other.data) {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                left: self.origin.clone(),
                left_shape: self.shape(),
                right: other.origin.clone(),
                right_shape: other.shape(),
            })
        }
    }

    fn zip_apply(&mut self, other: &Image, op: impl Fn(&mut f32, f32) + Sync) -> Result<()> {
        self.ensure_same_shape(other)?;
        self.data
            .par_iter_mut()
            .zip(other.data.par_iter())
            .for_each(|(l, &r)| op(l, r));
        Ok(())
    }

    /// Pixel-by-pixel `self += other`.
    pub fn add(&mut self, other: &Image) -> Result<()> {
        self.zip_apply(other, |l, r| *l += r)
    }

    /// Pixel-by-pixel `self -= other` (dark or bias subtraction).
    pub fn subtract(&mut self, other: &Image) -> Result<()> {
        self.zip_apply(other, |l, r| *l -= r)
    }

    /// Pixel-by-pixel `self /= other` (flat division).
    pub fn divide(&mut self, other: &Image) -> Result<()> {
        self.zip_apply(other, |l, r| *l /= r)
    }

    pub fn divide_scalar(&mut self, value: f32) {
        self.data.par_iter_mut().for_each(|p| *p /= value);
    }

    pub fn median(&self) -> f32 {
        math::median_f32(self.data.pixels())
    }

    pub fn mean(&self) -> f32 {
        math::mean_f32(self.data.pixels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(rows: &[&[f32]]) -> Image {
        Image::from_rows(rows.iter().map(|r| r.to_vec()))
    }

    #[test]
    fn subtract_is_elementwise() {
        let mut light = image(&[&[100.0, 200.0], &[150.0, 250.0]]);
        let dark = image(&[&[10.0, 20.0], &[15.0, 25.0]]);
        light.subtract(&dark).unwrap();
        assert_eq!(light.pixels(), &[90.0, 180.0, 135.0, 225.0]);
    }

    #[test]
    fn divide_is_elementwise() {
        let mut light = image(&[&[2.0, 9.0]]);
        let flat = image(&[&[0.5, 3.0]]);
        light.divide(&flat).unwrap();
        assert_eq!(light.pixels(), &[4.0, 3.0]);
    }

    #[test]
    fn add_and_divide_scalar() {
        let mut a = Image::filled(2, 2, 1.0);
        a.add(&Image::filled(2, 2, 3.0)).unwrap();
        a.divide_scalar(2.0);
        assert_eq!(a.pixels(), &[2.0; 4]);
    }

    #[test]
    fn shape_mismatch_names_both_origins() {
        let mut raw = Image::filled(4, 4, 1.0).with_origin("raw.fits");
        let dark = Image::filled(2, 4, 1.0).with_origin("dark.fits");
        let err = raw.subtract(&dark).unwrap_err();
        match err {
            Error::ShapeMismatch {
                left,
                left_shape,
                right,
                right_shape,
            } => {
                assert_eq!(left, "raw.fits");
                assert_eq!(left_shape, (4, 4));
                assert_eq!(right, "dark.fits");
                assert_eq!(right_shape, (2, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Operand untouched on failure
        assert_eq!(raw.pixels(), &[1.0; 16]);
    }

    #[test]
    fn transposed_shape_is_a_mismatch() {
        let a = Image::filled(3, 2, 0.0);
        let b = Image::filled(2, 3, 0.0);
        assert!(a.ensure_same_shape(&b).is_err());
    }

    #[test]
    fn statistics() {
        let img = image(&[&[1.0, 2.0], &[3.0, 10.0]]);
        assert_eq!(img.median(), 2.5);
        assert_eq!(img.mean(), 4.0);
        assert_eq!(img.get(1, 1), 10.0);
        assert_eq!(img.shape(), (2, 2));
    }
}
