//! Calibration of raw arrays with master frames.
//!
//! Recipes declare an ordered list of [`Correction`]s. Calibration arrays are
//! loaded lazily and cached for the lifetime of the applier, which lives for
//! one recipe run.

use std::collections::HashMap;

use crate::classify::CalibrationSlot;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::storage::{FrameStore, PRIMARY_HDU};
use crate::verify::VerifiedInput;

/// One calibration step applied to every raw array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Subtract the slot's array (dark or bias).
    Subtract(CalibrationSlot),
    /// Divide by the flat after subtracting `bias` from it and normalizing
    /// it to median 1.
    DivideByFlat {
        flat: CalibrationSlot,
        bias: Option<CalibrationSlot>,
    },
}

/// Loads calibration arrays at most once and applies corrections.
pub struct CalibrationApplier<'a> {
    input: &'a VerifiedInput,
    store: &'a dyn FrameStore,
    arrays: HashMap<CalibrationSlot, Image>,
    flats: HashMap<(CalibrationSlot, Option<CalibrationSlot>), Image>,
}

impl<'a> CalibrationApplier<'a> {
    pub fn new(input: &'a VerifiedInput, store: &'a dyn FrameStore) -> Self {
        Self {
            input,
            store,
            arrays: HashMap::new(),
            flats: HashMap::new(),
        }
    }

    fn is_present(&self, slot: CalibrationSlot) -> bool {
        self.input.input().calibration(slot).is_some()
    }

    /// Array of `slot`, loaded on first use.
    pub fn calibration(&mut self, slot: CalibrationSlot) -> Result<&Image> {
        if !self.arrays.contains_key(&slot) {
            let frame = self
                .input
                .input()
                .calibration(slot)
                .ok_or(Error::MissingCalibrationFrame { slot })?;
            tracing::info!(%slot, file = %frame.file().display(), "Loading calibration frame");
            let image = self.store.load_image(frame, PRIMARY_HDU)?;
            self.arrays.insert(slot, image);
        }
        Ok(&self.arrays[&slot])
    }

    /// Flat with `bias` subtracted, divided by its own median. Cached.
    pub fn prepared_flat(
        &mut self,
        flat: CalibrationSlot,
        bias: Option<CalibrationSlot>,
    ) -> Result<&Image> {
        let key = (flat, bias);
        if !self.flats.contains_key(&key) {
            let mut prepared = self.calibration(flat)?.clone();
            if let Some(bias) = bias.filter(|&b| self.is_present(b)) {
                prepared.subtract(self.calibration(bias)?)?;
            }
            let median = prepared.median();
            if !(median > f32::EPSILON) {
                return Err(Error::DegenerateFlat { slot: flat, median });
            }
            prepared.divide_scalar(median);
            tracing::debug!(%flat, median, "Prepared flat field");
            self.flats.insert(key, prepared);
        }
        Ok(&self.flats[&key])
    }

    /// Apply `corrections` in order to `image`.
    ///
    /// Steps whose slot is absent from the input are skipped; required slots
    /// were already enforced by the verifier.
    pub fn apply(&mut self, corrections: &[Correction], image: &mut Image) -> Result<()> {
        for &correction in corrections {
            match correction {
                Correction::Subtract(slot) => {
                    if !self.is_present(slot) {
                        tracing::debug!(%slot, "No frame for subtraction, skipping");
                        continue;
                    }
                    tracing::debug!(%slot, image = image.origin(), "Subtracting");
                    image.subtract(self.calibration(slot)?)?;
                }
                Correction::DivideByFlat { flat, bias } => {
                    if !self.is_present(flat) {
                        tracing::debug!(%flat, "No flat frame, skipping flat fielding");
                        continue;
                    }
                    tracing::debug!(%flat, image = image.origin(), "Flat fielding");
                    image.divide(self.prepared_flat(flat, bias)?)?;
                }
            }
        }
        Ok(())
    }
}
