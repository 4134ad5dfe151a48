//! Input verification: the gate between classification and processing.

use std::collections::BTreeSet;

use crate::classify::CalibrationSlot;
use crate::error::{Error, Result, UnmappedValue};
use crate::frame::Frame;
use crate::input_set::InputSet;
use crate::storage::FrameStore;

/// Closed lookup from a raw header keyword to a detector name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorRule {
    pub key: String,
    pub table: Vec<(String, String)>,
}

impl DetectorRule {
    pub fn new<I, K, V>(key: impl Into<String>, table: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            table: table
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn lookup(&self, value: &str) -> Result<&str, UnmappedValue> {
        self.table
            .iter()
            .find(|(k, _)| k == value)
            .map(|(_, detector)| detector.as_str())
            .ok_or_else(|| UnmappedValue {
                key: self.key.clone(),
                value: value.to_string(),
            })
    }
}

/// Where a recipe gets its detector name from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetectorSource {
    /// The recipe does not name a detector.
    #[default]
    None,
    /// Always the same detector.
    Fixed(String),
    /// Derived from the raw headers; all raws must agree.
    FromHeader(DetectorRule),
}

/// Presence and consistency conditions a recipe imposes on its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    pub required: Vec<CalibrationSlot>,
    pub detector: DetectorSource,
}

/// Input that passed verification. Read-only from here on.
#[derive(Debug)]
pub struct VerifiedInput {
    input: InputSet,
    detector: Option<String>,
}

impl VerifiedInput {
    pub fn input(&self) -> &InputSet {
        &self.input
    }

    pub fn raw(&self) -> &[Frame] {
        self.input.raw()
    }

    /// First raw frame; verification guarantees there is one.
    pub fn first_raw(&self) -> &Frame {
        &self.input.raw()[0]
    }

    pub fn detector(&self) -> Option<&str> {
        self.detector.as_deref()
    }
}

/// Check `input` against `requirements`.
///
/// Fails on the first violated condition, in this order: no raw frames,
/// ambiguous slot, missing required slot, detector consistency. Only raw
/// headers are read; no arrays are loaded.
pub fn verify(
    input: InputSet,
    requirements: &Requirements,
    store: &dyn FrameStore,
) -> Result<VerifiedInput> {
    tracing::debug!(frames = input.len(), "Verifying input set");

    if input.raw().is_empty() {
        return Err(Error::NoRawFramesFound);
    }

    for slot in input.slots() {
        let frames = input.calibration_frames(slot);
        if frames.len() > 1 {
            return Err(Error::AmbiguousCalibrationFrame {
                slot,
                frames: frames.iter().map(Frame::id).collect(),
            });
        }
    }

    for &slot in &requirements.required {
        if input.calibration(slot).is_none() {
            return Err(Error::MissingCalibrationFrame { slot });
        }
    }

    let detector = match &requirements.detector {
        DetectorSource::None => None,
        DetectorSource::Fixed(name) => Some(name.clone()),
        DetectorSource::FromHeader(rule) => Some(uniform_detector(input.raw(), rule, store)?),
    };

    if let Some(detector) = &detector {
        tracing::info!(detector = %detector, raw = input.raw().len(), "Input verified");
    }

    Ok(VerifiedInput { input, detector })
}

fn uniform_detector(raw: &[Frame], rule: &DetectorRule, store: &dyn FrameStore) -> Result<String> {
    let mut detectors = BTreeSet::new();

    for frame in raw {
        let header = store.load_header(frame)?;
        let value = header
            .get(&rule.key)
            .map(|v| v.to_string())
            .ok_or_else(|| Error::MissingHeaderKey {
                frame: frame.id(),
                key: rule.key.clone(),
            })?;
        let detector = rule
            .lookup(&value)
            .map_err(|source| Error::UnknownDetectorValue {
                frame: frame.id(),
                value: value.clone(),
                source,
            })?;
        detectors.insert(detector.to_string());
    }

    if detectors.len() > 1 {
        return Err(Error::MixedDetectors { detectors });
    }

    detectors.pop_first().ok_or(Error::NoRawFramesFound)
}
