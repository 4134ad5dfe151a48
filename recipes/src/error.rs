//! Error types for recipe runs.
//!
//! Every variant aborts the current run; there is no partial result.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::classify::CalibrationSlot;
use crate::product::ProductField;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed source for storage and sink failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A header value that has no entry in a closed lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a known value of '{key}'")]
pub struct UnmappedValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("No raw frames found in the frameset")]
    NoRawFramesFound,

    #[error("No {slot} frame found in the frameset")]
    MissingCalibrationFrame { slot: CalibrationSlot },

    #[error("More than one {slot} frame found: {}", .frames.join(", "))]
    AmbiguousCalibrationFrame {
        slot: CalibrationSlot,
        frames: Vec<String>,
    },

    #[error("Unknown detector value '{value}' in {frame}")]
    UnknownDetectorValue {
        frame: String,
        value: String,
        #[source]
        source: UnmappedValue,
    },

    #[error("Raw frames from more than one detector found: {}", join_set(.detectors))]
    MixedDetectors { detectors: BTreeSet<String> },

    #[error(
        "Shape mismatch: {left} is {} but {right} is {}",
        shape(.left_shape),
        shape(.right_shape)
    )]
    ShapeMismatch {
        left: String,
        left_shape: (usize, usize),
        right: String,
        right_shape: (usize, usize),
    },

    #[error("Unknown stacking method '{0}'")]
    UnknownStackingMethod(String),

    #[error("Invalid product definition: {0} is not set")]
    InvalidProductDefinition(ProductField),

    #[error("Header of {frame} has no '{key}' keyword")]
    MissingHeaderKey { frame: String, key: String },

    #[error("Flat {slot} has median {median} after bias subtraction, cannot normalize")]
    DegenerateFlat { slot: CalibrationSlot, median: f32 },

    #[error("Failed to load '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Failed to save product '{file_name}': {source}")]
    Save {
        file_name: String,
        #[source]
        source: BoxError,
    },

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error(
        "Invalid value '{value}' for parameter '{name}', expected one of: {}",
        .alternatives.join(", ")
    )]
    InvalidParameterValue {
        name: String,
        value: String,
        alternatives: Vec<String>,
    },

    #[error("Failed to read settings '{path}': {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings '{path}': {source}")]
    SettingsFormat {
        path: PathBuf,
        #[source]
        source: common::SerdeFormatError,
    },

    #[error(transparent)]
    SettingsExtension(#[from] common::FileExtensionError),
}

fn shape(&(width, height): &(usize, usize)) -> String {
    format!("{width}x{height}")
}

fn join_set(values: &BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;

    #[test]
    fn no_raw_frames_message() {
        assert_eq!(
            Error::NoRawFramesFound.to_string(),
            "No raw frames found in the frameset"
        );
    }

    #[test]
    fn ambiguous_calibration_names_slot_and_frames() {
        let err = Error::AmbiguousCalibrationFrame {
            slot: CalibrationSlot::MasterDark,
            frames: vec!["dark_a.fits".into(), "dark_b.fits".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("master_dark"));
        assert!(msg.contains("dark_a.fits, dark_b.fits"));
    }

    #[test]
    fn unknown_detector_keeps_lookup_failure_as_source() {
        let err = Error::UnknownDetectorValue {
            frame: "raw.fits".into(),
            value: "SPECTRO".into(),
            source: UnmappedValue {
                key: "ESO DPR TECH".into(),
                value: "SPECTRO".into(),
            },
        };
        assert!(err.to_string().contains("SPECTRO"));
        let source = err.source().expect("lookup failure is the source");
        assert!(source.to_string().contains("ESO DPR TECH"));
    }

    #[test]
    fn mixed_detectors_lists_all() {
        let err = Error::MixedDetectors {
            detectors: ["GEO".to_string(), "2RG".to_string()].into_iter().collect(),
        };
        assert_eq!(
            err.to_string(),
            "Raw frames from more than one detector found: 2RG, GEO"
        );
    }

    #[test]
    fn shape_mismatch_message() {
        let err = Error::ShapeMismatch {
            left: "raw.fits".into(),
            left_shape: (4, 4),
            right: "dark.fits".into(),
            right_shape: (2, 4),
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch: raw.fits is 4x4 but dark.fits is 2x4"
        );
    }

    #[test]
    fn invalid_product_definition_names_field() {
        let err = Error::InvalidProductDefinition(ProductField::FrameType);
        assert_eq!(
            err.to_string(),
            "Invalid product definition: frame_type is not set"
        );
    }

    #[test]
    fn load_error_chains_source() {
        let err = Error::Load {
            path: PathBuf::from("/data/raw.fits"),
            source: anyhow::anyhow!("file not found").into(),
        };
        assert!(err.to_string().contains("/data/raw.fits"));
        assert!(err.source().is_some());
    }
}
