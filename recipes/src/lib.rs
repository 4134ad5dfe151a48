//! Recipes - frame classification, calibration and stacking for METIS
//! detector data.
//!
//! A recipe run sorts an unordered set of frames into roles by tag, checks
//! that the calibration inputs are complete and consistent, calibrates and
//! combines the raw arrays, and returns typed products.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use recipes::{find_recipe, Frame, MemorySink, Settings};
//!
//! let recipe = find_recipe("metis_det_dark").unwrap();
//! let frames = vec![
//!     Frame::new("dark_1.fits", "DARK_LM_RAW"),
//!     Frame::new("dark_2.fits", "DARK_LM_RAW"),
//! ];
//! let run = recipe.run(frames, &Settings::new(), &store)?;
//! run.save(&sink)?;
//! ```

mod calibration;
mod classify;
mod error;
mod frame;
mod header;
mod image;
mod input_set;
pub(crate) mod math;
pub mod metis;
mod params;
mod product;
mod recipe;
mod sink;
mod stacking;
mod storage;
mod verify;

#[cfg(feature = "fits")]
mod fits;

#[cfg(test)]
pub mod testing;

// ============================================================================
// Errors
// ============================================================================

pub use error::{BoxError, Error, Result, UnmappedValue};

// ============================================================================
// Frames, headers and images
// ============================================================================

pub use frame::{Frame, FrameGroup, FrameLevel, FrameType};
pub use header::{Property, PropertyList, PropertyValue};
pub use image::Image;

// ============================================================================
// Classification and verification
// ============================================================================

pub use classify::{CalibrationSlot, Role, RoleTable, Rule, TagMatcher};
pub use input_set::InputSet;
pub use verify::{verify, DetectorRule, DetectorSource, Requirements, VerifiedInput};

// ============================================================================
// Calibration and stacking
// ============================================================================

pub use calibration::{CalibrationApplier, Correction};
pub use stacking::{combine, combine_named, StackingMethod};

// ============================================================================
// Products and storage
// ============================================================================

pub use product::{
    Product, ProductDefinition, ProductField, Template, TemplateVars, PIPELINE, PRO_CATG,
};
pub use sink::{MemorySink, ProductSink, SaveRequest, SavedProduct};
pub use storage::{FrameStore, MemoryStore, DATA_HDU, PRIMARY_HDU};

#[cfg(feature = "fits")]
pub use fits::{FitsSink, FitsStore};

// ============================================================================
// Recipes
// ============================================================================

pub use metis::{all_recipes, find_recipe};
pub use params::{ParameterEnum, ParameterList, ResolvedParameters, Settings};
pub use recipe::{RecipeDefinition, RecipeRun};
