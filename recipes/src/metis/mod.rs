//! METIS recipe definitions and registry.

pub mod det_dark;
pub mod img_flat;
pub mod lm_basic_reduction;

use crate::classify::{CalibrationSlot, RoleTable};
use crate::params::ParameterEnum;
use crate::recipe::RecipeDefinition;
use crate::verify::DetectorRule;

/// Raw header keyword identifying the observing technique.
pub const DPR_TECH: &str = "ESO DPR TECH";

const STACKING_DESCRIPTION: &str = "Name of the method used to combine the input images";

/// Detector lookup from the observing technique of a raw frame.
pub fn detector_rule() -> DetectorRule {
    DetectorRule::new(
        DPR_TECH,
        [("IMAGE,LM", "2RG"), ("IMAGE,N", "GEO"), ("IFU", "IFU")],
    )
}

/// Rules shared by recipes that stack raws after dark subtraction.
pub fn base_table<R, D>(raw_tags: R, dark_tags: D) -> RoleTable
where
    R: IntoIterator,
    R::Item: Into<String>,
    D: IntoIterator,
    D::Item: Into<String>,
{
    RoleTable::new()
        .raw_any(raw_tags)
        .calibration(CalibrationSlot::MasterDark, dark_tags)
}

pub fn stacking_parameter_name(context: &str) -> String {
    format!("{context}.stacking.method")
}

pub fn stacking_parameter(context: &str, default: &str, alternatives: &[&str]) -> ParameterEnum {
    ParameterEnum::new(
        stacking_parameter_name(context),
        context,
        STACKING_DESCRIPTION,
        default,
        alternatives.iter().copied(),
    )
}

/// Every recipe, constructed fresh.
pub fn all_recipes() -> Vec<RecipeDefinition> {
    vec![
        det_dark::definition(),
        img_flat::lm_definition(),
        img_flat::n_definition(),
        lm_basic_reduction::definition(),
    ]
}

pub fn find_recipe(name: &str) -> Option<RecipeDefinition> {
    all_recipes().into_iter().find(|recipe| recipe.name == name)
}
