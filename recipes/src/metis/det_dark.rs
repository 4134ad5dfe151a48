//! `metis_det_dark`: master dark for any METIS detector.
//!
//! The detector is derived from the raw headers; all raws must come from one
//! detector.

use super::{detector_rule, stacking_parameter, stacking_parameter_name};
use crate::classify::RoleTable;
use crate::params::ParameterList;
use crate::product::{ProductDefinition, Template};
use crate::recipe::RecipeDefinition;
use crate::verify::{DetectorSource, Requirements};

pub const NAME: &str = "metis_det_dark";

pub const RAW_TAGS: [&str; 3] = ["DARK_LM_RAW", "DARK_N_RAW", "DARK_IFU_RAW"];

pub fn definition() -> RecipeDefinition {
    RecipeDefinition {
        name: NAME.into(),
        synopsis: "Create master dark".into(),
        roles: RoleTable::new().raw_any(RAW_TAGS),
        requirements: Requirements {
            required: vec![],
            detector: DetectorSource::FromHeader(detector_rule()),
        },
        corrections: vec![],
        // sigclip is accepted here but has no combination method
        parameters: ParameterList::new().with(stacking_parameter(
            NAME,
            "average",
            &["add", "average", "median", "sigclip"],
        )),
        stacking_parameter: stacking_parameter_name(NAME),
        product: ProductDefinition::final_image("MASTER_DARK_{detector}"),
        product_key: Template::new("METIS_{detector}_DARK"),
        band: None,
    }
}
