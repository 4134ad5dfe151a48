//! Imaging lamp flats for the LM and N bands.

use super::{base_table, stacking_parameter, stacking_parameter_name};
use crate::calibration::Correction;
use crate::classify::CalibrationSlot;
use crate::params::ParameterList;
use crate::product::{ProductDefinition, Template};
use crate::recipe::RecipeDefinition;
use crate::verify::Requirements;

pub const LM_NAME: &str = "metis_lm_img_flat";
pub const N_NAME: &str = "metis_n_img_flat";

pub fn lm_definition() -> RecipeDefinition {
    flat_definition(LM_NAME, "LM", "2RG")
}

pub fn n_definition() -> RecipeDefinition {
    flat_definition(N_NAME, "N", "GEO")
}

fn flat_definition(name: &str, band: &str, detector: &str) -> RecipeDefinition {
    RecipeDefinition {
        name: name.into(),
        synopsis: format!("Create master flat for the {band} band"),
        roles: base_table(
            [format!("{band}_FLAT_LAMP_RAW")],
            [format!("MASTER_DARK_{detector}")],
        ),
        requirements: Requirements {
            required: vec![CalibrationSlot::MasterDark],
            ..Default::default()
        },
        corrections: vec![Correction::Subtract(CalibrationSlot::MasterDark)],
        parameters: ParameterList::new().with(stacking_parameter(
            name,
            "average",
            &["add", "average", "median"],
        )),
        stacking_parameter: stacking_parameter_name(name),
        product: ProductDefinition::final_image("MASTER_IMG_FLAT_LAMP_{band}"),
        product_key: Template::new(name),
        band: Some(band.into()),
    }
}
