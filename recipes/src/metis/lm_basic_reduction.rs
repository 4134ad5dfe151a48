//! `metis_lm_basic_reduction`: dark-subtracted, flat-fielded LM science
//! stack.

use super::{base_table, stacking_parameter, stacking_parameter_name};
use crate::calibration::Correction;
use crate::classify::{CalibrationSlot, RoleTable};
use crate::params::ParameterList;
use crate::product::{ProductDefinition, Template};
use crate::recipe::RecipeDefinition;
use crate::verify::{DetectorSource, Requirements};

pub const NAME: &str = "metis_lm_basic_reduction";

const CONTEXT: &str = "basic_reduction";

pub fn definition() -> RecipeDefinition {
    let roles = RoleTable::new()
        .calibration(
            CalibrationSlot::MasterFlat,
            ["MASTER_IMG_FLAT_LAMP_LM", "MASTER_FLAT_LAMP"],
        )
        .calibration(CalibrationSlot::MasterGain, ["MASTER_GAIN_2RG"])
        .then(&base_table(["LM_IMAGE_SCI_RAW"], ["MASTER_DARK_2RG"]));

    RecipeDefinition {
        name: NAME.into(),
        synopsis: "Basic science image data processing".into(),
        roles,
        requirements: Requirements {
            required: vec![CalibrationSlot::MasterDark, CalibrationSlot::MasterFlat],
            detector: DetectorSource::Fixed("2RG".into()),
        },
        corrections: vec![
            Correction::Subtract(CalibrationSlot::MasterDark),
            Correction::DivideByFlat {
                flat: CalibrationSlot::MasterFlat,
                bias: Some(CalibrationSlot::MasterDark),
            },
        ],
        parameters: ParameterList::new().with(stacking_parameter(
            CONTEXT,
            "add",
            &["add", "average", "median"],
        )),
        stacking_parameter: stacking_parameter_name(CONTEXT),
        product: ProductDefinition::final_image("OBJECT_REDUCED"),
        product_key: Template::new("OBJECT_REDUCED_{detector}"),
        band: None,
    }
}
