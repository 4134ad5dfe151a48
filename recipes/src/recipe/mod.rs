//! Recipe definitions and the run pipeline.
//!
//! A [`RecipeDefinition`] is an immutable value describing one recipe: its
//! role table, requirements, corrections, parameters and product. Running it
//! builds fresh per-run state:
//!
//! frames -> classification -> verification -> calibration -> combination
//! -> product.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::calibration::{CalibrationApplier, Correction};
use crate::classify::RoleTable;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::image::Image;
use crate::params::{ParameterList, ResolvedParameters, Settings};
use crate::product::{Product, ProductDefinition, ProductField, Template, TemplateVars, PIPELINE};
use crate::sink::{ProductSink, SaveRequest};
use crate::stacking::{self, StackingMethod};
use crate::storage::{FrameStore, DATA_HDU};
use crate::verify::{self, Requirements};

/// Immutable description of one recipe.
#[derive(Debug, Clone)]
pub struct RecipeDefinition {
    pub name: String,
    pub synopsis: String,
    pub roles: RoleTable,
    pub requirements: Requirements,
    pub corrections: Vec<Correction>,
    pub parameters: ParameterList,
    /// Name of the parameter holding the stacking method.
    pub stacking_parameter: String,
    pub product: ProductDefinition,
    /// Key of the product in [`RecipeRun::products`]; upper-cased after
    /// substitution.
    pub product_key: Template,
    /// Photometric band substituted for `{band}`.
    pub band: Option<String>,
}

impl RecipeDefinition {
    /// Run the recipe over `frames`.
    ///
    /// Any error aborts the run; nothing is returned or saved.
    pub fn run(
        &self,
        mut frames: Vec<Frame>,
        settings: &Settings,
        store: &dyn FrameStore,
    ) -> Result<RecipeRun> {
        tracing::info!(recipe = %self.name, frame_count = frames.len(), "Starting recipe");

        let parameters = self.parameters.resolve(settings)?;

        let input = self.roles.classify(&mut frames);
        let verified = verify::verify(input, &self.requirements, store)?;

        let method = parameters
            .get(&self.stacking_parameter)
            .ok_or_else(|| Error::UnknownParameter(self.stacking_parameter.clone()))
            .and_then(StackingMethod::from_config)?;

        let header = store.load_header(verified.first_raw())?;

        let mut images = verified
            .raw()
            .par_iter()
            .map(|frame| store.load_image(frame, DATA_HDU))
            .collect::<Result<Vec<Image>>>()?;
        tracing::info!(recipe = %self.name, count = images.len(), "Loaded raw frames");

        if !self.corrections.is_empty() {
            let mut applier = CalibrationApplier::new(&verified, store);
            for image in &mut images {
                applier.apply(&self.corrections, image)?;
            }
            tracing::info!(recipe = %self.name, "Calibrated raw frames");
        }

        let combined = stacking::combine(&images, method)?;
        drop(images);

        let vars = TemplateVars {
            detector: verified.detector(),
            band: self.band.as_deref(),
        };
        let product = Product::new(&self.product, &vars, header, combined)?;
        let key = self
            .product_key
            .render(&vars)
            .ok_or(Error::InvalidProductDefinition(ProductField::Key))?
            .to_uppercase();

        tracing::info!(
            recipe = %self.name,
            key = %key,
            category = product.category(),
            "Recipe finished"
        );

        let used_frames = verified.input().used_frames();
        let mut products = BTreeMap::new();
        products.insert(key, product);

        Ok(RecipeRun {
            recipe: self.name.clone(),
            frames,
            parameters,
            used_frames,
            products,
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RecipeRun {
    recipe: String,
    frames: Vec<Frame>,
    parameters: ResolvedParameters,
    used_frames: Vec<Frame>,
    products: BTreeMap<String, Product>,
}

impl RecipeRun {
    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    /// All input frames, with groups stamped by classification.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn parameters(&self) -> &ResolvedParameters {
        &self.parameters
    }

    /// Raw frames followed by calibration frames.
    pub fn used_frames(&self) -> &[Frame] {
        &self.used_frames
    }

    pub fn products(&self) -> &BTreeMap<String, Product> {
        &self.products
    }

    pub fn product(&self, key: &str) -> Option<&Product> {
        self.products.get(key)
    }

    /// Products as frames, for input to a downstream run.
    pub fn product_frames(&self) -> Vec<Frame> {
        self.products.values().map(Product::as_frame).collect()
    }

    /// Hand every product to `sink`.
    pub fn save(&self, sink: &dyn ProductSink) -> Result<()> {
        for product in self.products.values() {
            tracing::info!(
                recipe = %self.recipe,
                file_name = product.file_name(),
                "Saving product"
            );
            sink.save(&SaveRequest {
                frames: &self.frames,
                parameters: &self.parameters,
                used_frames: &self.used_frames,
                image: product.image(),
                recipe: &self.recipe,
                properties: product.properties(),
                pipeline: PIPELINE,
                file_name: product.file_name(),
                header: product.header(),
            })?;
        }
        Ok(())
    }
}
