//! Save boundary: handing finished products to the host.

use parking_lot::Mutex;

use crate::error::Result;
use crate::frame::{Frame, FrameGroup};
use crate::header::{Property, PropertyList};
use crate::image::Image;
use crate::params::ResolvedParameters;

/// Everything the host needs to persist one product.
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    /// All input frames of the run.
    pub frames: &'a [Frame],
    pub parameters: &'a ResolvedParameters,
    /// Raw and calibration frames actually consumed.
    pub used_frames: &'a [Frame],
    pub image: &'a Image,
    pub recipe: &'a str,
    /// Product properties to append to the output header.
    pub properties: &'a PropertyList,
    pub pipeline: &'a str,
    pub file_name: &'a str,
    /// Representative raw header the output header starts from.
    pub header: &'a PropertyList,
}

impl SaveRequest<'_> {
    /// Processing-history keywords: recipe, pipeline, inputs and parameters.
    pub fn provenance(&self) -> PropertyList {
        let mut list = PropertyList::new();
        list.append(Property::new("ESO PRO REC1 ID", self.recipe));
        list.append(Property::new("ESO PRO REC1 PIPE ID", self.pipeline));

        let raw = self.used_frames.iter().filter(|f| f.group() == FrameGroup::Raw);
        let calib = self.used_frames.iter().filter(|f| f.group() == FrameGroup::Calib);
        for (kind, frames) in [("RAW", raw.collect::<Vec<_>>()), ("CAL", calib.collect())] {
            for (i, frame) in frames.into_iter().enumerate() {
                let prefix = format!("ESO PRO REC1 {kind}{}", i + 1);
                list.append(Property::new(format!("{prefix} NAME"), frame.id()));
                list.append(Property::new(format!("{prefix} CATG"), frame.tag()));
            }
        }

        for (i, (name, value)) in self.parameters.iter().enumerate() {
            let prefix = format!("ESO PRO REC1 PARAM{}", i + 1);
            list.append(Property::new(format!("{prefix} NAME"), name));
            list.append(Property::new(format!("{prefix} VALUE"), value));
        }

        list
    }

    /// Header written with the product: representative header, then the
    /// product properties, then provenance.
    pub fn output_header(&self) -> PropertyList {
        let mut header = self.header.clone();
        for property in self.properties.iter().chain(self.provenance().iter()) {
            header.set(&property.name, property.value.clone());
        }
        header
    }
}

/// Receiver of finished products.
pub trait ProductSink {
    fn save(&self, request: &SaveRequest<'_>) -> Result<()>;
}

/// A product captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedProduct {
    pub recipe: String,
    pub pipeline: String,
    pub file_name: String,
    pub header: PropertyList,
    pub image: Image,
    pub used_frames: Vec<Frame>,
    pub frame_count: usize,
}

/// Sink that keeps saved products in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<SavedProduct>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SavedProduct> {
        self.saved.lock().clone()
    }
}

impl ProductSink for MemorySink {
    fn save(&self, request: &SaveRequest<'_>) -> Result<()> {
        let product = SavedProduct {
            recipe: request.recipe.to_string(),
            pipeline: request.pipeline.to_string(),
            file_name: request.file_name.to_string(),
            header: request.output_header(),
            image: request.image.clone(),
            used_frames: request.used_frames.to_vec(),
            frame_count: request.frames.len(),
        };
        self.saved.lock().push(product);
        Ok(())
    }
}
