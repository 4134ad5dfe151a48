//! Products: typed, self-describing recipe outputs.

use strum_macros::Display;

use crate::error::{Error, Result};
use crate::frame::{Frame, FrameGroup, FrameLevel, FrameType};
use crate::header::{Property, PropertyList, PropertyValue};
use crate::image::Image;

/// Property holding the product category.
pub const PRO_CATG: &str = "ESO PRO CATG";
/// Pipeline identifier passed to the save boundary.
pub const PIPELINE: &str = "METIS";

const FILE_EXTENSION: &str = ".fits";

/// Mandatory product attribute, named in [`Error::InvalidProductDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProductField {
    Category,
    Group,
    Level,
    FrameType,
    Key,
    FileName,
}

/// Run-time values substituted into [`Template`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub detector: Option<&'a str>,
    pub band: Option<&'a str>,
}

impl<'a> TemplateVars<'a> {
    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "detector" => self.detector,
            "band" => self.band,
            _ => None,
        }
    }
}

/// String with `{detector}` and `{band}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute all placeholders. `None` if any placeholder is unknown,
    /// unresolved, or not closed.
    pub fn render(&self, vars: &TemplateVars<'_>) -> Option<String> {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let end = rest[start..].find('}')? + start;
            out.push_str(vars.lookup(&rest[start + 1..end])?);
            rest = &rest[end + 1..];
        }
        out.push_str(rest);

        Some(out)
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Recipe-declared classification constants of a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDefinition {
    pub category: Option<Template>,
    pub group: Option<FrameGroup>,
    pub level: Option<FrameLevel>,
    pub frame_type: Option<FrameType>,
    /// Replaces the default `category + ".fits"` file name.
    pub file_name: Option<Template>,
    /// Fixed properties appended after the category property.
    pub extra_properties: Vec<Property>,
}

impl ProductDefinition {
    /// Definition of a final image product, the common case.
    pub fn final_image(category: impl Into<Template>) -> Self {
        Self {
            category: Some(category.into()),
            group: Some(FrameGroup::Product),
            level: Some(FrameLevel::Final),
            frame_type: Some(FrameType::Image),
            ..Default::default()
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<Template>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.extra_properties.push(Property::new(name, value));
        self
    }
}

/// Combined image plus everything the save boundary needs to persist it.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    category: String,
    file_name: String,
    group: FrameGroup,
    level: FrameLevel,
    frame_type: FrameType,
    header: PropertyList,
    image: Image,
    properties: PropertyList,
}

impl Product {
    /// Build a product from `definition`.
    ///
    /// `header` is the representative raw header, copied as is.
    pub fn new(
        definition: &ProductDefinition,
        vars: &TemplateVars<'_>,
        header: PropertyList,
        image: Image,
    ) -> Result<Self> {
        let category = definition
            .category
            .as_ref()
            .and_then(|template| template.render(vars))
            .ok_or(Error::InvalidProductDefinition(ProductField::Category))?;
        let group = definition
            .group
            .filter(|&g| g != FrameGroup::None)
            .ok_or(Error::InvalidProductDefinition(ProductField::Group))?;
        let level = definition
            .level
            .filter(|&l| l != FrameLevel::None)
            .ok_or(Error::InvalidProductDefinition(ProductField::Level))?;
        let frame_type = definition
            .frame_type
            .filter(|&t| t != FrameType::None)
            .ok_or(Error::InvalidProductDefinition(ProductField::FrameType))?;

        let file_name = match &definition.file_name {
            Some(template) => template
                .render(vars)
                .ok_or(Error::InvalidProductDefinition(ProductField::FileName))?,
            None => format!("{category}{FILE_EXTENSION}"),
        };

        let mut properties = PropertyList::new();
        properties.append(Property::new(PRO_CATG, category.as_str()));
        properties.extend(definition.extra_properties.iter().cloned());

        tracing::debug!(%category, %file_name, "Built product");

        Ok(Self {
            category,
            file_name,
            group,
            level,
            frame_type,
            header,
            image,
            properties,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Products are tagged with their category.
    pub fn tag(&self) -> &str {
        &self.category
    }

    pub fn group(&self) -> FrameGroup {
        self.group
    }

    pub fn level(&self) -> FrameLevel {
        self.level
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    pub fn header(&self) -> &PropertyList {
        &self.header
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// Frame referencing the saved product, for use as input of a later run.
    pub fn as_frame(&self) -> Frame {
        Frame::new(&self.file_name, &self.category).with_classification(
            self.group,
            self.level,
            self.frame_type,
        )
    }
}
