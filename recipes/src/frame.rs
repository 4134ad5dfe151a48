//! Frames: references to stored exposures with a classification tag.

use std::path::{Path, PathBuf};

use strum_macros::Display;

/// Role a frame plays in a recipe run. `None` until classification stamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FrameGroup {
    #[default]
    None,
    Raw,
    Calib,
    Product,
}

/// Processing level of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FrameLevel {
    #[default]
    None,
    Temporary,
    Intermediate,
    Final,
}

/// Kind of data a frame stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FrameType {
    #[default]
    None,
    Image,
    Table,
    Any,
}

/// A stored exposure: file reference, tag and classification attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    file: PathBuf,
    tag: String,
    group: FrameGroup,
    level: FrameLevel,
    frame_type: FrameType,
}

impl Frame {
    /// Create an unclassified frame.
    pub fn new(file: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            tag: tag.into(),
            group: FrameGroup::None,
            level: FrameLevel::None,
            frame_type: FrameType::None,
        }
    }

    pub fn with_classification(
        mut self,
        group: FrameGroup,
        level: FrameLevel,
        frame_type: FrameType,
    ) -> Self {
        self.group = group;
        self.level = level;
        self.frame_type = frame_type;
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn tag(&self) -> &str {
        &self.tag
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

    pub(crate) fn set_group(&mut self, group: FrameGroup) {
        self.group = group;
    }

    /// Identifier used in diagnostics.
    pub fn id(&self) -> String {
        self.file.display().to_string()
    }
}
