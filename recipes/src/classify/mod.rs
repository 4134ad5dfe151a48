//! Role classification by frame tag.
//!
//! A recipe declares an ordered [`RoleTable`]. Tables compose by
//! concatenation: recipe-specific rules first, then a shared base table.
//! The first matching rule wins; frames that match nothing are kept as
//! unrecognized and reported at warning level.


use strum_macros::Display;

use crate::frame::{Frame, FrameGroup};
use crate::input_set::InputSet;

/// Named single-frame calibration input of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CalibrationSlot {
    MasterDark,
    MasterFlat,
    MasterBias,
    MasterGain,
}

/// Role a frame is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Raw,
    Calibration(CalibrationSlot),
}

impl Role {
    /// Frame group stamped on frames with this role.
    pub fn group(self) -> FrameGroup {
        match self {
            Role::Raw => FrameGroup::Raw,
            Role::Calibration(_) => FrameGroup::Calib,
        }
    }
}

/// Tag predicate of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatcher {
    Exact(String),
    AnyOf(Vec<String>),
}

impl TagMatcher {
    pub fn exact(tag: impl Into<String>) -> Self {
        TagMatcher::Exact(tag.into())
    }

    pub fn any_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagMatcher::AnyOf(tags.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self {
            TagMatcher::Exact(expected) => expected == tag,
            TagMatcher::AnyOf(tags) => tags.iter().any(|t| t == tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub matcher: TagMatcher,
    pub role: Role,
}

/// Ordered list of `(matcher, role)` rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    rules: Vec<Rule>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, matcher: TagMatcher, role: Role) -> Self {
        self.rules.push(Rule { matcher, role });
        self
    }

    /// Frames tagged exactly `tag` are raw.
    pub fn raw(self, tag: impl Into<String>) -> Self {
        self.rule(TagMatcher::exact(tag), Role::Raw)
    }

    /// Frames tagged with any of `tags` are raw.
    pub fn raw_any<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule(TagMatcher::any_of(tags), Role::Raw)
    }

    /// Frames tagged with any of `tags` fill `slot`.
    pub fn calibration<I, S>(self, slot: CalibrationSlot, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule(TagMatcher::any_of(tags), Role::Calibration(slot))
    }

    /// Append `base` after this table's rules.
    pub fn then(mut self, base: &RoleTable) -> Self {
        self.rules.extend(base.rules.iter().cloned());
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Role of the first rule matching `tag`.
    pub fn resolve(&self, tag: &str) -> Option<Role> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(tag))
            .map(|rule| rule.role)
    }

    /// Sort `frames` into a fresh [`InputSet`], stamping the group of each
    /// matched frame. Never fails: cardinality problems are left to the
    /// verifier.
    pub fn classify(&self, frames: &mut [Frame]) -> InputSet {
        let mut input = InputSet::new();

        for frame in frames.iter_mut() {
            match self.resolve(frame.tag()) {
                Some(role) => {
                    frame.set_group(role.group());
                    tracing::debug!(
                        file = %frame.file().display(),
                        tag = frame.tag(),
                        ?role,
                        "Classified frame"
                    );
                    input.assign(role, frame.clone());
                }
                None => {
                    tracing::warn!(
                        file = %frame.file().display(),
                        tag = frame.tag(),
                        "Got frame with unexpected tag, ignoring"
                    );
                    input.reject(frame.clone());
                }
            }
        }

        tracing::info!(
            raw = input.raw().len(),
            calibration = input.slots().count(),
            unrecognized = input.unrecognized().len(),
            "Classified frameset"
        );

        input
    }
}
