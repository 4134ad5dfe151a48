//! Per-run collection of classified frames.

use std::collections::BTreeMap;

use crate::classify::{CalibrationSlot, Role};
use crate::frame::Frame;

/// Frames sorted by role during one classification pass.
///
/// Raw frames keep discovery order. Calibration slots are single-valued by
/// contract, but every frame routed to a slot is kept so that the verifier
/// can report a conflict instead of silently keeping the last one.
#[derive(Debug, Clone, Default)]
pub struct InputSet {
    raw: Vec<Frame>,
    calibration: BTreeMap<CalibrationSlot, Vec<Frame>>,
    unrecognized: Vec<Frame>,
}

impl InputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn assign(&mut self, role: Role, frame: Frame) {
        match role {
            Role::Raw => self.raw.push(frame),
            Role::Calibration(slot) => self.calibration.entry(slot).or_default().push(frame),
        }
    }

    pub(crate) fn reject(&mut self, frame: Frame) {
        self.unrecognized.push(frame);
    }

    pub fn raw(&self) -> &[Frame] {
        &self.raw
    }

    /// First frame routed to `slot`.
    pub fn calibration(&self, slot: CalibrationSlot) -> Option<&Frame> {
        self.calibration_frames(slot).first()
    }

    /// Every frame routed to `slot`.
    pub fn calibration_frames(&self, slot: CalibrationSlot) -> &[Frame] {
        self.calibration
            .get(&slot)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Slots that received at least one frame.
    pub fn slots(&self) -> impl Iterator<Item = CalibrationSlot> + '_ {
        self.calibration.keys().copied()
    }

    pub fn unrecognized(&self) -> &[Frame] {
        &self.unrecognized
    }

    /// Raw frames followed by calibration frames: the frames a product is made from.
    pub fn used_frames(&self) -> Vec<Frame> {
        self.raw
            .iter()
            .chain(self.calibration.values().flatten())
            .cloned()
            .collect()
    }

    /// Total number of frames seen.
    pub fn len(&self) -> usize {
        self.raw.len()
            + self.calibration.values().map(Vec::len).sum::<usize>()
            + self.unrecognized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_routes_by_role() {
        let mut set = InputSet::new();
        set.assign(Role::Raw, Frame::new("a.fits", "DARK_LM_RAW"));
        set.assign(Role::Raw, Frame::new("b.fits", "DARK_LM_RAW"));
        set.assign(
            Role::Calibration(CalibrationSlot::MasterDark),
            Frame::new("d.fits", "MASTER_DARK_2RG"),
        );
        set.reject(Frame::new("x.fits", "JUNK"));

        let raw: Vec<String> = set.raw().iter().map(Frame::id).collect();
        assert_eq!(raw, vec!["a.fits", "b.fits"]);
        assert_eq!(
            set.calibration(CalibrationSlot::MasterDark).map(Frame::id),
            Some("d.fits".to_string())
        );
        assert!(set.calibration(CalibrationSlot::MasterFlat).is_none());
        assert!(set.calibration_frames(CalibrationSlot::MasterFlat).is_empty());
        assert_eq!(set.unrecognized().len(), 1);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn second_frame_in_slot_is_kept_not_overwritten() {
        let mut set = InputSet::new();
        let slot = Role::Calibration(CalibrationSlot::MasterFlat);
        set.assign(slot, Frame::new("flat_1.fits", "MASTER_FLAT_LAMP"));
        set.assign(slot, Frame::new("flat_2.fits", "MASTER_IMG_FLAT_LAMP_LM"));

        let frames = set.calibration_frames(CalibrationSlot::MasterFlat);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id(), "flat_1.fits");
        assert_eq!(frames[1].id(), "flat_2.fits");
    }

    #[test]
    fn used_frames_excludes_unrecognized() {
        let mut set = InputSet::new();
        set.assign(Role::Raw, Frame::new("raw.fits", "LM_IMAGE_SCI_RAW"));
        set.assign(
            Role::Calibration(CalibrationSlot::MasterDark),
            Frame::new("dark.fits", "MASTER_DARK_2RG"),
        );
        set.reject(Frame::new("other.fits", "OTHER"));

        let used: Vec<String> = set.used_frames().iter().map(Frame::id).collect();
        assert_eq!(used, vec!["raw.fits", "dark.fits"]);
    }

    #[test]
    fn empty_set() {
        let set = InputSet::new();
        assert!(set.is_empty());
        assert_eq!(set.slots().count(), 0);
    }
}
