//! Change Detection Constants
//!
//! Corresponds to angular2/src/core/change_detection/constants.ts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Describes within the change detector which strategy will be used the next time change
/// detection is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChangeDetectionStrategy {
    /// The detector will be checked once; after the check its mode becomes `Checked`.
    CheckOnce = 0,
    /// The detector is skipped until its mode is reset to `CheckOnce`.
    Checked = 1,
    /// The detector is checked on every pass.
    CheckAlways = 2,
    /// The detector and its subtree are not part of change detection.
    Detached = 3,
    /// Hydrated detectors start in `CheckOnce`.
    OnPush = 4,
    /// Hydrated detectors start in `CheckAlways`.
    #[default]
    Default = 5,
}

impl ChangeDetectionStrategy {
    pub fn is_default(self) -> bool {
        self == ChangeDetectionStrategy::Default
    }

    /// The mode a freshly hydrated detector runs in.
    pub fn change_detection_mode(self) -> ChangeDetectionStrategy {
        if self.is_default() {
            ChangeDetectionStrategy::CheckAlways
        } else {
            ChangeDetectionStrategy::CheckOnce
        }
    }
}

impl fmt::Display for ChangeDetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChangeDetectorState {
    /// No check has completed since the detector was hydrated.
    NeverChecked = 0,
    CheckedBefore = 1,
    /// A check pass failed with something other than a verification error.
    Errored = 2,
}

impl fmt::Display for ChangeDetectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_detection_mode() {
        assert_eq!(
            ChangeDetectionStrategy::Default.change_detection_mode(),
            ChangeDetectionStrategy::CheckAlways
        );
        assert_eq!(
            ChangeDetectionStrategy::OnPush.change_detection_mode(),
            ChangeDetectionStrategy::CheckOnce
        );
    }
}
