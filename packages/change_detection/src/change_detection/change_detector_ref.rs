//! Change Detector Reference
//!
//! Corresponds to angular2/src/core/change_detection/change_detector_ref.ts
//! The shared handle to a detector's mode and its position in the detector tree

use crate::change_detection::constants::ChangeDetectionStrategy;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug)]
struct DetectorNode {
    id: String,
    mode: Cell<ChangeDetectionStrategy>,
    parent: RefCell<Weak<DetectorNode>>,
}

/// Cloning yields another handle to the same detector.
#[derive(Clone)]
pub struct ChangeDetectorRef(Rc<DetectorNode>);

impl ChangeDetectorRef {
    pub fn new(id: impl Into<String>, mode: ChangeDetectionStrategy) -> Self {
        ChangeDetectorRef(Rc::new(DetectorNode {
            id: id.into(),
            mode: Cell::new(mode),
            parent: RefCell::new(Weak::new()),
        }))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn mode(&self) -> ChangeDetectionStrategy {
        self.0.mode.get()
    }

    pub fn set_mode(&self, mode: ChangeDetectionStrategy) {
        self.0.mode.set(mode);
    }

    pub fn parent(&self) -> Option<ChangeDetectorRef> {
        self.0.parent.borrow().upgrade().map(ChangeDetectorRef)
    }

    pub fn set_parent(&self, parent: Option<&ChangeDetectorRef>) {
        *self.0.parent.borrow_mut() = parent.map(|p| Rc::downgrade(&p.0)).unwrap_or_default();
    }

    pub fn mark_as_check_once(&self) {
        self.set_mode(ChangeDetectionStrategy::CheckOnce);
    }

    /// Walks up to the root turning `Checked` ancestors back into
    /// `CheckOnce`. Stops at the first detached detector.
    pub fn mark_path_to_root_as_check_once(&self) {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            match node.mode() {
                ChangeDetectionStrategy::Detached => break,
                ChangeDetectionStrategy::Checked => node.mark_as_check_once(),
                _ => {}
            }
            current = node.parent();
        }
    }

    pub fn detach(&self) {
        self.set_mode(ChangeDetectionStrategy::Detached);
    }

    pub fn reattach(&self) {
        self.set_mode(ChangeDetectionStrategy::CheckAlways);
        self.mark_path_to_root_as_check_once();
    }

    pub fn ptr_eq(&self, other: &ChangeDetectorRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ChangeDetectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetectorRef")
            .field("id", &self.0.id)
            .field("mode", &self.mode())
            .finish()
    }
}
