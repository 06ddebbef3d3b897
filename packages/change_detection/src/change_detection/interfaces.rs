//! Change Detection Interfaces
//!
//! Corresponds to angular2/src/core/change_detection/interfaces.ts and parser/locals.ts
//! The collaborators a generated detector talks to

use crate::change_detection::binding_record::BindingTarget;
use crate::change_detection::change_detection_util::SimpleChanges;
use crate::change_detection::change_detector_ref::ChangeDetectorRef;
use crate::change_detection::directive_record::DirectiveIndex;
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives element binding updates from a detector.
pub trait ChangeDispatcher {
    fn notify_on_binding(&mut self, target: &BindingTarget, value: &Value);

    fn log_binding_update(&mut self, _target: &BindingTarget, _value: &Value) {}

    fn notify_after_content_checked(&mut self) {}

    fn notify_after_view_checked(&mut self) {}
}

/// A directive instance as seen by its host detector. Every hook defaults
/// to a no-op.
pub trait Directive {
    fn set_property(&mut self, name: &str, value: Value) -> Result<()>;

    /// The value host bindings of this directive are evaluated against.
    fn as_context(&self) -> Value {
        Value::Undefined
    }

    fn on_changes(&mut self, _changes: &SimpleChanges) {}

    fn on_init(&mut self) {}

    fn do_check(&mut self) {}

    fn after_content_init(&mut self) {}

    fn after_content_checked(&mut self) {}

    fn after_view_init(&mut self) {}

    fn after_view_checked(&mut self) {}
}

pub type DirectiveRef = Rc<RefCell<dyn Directive>>;

/// Lookup of the directive instances (and nested detectors) of one view.
pub trait Directives {
    fn get_directive_for(&self, index: DirectiveIndex) -> Result<DirectiveRef>;

    fn get_detector_for(&self, index: DirectiveIndex) -> Result<ChangeDetectorRef>;
}

#[derive(Default)]
pub struct DirectiveInstances {
    directives: IndexMap<DirectiveIndex, DirectiveRef>,
    detectors: IndexMap<DirectiveIndex, ChangeDetectorRef>,
}

impl DirectiveInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, index: DirectiveIndex, directive: DirectiveRef) -> &mut Self {
        self.directives.insert(index, directive);
        self
    }

    pub fn add_detector(&mut self, index: DirectiveIndex, detector: ChangeDetectorRef) -> &mut Self {
        self.detectors.insert(index, detector);
        self
    }
}

impl Directives for DirectiveInstances {
    fn get_directive_for(&self, index: DirectiveIndex) -> Result<DirectiveRef> {
        self.directives
            .get(&index)
            .cloned()
            .ok_or_else(|| ChangeDetectionError::MissingDirective(index.name()))
    }

    fn get_detector_for(&self, index: DirectiveIndex) -> Result<ChangeDetectorRef> {
        self.detectors
            .get(&index)
            .cloned()
            .ok_or_else(|| ChangeDetectionError::MissingDetector(index.name()))
    }
}

/// Template variables, chained to the locals of the enclosing view.
#[derive(Debug, Default)]
pub struct Locals {
    parent: Option<Rc<Locals>>,
    current: RefCell<IndexMap<String, Value>>,
}

impl Locals {
    pub fn new(parent: Option<Rc<Locals>>, current: IndexMap<String, Value>) -> Self {
        Locals {
            parent,
            current: RefCell::new(current),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        if self.current.borrow().contains_key(name) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.contains(name))
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.current.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(ChangeDetectionError::UnknownLocal(name.to_string())),
        }
    }

    /// Only variables declared when the locals were created can be set.
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        match self.current.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ChangeDetectionError::UnknownLocal(name.to_string())),
        }
    }

    pub fn clear_values(&self) {
        for value in self.current.borrow_mut().values_mut() {
            *value = Value::Null;
        }
    }
}
