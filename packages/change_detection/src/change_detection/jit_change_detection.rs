//! JIT Change Detection
//!
//! Corresponds to angular2/src/core/change_detection/jit_proto_change_detector.ts
//! and the `JitChangeDetection` strategy of change_detection.ts

use crate::change_detection::change_detection_jit_generator::{ChangeDetectorJitGenerator, ChangeDetectorProgram};
use crate::change_detection::change_detector::ChangeDetector;
use crate::change_detection::definition::ChangeDetectorDefinition;
use crate::change_detection::exceptions::Result;
use crate::change_detection::interfaces::ChangeDispatcher;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A generated program shared by every detector instantiated from it.
#[derive(Debug, Clone)]
pub struct JitProtoChangeDetector {
    program: Rc<ChangeDetectorProgram>,
}

impl JitProtoChangeDetector {
    pub fn new(definition: &ChangeDetectorDefinition) -> Result<Self> {
        let program = ChangeDetectorJitGenerator::new(definition).generate()?;
        Ok(Self::from_program(program))
    }

    pub fn from_program(program: ChangeDetectorProgram) -> Self {
        JitProtoChangeDetector {
            program: Rc::new(program),
        }
    }

    pub fn is_supported() -> bool {
        true
    }

    pub fn program(&self) -> &Rc<ChangeDetectorProgram> {
        &self.program
    }

    pub fn instantiate(&self, dispatcher: Rc<RefCell<dyn ChangeDispatcher>>) -> Result<ChangeDetector> {
        tracing::trace!(id = %self.program.id, "instantiating change detector");
        ChangeDetector::new(Rc::clone(&self.program), dispatcher)
    }
}

/// Proto detectors by definition id, so each definition is generated once.
#[derive(Debug, Default)]
pub struct ChangeDetection {
    proto_change_detectors: RefCell<IndexMap<String, JitProtoChangeDetector>>,
}

impl ChangeDetection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_proto_change_detector(&self, definition: &ChangeDetectorDefinition) -> Result<JitProtoChangeDetector> {
        if let Some(proto) = self.proto_change_detectors.borrow().get(&definition.id) {
            return Ok(proto.clone());
        }
        let proto = JitProtoChangeDetector::new(definition)?;
        self.proto_change_detectors
            .borrow_mut()
            .insert(definition.id.clone(), proto.clone());
        Ok(proto)
    }

    pub fn len(&self) -> usize {
        self.proto_change_detectors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
