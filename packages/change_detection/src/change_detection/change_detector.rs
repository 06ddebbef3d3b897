//! Change Detector
//!
//! Corresponds to the driver half of
//! angular2/src/core/change_detection/abstract_change_detector.ts
//! A hydrated instance of a generated program plus its place in the detector tree.

use crate::change_detection::abstract_change_detector::AbstractChangeDetector;
use crate::change_detection::binding_record::BindingTarget;
use crate::change_detection::change_detection_jit_generator::{ChangeDetectorProgram, VERIFY_CHANGES};
use crate::change_detection::change_detector_ref::ChangeDetectorRef;
use crate::change_detection::constants::{ChangeDetectionStrategy, ChangeDetectorState};
use crate::change_detection::directive_record::DirectiveIndex;
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::interfaces::{ChangeDispatcher, Directives, Locals};
use crate::change_detection::pipes::Pipes;
use crate::change_detection::value::Value;
use crate::output::output_interpreter::{execute, Frame};
use crate::output::output_ast::Stmt;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ChangeDetectorHandle = Rc<RefCell<ChangeDetector>>;

pub struct ChangeDetector {
    base: AbstractChangeDetector,
    program: Rc<ChangeDetectorProgram>,
    content_children: Vec<ChangeDetectorHandle>,
    view_children: Vec<ChangeDetectorHandle>,
}

impl ChangeDetector {
    pub fn new(program: Rc<ChangeDetectorProgram>, dispatcher: Rc<RefCell<dyn ChangeDispatcher>>) -> Result<Self> {
        let base = AbstractChangeDetector::new(
            program.id.clone(),
            dispatcher,
            program.record_count(),
            Rc::from(program.property_binding_targets.clone()),
            Rc::from(program.directive_indices.clone()),
            program.strategy,
        );
        let mut detector = ChangeDetector {
            base,
            program,
            content_children: Vec::new(),
            view_children: Vec::new(),
        };
        detector.dehydrate_directives(false)?;
        Ok(detector)
    }

    pub fn id(&self) -> &str {
        self.base.id()
    }

    pub fn program(&self) -> &Rc<ChangeDetectorProgram> {
        &self.program
    }

    pub fn reference(&self) -> &ChangeDetectorRef {
        self.base.reference()
    }

    pub fn mode(&self) -> ChangeDetectionStrategy {
        self.base.mode()
    }

    pub fn state(&self) -> ChangeDetectorState {
        self.base.state()
    }

    pub fn hydrated(&self) -> bool {
        self.base.hydrated()
    }

    /// Static table of binding targets, indexed by binding index.
    pub fn property_binding_targets(&self) -> &[Option<BindingTarget>] {
        self.base.binding_targets()
    }

    /// Static table of directive indices, in directive record order.
    pub fn directive_indices(&self) -> &[DirectiveIndex] {
        self.base.directive_indices()
    }

    pub fn add_content_child(&mut self, child: ChangeDetectorHandle) {
        child.borrow().reference().set_parent(Some(self.reference()));
        self.content_children.push(child);
    }

    pub fn remove_content_child(&mut self, child: &ChangeDetectorHandle) {
        self.content_children.retain(|c| !Rc::ptr_eq(c, child));
        child.borrow().reference().set_parent(None);
    }

    pub fn add_view_child(&mut self, child: ChangeDetectorHandle) {
        child.borrow().reference().set_parent(Some(self.reference()));
        self.view_children.push(child);
    }

    pub fn remove_view_child(&mut self, child: &ChangeDetectorHandle) {
        self.view_children.retain(|c| !Rc::ptr_eq(c, child));
        child.borrow().reference().set_parent(None);
    }

    pub fn hydrate(
        &mut self,
        context: Value,
        locals: Option<Rc<Locals>>,
        directives: &dyn Directives,
        pipes: Option<Rc<dyn Pipes>>,
    ) -> Result<()> {
        tracing::debug!(detector = %self.id(), "hydrating change detector");
        self.base.hydrate_state(context, locals, pipes);
        self.hydrate_directives(directives)
    }

    pub fn dehydrate(&mut self) -> Result<()> {
        tracing::debug!(detector = %self.id(), "dehydrating change detector");
        self.dehydrate_directives(true)?;
        self.base.dehydrate_state();
        Ok(())
    }

    pub fn hydrate_directives(&mut self, directives: &dyn Directives) -> Result<()> {
        let program = Rc::clone(&self.program);
        let mut frame = Frame::hydrate(directives);
        self.run(&mut frame, program.hydrate_directives.as_deref())?;
        Ok(())
    }

    /// Resets fields, pipes and directive slots. Held pipes are destroyed
    /// first when `destroy_pipes` is set.
    pub fn dehydrate_directives(&mut self, destroy_pipes: bool) -> Result<()> {
        let program = Rc::clone(&self.program);
        let mut frame = Frame::dehydrate(destroy_pipes);
        self.run(&mut frame, program.dehydrate_directives.as_deref())?;
        Ok(())
    }

    pub fn detect_changes(&mut self) -> Result<()> {
        self.run_detect_changes(false)
    }

    /// Runs a verification pass that fails on any binding that changed since
    /// the last `detect_changes`. A no-op when verification is compiled out.
    pub fn check_no_changes(&mut self) -> Result<()> {
        if VERIFY_CHANGES {
            self.run_detect_changes(true)
        } else {
            Ok(())
        }
    }

    fn run_detect_changes(&mut self, throw_on_change: bool) -> Result<()> {
        let mode = self.mode();
        if matches!(mode, ChangeDetectionStrategy::Detached | ChangeDetectionStrategy::Checked)
            || self.state() == ChangeDetectorState::Errored
        {
            return Ok(());
        }

        self.detect_changes_in_records(throw_on_change)?;
        for child in &self.content_children {
            child.borrow_mut().run_detect_changes(throw_on_change)?;
        }
        if !throw_on_change {
            self.after_content_lifecycle_callbacks()?;
        }
        for child in &self.view_children {
            child.borrow_mut().run_detect_changes(throw_on_change)?;
        }
        if !throw_on_change {
            self.after_view_lifecycle_callbacks()?;
        }

        if self.mode() == ChangeDetectionStrategy::CheckOnce {
            self.base.set_mode(ChangeDetectionStrategy::Checked);
        }
        self.base.set_state(ChangeDetectorState::CheckedBefore);
        Ok(())
    }

    /// Checks the records of this detector only. Any error other than a
    /// verification failure leaves the detector errored.
    pub fn detect_changes_in_records(&mut self, throw_on_change: bool) -> Result<()> {
        if !self.hydrated() {
            return Err(ChangeDetectionError::DehydratedDetector(self.id().to_string()));
        }
        let result = self.detect_changes_in_records_internal(throw_on_change);
        if let Err(err) = &result {
            if !err.is_expression_changed() {
                tracing::debug!(detector = %self.id(), error = %err, "change detection failed");
                self.base.set_state(ChangeDetectorState::Errored);
            }
        }
        result
    }

    pub fn detect_changes_in_records_internal(&mut self, throw_on_change: bool) -> Result<()> {
        let program = Rc::clone(&self.program);
        let mut frame = Frame::detect_changes(throw_on_change);
        self.run(&mut frame, Some(&program.detect_changes_in_records))?;
        Ok(())
    }

    pub fn after_content_lifecycle_callbacks(&mut self) -> Result<()> {
        self.base.notify_after_content_checked();
        self.after_content_lifecycle_callbacks_internal()
    }

    pub fn after_content_lifecycle_callbacks_internal(&mut self) -> Result<()> {
        let program = Rc::clone(&self.program);
        self.run(&mut Frame::new(), program.after_content_lifecycle_callbacks.as_deref())?;
        Ok(())
    }

    pub fn after_view_lifecycle_callbacks(&mut self) -> Result<()> {
        self.base.notify_after_view_checked();
        self.after_view_lifecycle_callbacks_internal()
    }

    pub fn after_view_lifecycle_callbacks_internal(&mut self) -> Result<()> {
        let program = Rc::clone(&self.program);
        self.run(&mut Frame::new(), program.after_view_lifecycle_callbacks.as_deref())?;
        Ok(())
    }

    /// Dispatches an event to its handlers with `$event` bound in a child of
    /// the detector locals. Returns `false` when a handler asked to prevent
    /// the default action.
    pub fn handle_event(&mut self, event_name: &str, el_index: usize, event: Value) -> Result<bool> {
        if !self.hydrated() {
            return Err(ChangeDetectionError::DehydratedDetector(self.id().to_string()));
        }
        let locals = Rc::new(Locals::new(
            self.base.locals().cloned(),
            IndexMap::from([("$event".to_string(), event)]),
        ));
        let prevent_default = self.handle_event_internal(event_name, el_index, locals)?;
        self.mark_path_to_root_as_check_once();
        Ok(!prevent_default)
    }

    /// Runs the matching handlers and returns whether any asked to prevent
    /// the default action.
    pub fn handle_event_internal(&mut self, event_name: &str, el_index: usize, locals: Rc<Locals>) -> Result<bool> {
        let program = Rc::clone(&self.program);
        let mut frame = Frame::handle_event(event_name, el_index, locals);
        let result = self.run(&mut frame, program.handle_event.as_deref())?;
        Ok(result.is_truthy())
    }

    pub fn mark_as_check_once(&self) {
        self.base.mark_as_check_once();
    }

    pub fn mark_path_to_root_as_check_once(&self) {
        self.base.mark_path_to_root_as_check_once();
    }

    /// Procedures the program does not carry do nothing.
    fn run(&mut self, frame: &mut Frame<'_>, body: Option<&[Stmt]>) -> Result<Value> {
        match body {
            Some(body) => execute(&mut self.base, frame, body),
            None => Ok(Value::Undefined),
        }
    }
}

impl std::fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("id", &self.id())
            .field("mode", &self.mode())
            .field("state", &self.state())
            .finish()
    }
}
