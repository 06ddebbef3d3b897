//! Abstract Change Detector
//!
//! Corresponds to angular2/src/core/change_detection/abstract_change_detector.ts
//! Instance state of a detector and the operations generated procedures call.

use crate::change_detection::binding_record::BindingTarget;
use crate::change_detection::change_detection_util::{SimpleChange, SimpleChanges};
use crate::change_detection::change_detector_ref::ChangeDetectorRef;
use crate::change_detection::constants::{ChangeDetectionStrategy, ChangeDetectorState};
use crate::change_detection::directive_record::DirectiveIndex;
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::interfaces::{ChangeDispatcher, DirectiveRef, Directives, Locals};
use crate::change_detection::pipes::{Pipes, SelectedPipe};
use crate::change_detection::value::Value;
use crate::output::output_ast::Var;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub struct AbstractChangeDetector {
    id: String,
    dispatcher: Rc<RefCell<dyn ChangeDispatcher>>,
    binding_targets: Rc<[Option<BindingTarget>]>,
    directive_indices: Rc<[DirectiveIndex]>,
    strategy: ChangeDetectionStrategy,
    reference: ChangeDetectorRef,
    state: ChangeDetectorState,
    context: Option<Value>,
    locals: Option<Rc<Locals>>,
    pipes: Option<Rc<dyn Pipes>>,
    /// Previous value of every record; `Uninitialized` until first written.
    fields: Vec<Value>,
    pipe_slots: Vec<Option<SelectedPipe>>,
    directives: IndexMap<DirectiveIndex, DirectiveRef>,
    detectors: IndexMap<DirectiveIndex, ChangeDetectorRef>,
    property_binding_index: usize,
}

impl AbstractChangeDetector {
    pub fn new(
        id: impl Into<String>,
        dispatcher: Rc<RefCell<dyn ChangeDispatcher>>,
        number_of_property_proto_records: usize,
        binding_targets: Rc<[Option<BindingTarget>]>,
        directive_indices: Rc<[DirectiveIndex]>,
        strategy: ChangeDetectionStrategy,
    ) -> Self {
        let id = id.into();
        AbstractChangeDetector {
            reference: ChangeDetectorRef::new(id.clone(), strategy.change_detection_mode()),
            id,
            dispatcher,
            binding_targets,
            directive_indices,
            strategy,
            state: ChangeDetectorState::NeverChecked,
            context: None,
            locals: None,
            pipes: None,
            fields: vec![Value::Uninitialized; number_of_property_proto_records],
            pipe_slots: vec![None; number_of_property_proto_records],
            directives: IndexMap::new(),
            detectors: IndexMap::new(),
            property_binding_index: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn strategy(&self) -> ChangeDetectionStrategy {
        self.strategy
    }

    pub fn reference(&self) -> &ChangeDetectorRef {
        &self.reference
    }

    pub fn mode(&self) -> ChangeDetectionStrategy {
        self.reference.mode()
    }

    pub fn set_mode(&self, mode: ChangeDetectionStrategy) {
        self.reference.set_mode(mode);
    }

    pub fn state(&self) -> ChangeDetectorState {
        self.state
    }

    pub fn set_state(&mut self, state: ChangeDetectorState) {
        self.state = state;
    }

    pub fn hydrated(&self) -> bool {
        self.context.is_some()
    }

    pub fn binding_targets(&self) -> &[Option<BindingTarget>] {
        &self.binding_targets
    }

    pub fn directive_indices(&self) -> &[DirectiveIndex] {
        &self.directive_indices
    }

    /// Sets up the per-instance state a hydrated detector reads.
    pub fn hydrate_state(&mut self, context: Value, locals: Option<Rc<Locals>>, pipes: Option<Rc<dyn Pipes>>) {
        self.set_mode(self.strategy.change_detection_mode());
        self.context = Some(context);
        self.locals = locals;
        self.pipes = pipes;
        self.state = ChangeDetectorState::NeverChecked;
    }

    pub fn dehydrate_state(&mut self) {
        self.context = None;
        self.locals = None;
        self.pipes = None;
    }

    pub fn context(&self) -> Result<Value> {
        self.context
            .clone()
            .ok_or_else(|| ChangeDetectionError::DehydratedDetector(self.id.clone()))
    }

    pub fn locals(&self) -> Option<&Rc<Locals>> {
        self.locals.as_ref()
    }

    pub fn read_local(&self, name: &str) -> Result<Value> {
        match &self.locals {
            Some(locals) => locals.get(name),
            None => Err(ChangeDetectionError::UnknownLocal(name.to_string())),
        }
    }

    pub fn field(&self, index: usize) -> Value {
        self.fields.get(index).cloned().unwrap_or(Value::Uninitialized)
    }

    pub fn set_field(&mut self, index: usize, value: Value) {
        if index >= self.fields.len() {
            self.fields.resize(index + 1, Value::Uninitialized);
        }
        self.fields[index] = value;
    }

    pub fn pipe(&self, index: usize) -> Option<&SelectedPipe> {
        self.pipe_slots.get(index).and_then(Option::as_ref)
    }

    pub fn resolve_pipe(&mut self, index: usize, name: &str) -> Result<()> {
        let pipes = self
            .pipes
            .as_ref()
            .ok_or_else(|| ChangeDetectionError::PipeNotFound(name.to_string()))?;
        let selected = pipes.get(name)?;
        tracing::trace!(detector = %self.id, record = index, pipe = name, "resolved pipe");
        if index >= self.pipe_slots.len() {
            self.pipe_slots.resize(index + 1, None);
        }
        self.pipe_slots[index] = Some(selected);
        Ok(())
    }

    /// Tears down the pipe held for record `index`. Pure pipes are shared
    /// between records through the registry cache, so an instance already
    /// held by an earlier record was torn down there and is skipped.
    pub fn destroy_pipe(&self, index: usize) {
        let Some(pipe) = self.pipe(index) else {
            return;
        };
        let seen = self.pipe_slots[..index]
            .iter()
            .flatten()
            .any(|earlier| Rc::ptr_eq(&earlier.pipe, &pipe.pipe));
        if !seen {
            pipe.on_destroy();
        }
    }

    pub fn directive(&self, index: DirectiveIndex) -> Result<DirectiveRef> {
        self.directives
            .get(&index)
            .cloned()
            .ok_or_else(|| ChangeDetectionError::MissingDirective(index.name()))
    }

    pub fn detector(&self, index: DirectiveIndex) -> Result<ChangeDetectorRef> {
        self.detectors
            .get(&index)
            .cloned()
            .ok_or_else(|| ChangeDetectionError::MissingDetector(index.name()))
    }

    fn directive_index_at(&self, position: usize) -> Result<DirectiveIndex> {
        self.directive_indices
            .get(position)
            .copied()
            .ok_or_else(|| ChangeDetectionError::MissingDirective(position.to_string()))
    }

    pub fn hydrate_directive(&mut self, position: usize, directives: &dyn Directives) -> Result<()> {
        let index = self.directive_index_at(position)?;
        let directive = directives.get_directive_for(index)?;
        self.directives.insert(index, directive);
        Ok(())
    }

    pub fn hydrate_detector(&mut self, position: usize, directives: &dyn Directives) -> Result<()> {
        let index = self.directive_index_at(position)?;
        let detector = directives.get_detector_for(index)?;
        self.detectors.insert(index, detector);
        Ok(())
    }

    /// Puts an instance slot back to its uninitialized state.
    pub fn reset_slot(&mut self, var: Var) {
        match var {
            Var::Field(index) => self.set_field(index, Value::Uninitialized),
            Var::Pipe(index) => {
                if let Some(slot) = self.pipe_slots.get_mut(index) {
                    *slot = None;
                }
            }
            Var::Directive(index) => {
                self.directives.shift_remove(&index);
            }
            Var::Detector(index) => {
                self.detectors.shift_remove(&index);
            }
            _ => {}
        }
    }

    pub fn property_binding_index(&self) -> usize {
        self.property_binding_index
    }

    pub fn set_property_binding_index(&mut self, index: usize) {
        self.property_binding_index = index;
    }

    fn current_binding_target(&self) -> Result<&BindingTarget> {
        self.binding_targets
            .get(self.property_binding_index)
            .and_then(Option::as_ref)
            .ok_or(ChangeDetectionError::MissingBindingTarget(self.property_binding_index))
    }

    pub fn notify_dispatcher(&self, value: &Value) -> Result<()> {
        let target = self.current_binding_target()?;
        self.dispatcher.borrow_mut().notify_on_binding(target, value);
        Ok(())
    }

    pub fn log_binding_update(&self, value: &Value) -> Result<()> {
        let target = self.current_binding_target()?;
        self.dispatcher.borrow_mut().log_binding_update(target, value);
        Ok(())
    }

    /// Records a change of the current binding's directive input.
    pub fn add_change(&self, changes: &mut Option<SimpleChanges>, previous: Value, current: Value) -> Result<()> {
        let target = self.current_binding_target()?;
        changes
            .get_or_insert_with(SimpleChanges::new)
            .insert(target.name.clone(), SimpleChange::new(previous, current));
        Ok(())
    }

    pub fn throw_on_change_error(&self, previous: Value, current: Value) -> ChangeDetectionError {
        let expression = self
            .current_binding_target()
            .map(BindingTarget::describe)
            .unwrap_or_default();
        tracing::debug!(detector = %self.id, %expression, "expression changed after it was checked");
        ChangeDetectionError::ExpressionChangedAfterItHasBeenChecked {
            expression,
            previous,
            current,
        }
    }

    pub fn notify_after_content_checked(&self) {
        self.dispatcher.borrow_mut().notify_after_content_checked();
    }

    pub fn notify_after_view_checked(&self) {
        self.dispatcher.borrow_mut().notify_after_view_checked();
    }

    pub fn mark_as_check_once(&self) {
        self.reference.mark_as_check_once();
    }

    pub fn mark_path_to_root_as_check_once(&self) {
        self.reference.mark_path_to_root_as_check_once();
    }
}
