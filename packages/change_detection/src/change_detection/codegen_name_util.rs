//! Codegen Name Util
//!
//! Corresponds to angular2/src/core/change_detection/codegen_name_util.ts
//! Names every slot a generated detector uses and emits the statements that
//! declare and tear them down.

use crate::change_detection::directive_record::{DirectiveIndex, DirectiveRecord};
use crate::change_detection::proto_record::{EventBinding, ProtoRecord};
use crate::output::output_ast::{bool_literal, Expr, Stmt, Var};
use once_cell::sync::Lazy;
use regex::Regex;

static ILLEGAL_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").unwrap());

const CONTEXT_ACCESSOR: &str = "context";
const STATE_ACCESSOR: &str = "state";
const LOCALS_ACCESSOR: &str = "locals";
const PIPES_ACCESSOR: &str = "pipes";
const PROPERTY_BINDING_INDEX: &str = "propertyBindingIndex";
const PREVENT_DEFAULT_ACCESSOR: &str = "preventDefault";
const IS_CHANGED_LOCAL: &str = "isChanged";
const CHANGES_LOCAL: &str = "changes";

/// Strips every character that cannot appear in an identifier.
pub fn sanitize_name(s: &str) -> String {
    ILLEGAL_CHARS_RE.replace_all(s, "").into_owned()
}

/// Record-derived names carry the record index right after a one letter
/// prefix, so names of distinct slots never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenNameUtil {
    sanitized_names: Vec<String>,
    sanitized_event_names: Vec<Vec<String>>,
    /// Records that are dirty checked and keep their previous value in a field.
    field_records: Vec<usize>,
    pipe_records: Vec<usize>,
    /// Records whose change flag is read by a pure function or a pipe.
    tracked: Vec<bool>,
    directives: Vec<(DirectiveIndex, bool)>,
}

impl CodegenNameUtil {
    pub fn new(
        records: &[ProtoRecord],
        event_bindings: &[EventBinding],
        directive_records: &[DirectiveRecord],
    ) -> Self {
        let mut tracked: Vec<bool> = records.iter().map(|r| r.argument_to_pure_function).collect();
        for record in records {
            let reads: Vec<usize> = if record.is_pipe_record() {
                record.dependencies().collect()
            } else if record.is_pure_function() {
                record.args.to_vec()
            } else {
                continue;
            };
            for index in reads {
                if let Some(flag) = tracked.get_mut(index) {
                    *flag = true;
                }
            }
        }

        CodegenNameUtil {
            sanitized_names: records.iter().map(|r| sanitize_name(&r.name)).collect(),
            sanitized_event_names: event_bindings
                .iter()
                .map(|eb| eb.records.iter().map(|r| sanitize_name(&r.name)).collect())
                .collect(),
            field_records: records
                .iter()
                .enumerate()
                .filter(|(i, r)| r.should_be_checked() || tracked[*i])
                .map(|(i, _)| i)
                .collect(),
            pipe_records: records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_pipe_record())
                .map(|(i, _)| i)
                .collect(),
            tracked,
            directives: directive_records
                .iter()
                .map(|d| (d.directive_index, !d.is_default_change_detection()))
                .collect(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.sanitized_names.len()
    }

    pub fn event_record_counts(&self) -> Vec<usize> {
        self.sanitized_event_names.iter().map(Vec::len).collect()
    }

    pub fn is_tracked(&self, index: usize) -> bool {
        self.tracked.get(index).copied().unwrap_or(false)
    }

    /// Whether record `index` is compared against its previous value.
    pub fn has_field(&self, index: usize) -> bool {
        self.field_records.contains(&index)
    }

    pub fn get_local_name(&self, index: usize) -> String {
        format!("l{}_{}", index, self.record_name(index))
    }

    pub fn get_context_local_name(&self) -> String {
        format!("l_{}", CONTEXT_ACCESSOR)
    }

    pub fn get_change_name(&self, index: usize) -> String {
        format!("c{}_{}", index, self.record_name(index))
    }

    pub fn get_field_name(&self, index: usize) -> String {
        format!("this.f{}_{}", index, self.record_name(index))
    }

    pub fn get_pipe_name(&self, index: usize) -> String {
        format!("this.p{}_{}", index, self.record_name(index))
    }

    pub fn get_event_local_name(&self, binding: usize, index: usize) -> String {
        let name = self
            .sanitized_event_names
            .get(binding)
            .and_then(|names| names.get(index))
            .map(String::as_str)
            .unwrap_or("");
        format!("e{}_{}_{}", binding, index, name)
    }

    pub fn get_directive_name(&self, index: DirectiveIndex) -> String {
        format!("this.directive_{}", index.name())
    }

    pub fn get_detector_name(&self, index: DirectiveIndex) -> String {
        format!("this.detector_{}", index.name())
    }

    pub fn get_context_field_name(&self) -> String {
        format!("this.{}", CONTEXT_ACCESSOR)
    }

    pub fn get_state_name(&self) -> String {
        format!("this.{}", STATE_ACCESSOR)
    }

    pub fn get_locals_accessor_name(&self) -> String {
        format!("this.{}", LOCALS_ACCESSOR)
    }

    pub fn get_pipes_accessor_name(&self) -> String {
        format!("this.{}", PIPES_ACCESSOR)
    }

    pub fn get_property_binding_index(&self) -> String {
        format!("this.{}", PROPERTY_BINDING_INDEX)
    }

    pub fn get_prevent_default_accessor(&self) -> &'static str {
        PREVENT_DEFAULT_ACCESSOR
    }

    /// The rendered name of any slot.
    pub fn name(&self, var: Var) -> String {
        match var {
            Var::ThrowOnChange => "throwOnChange".to_string(),
            Var::DestroyPipes => "destroyPipes".to_string(),
            Var::Context => self.get_context_local_name(),
            Var::Local(i) => self.get_local_name(i),
            Var::Change(i) => self.get_change_name(i),
            Var::EventLocal { binding, record } => self.get_event_local_name(binding, record),
            Var::Field(i) => self.get_field_name(i),
            Var::Pipe(i) => self.get_pipe_name(i),
            Var::Directive(d) => self.get_directive_name(d),
            Var::Detector(d) => self.get_detector_name(d),
            Var::IsChanged => IS_CHANGED_LOCAL.to_string(),
            Var::Changes => CHANGES_LOCAL.to_string(),
            Var::PreventDefault => PREVENT_DEFAULT_ACCESSOR.to_string(),
            Var::PropertyBindingIndex => self.get_property_binding_index(),
        }
    }

    /// `var l_context = this.context, l0_a, c0_a = false, ...;`
    pub fn gen_init_locals(&self) -> Stmt {
        let mut declarations = vec![(Var::Context, Some(Expr::InstanceContext))];
        for index in 0..self.record_count() {
            declarations.push((Var::Local(index), None));
            if self.is_tracked(index) {
                declarations.push((Var::Change(index), Some(bool_literal(false))));
            }
        }
        Stmt::DeclareVars(declarations)
    }

    /// Declares the context and every event local, or nothing when no event
    /// binding has records.
    pub fn gen_init_event_locals(&self) -> Option<Stmt> {
        let mut declarations = vec![(Var::Context, Some(Expr::InstanceContext))];
        for (binding, names) in self.sanitized_event_names.iter().enumerate() {
            for record in 0..names.len() {
                declarations.push((Var::EventLocal { binding, record }, None));
            }
        }
        (declarations.len() > 1).then_some(Stmt::DeclareVars(declarations))
    }

    /// Slots reset when the detector is dehydrated.
    pub fn get_all_fields(&self) -> Vec<Var> {
        let mut fields: Vec<Var> = self.field_records.iter().map(|&i| Var::Field(i)).collect();
        fields.extend(self.pipe_records.iter().map(|&i| Var::Pipe(i)));
        for &(index, has_detector) in &self.directives {
            fields.push(Var::Directive(index));
            if has_detector {
                fields.push(Var::Detector(index));
            }
        }
        fields
    }

    pub fn get_all_field_names(&self) -> Vec<String> {
        self.get_all_fields().into_iter().map(|v| self.name(v)).collect()
    }

    pub fn gen_dehydrate_fields(&self) -> Option<Stmt> {
        let fields = self.get_all_fields();
        (!fields.is_empty()).then_some(Stmt::DehydrateFields(fields))
    }

    pub fn gen_pipe_on_destroy(&self) -> Vec<Stmt> {
        self.pipe_records.iter().map(|&i| Stmt::DestroyPipe(i)).collect()
    }

    fn record_name(&self, index: usize) -> &str {
        self.sanitized_names.get(index).map(String::as_str).unwrap_or("")
    }
}
