//! Change Detector JIT Generator
//!
//! Corresponds to angular2/src/core/change_detection/change_detection_jit_generator.ts
//!
//! The generator takes a list of proto records and builds the program a
//! hand-written detector for the same bindings would run: one dirty check
//! per record, skip blocks for conditional expressions, memoized pure
//! functions and the lifecycle calls of every directive.

use crate::change_detection::binding_record::{BindingRecord, BindingTarget};
use crate::change_detection::codegen_logic_util::{malformed, CodegenLogicUtil};
use crate::change_detection::codegen_name_util::{sanitize_name, CodegenNameUtil};
use crate::change_detection::constants::ChangeDetectionStrategy;
use crate::change_detection::definition::{ChangeDetectorDefinition, ChangeDetectorGenConfig};
use crate::change_detection::directive_record::{DirectiveIndex, LifecycleHook};
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::proto_record::{EventBinding, ProtoRecord, RecordType};
use crate::change_detection::value::Literal;
use crate::output::abstract_emitter::ChangeDetectorEmitter;
use crate::output::output_ast::{
    assign, bool_literal, if_else, if_stmt, literal, not, read, Expr, Stmt, Var,
};

/// Whether generated detectors verify that nothing changes during
/// `checkNoChanges`. Release builds drop the check unless the
/// `verify-changes` feature is on.
pub const VERIFY_CHANGES: bool = cfg!(any(debug_assertions, feature = "verify-changes"));

/// The generated procedures and static tables of one definition. Shared by
/// every detector instantiated from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDetectorProgram {
    pub id: String,
    pub type_name: String,
    pub strategy: ChangeDetectionStrategy,
    pub gen_config: ChangeDetectorGenConfig,
    pub names: CodegenNameUtil,
    pub detect_changes_in_records: Vec<Stmt>,
    pub handle_event: Option<Vec<Stmt>>,
    pub after_content_lifecycle_callbacks: Option<Vec<Stmt>>,
    pub after_view_lifecycle_callbacks: Option<Vec<Stmt>>,
    pub hydrate_directives: Option<Vec<Stmt>>,
    pub dehydrate_directives: Option<Vec<Stmt>>,
    /// Parallel to the definition's binding records.
    pub property_binding_targets: Vec<Option<BindingTarget>>,
    /// Parallel to the definition's directive records.
    pub directive_indices: Vec<DirectiveIndex>,
}

impl ChangeDetectorProgram {
    pub fn record_count(&self) -> usize {
        self.names.record_count()
    }

    /// JavaScript-like rendering of the program.
    pub fn source(&self) -> String {
        ChangeDetectorEmitter::new(self).emit()
    }
}

pub struct ChangeDetectorJitGenerator<'a> {
    definition: &'a ChangeDetectorDefinition,
    names: CodegenNameUtil,
    type_name: String,
}

impl<'a> ChangeDetectorJitGenerator<'a> {
    pub fn new(definition: &'a ChangeDetectorDefinition) -> Self {
        let names = CodegenNameUtil::new(
            &definition.records,
            &definition.event_bindings,
            &definition.directive_records,
        );
        ChangeDetectorJitGenerator {
            definition,
            names,
            type_name: sanitize_name(&format!("ChangeDetector_{}", definition.id)),
        }
    }

    pub fn generate(self) -> Result<ChangeDetectorProgram> {
        let def = self.definition;
        tracing::debug!(
            id = %def.id,
            records = def.records.len(),
            event_bindings = def.event_bindings.len(),
            directives = def.directive_records.len(),
            "generating change detector"
        );
        self.validate()?;

        let logic = CodegenLogicUtil::new(&self.names);
        let detect_changes_in_records = self.gen_detect_changes_in_records(&logic)?;
        let handle_event = self.maybe_gen_handle_event_internal(&logic)?;
        let after_content = non_empty(logic.gen_content_lifecycle_callbacks(&def.directive_records));
        let after_view = non_empty(logic.gen_view_lifecycle_callbacks(&def.directive_records));
        let hydrate_directives = self.maybe_gen_hydrate_directives(&logic);
        let dehydrate_directives = self.maybe_gen_dehydrate_directives();
        let property_binding_targets =
            logic.gen_property_binding_targets(&def.binding_records, def.gen_config.gen_debug_info);
        let directive_indices = logic.gen_directive_indices(&def.directive_records);

        Ok(ChangeDetectorProgram {
            id: def.id.clone(),
            type_name: self.type_name,
            strategy: def.strategy,
            gen_config: def.gen_config.clone(),
            names: self.names,
            detect_changes_in_records,
            handle_event,
            after_content_lifecycle_callbacks: after_content,
            after_view_lifecycle_callbacks: after_view,
            hydrate_directives,
            dehydrate_directives,
            property_binding_targets,
            directive_indices,
        })
    }

    fn validate(&self) -> Result<()> {
        let def = self.definition;
        validate_records(&def.records)?;
        for record in &def.records {
            let binding = self.binding(record)?;
            if record.is_life_cycle_record() && binding.directive_record.is_none() {
                return Err(ChangeDetectionError::MissingDirectiveRecord(record.binding_index));
            }
        }
        for eb in &def.event_bindings {
            validate_records(&eb.records)?;
            if let Some(record) = eb
                .records
                .iter()
                .find(|r| r.is_pipe_record() || r.is_life_cycle_record())
            {
                return Err(malformed(record, format!("not supported in handler of '{}'", eb.full_name())));
            }
        }
        Ok(())
    }

    fn binding(&self, record: &ProtoRecord) -> Result<&'a BindingRecord> {
        self.definition
            .binding_records
            .get(record.binding_index)
            .ok_or(ChangeDetectionError::MissingBinding(record.binding_index))
    }

    fn gen_detect_changes_in_records(&self, logic: &CodegenLogicUtil<'_>) -> Result<Vec<Stmt>> {
        let records = &self.definition.records;
        let mut block = SkipBlockBuilder::new(vec![
            self.names.gen_init_locals(),
            Stmt::DeclareVars(vec![
                (Var::IsChanged, Some(bool_literal(false))),
                (Var::Changes, Some(Expr::Literal(Literal::Null))),
            ]),
        ]);

        for (i, r) in records.iter().enumerate() {
            let prev = i.checked_sub(1).and_then(|p| records.get(p));
            if let Some(stmt) = self.maybe_first_in_binding(r, prev)? {
                block.push(stmt);
            }

            if r.is_life_cycle_record() {
                block.push(self.gen_directive_lifecycle(r)?);
            } else if r.is_pipe_record() {
                block.extend(self.gen_pipe_check(r)?);
            } else if r.is_conditional_skip_record() {
                block.open(r, gen_skip_condition(r, Var::Local)?)?;
            } else if r.is_unconditional_skip_record() {
                block.open_else(r)?;
            } else {
                block.extend(self.gen_reference_check(logic, r)?);
            }

            block.extend(self.maybe_gen_last_in_directive(r)?);
            block.close_ended(i);
        }
        block.finish()
    }

    fn maybe_gen_handle_event_internal(&self, logic: &CodegenLogicUtil<'_>) -> Result<Option<Vec<Stmt>>> {
        let event_bindings = &self.definition.event_bindings;
        if event_bindings.is_empty() {
            return Ok(None);
        }
        let mut stmts = vec![Stmt::DeclareVars(vec![(
            Var::PreventDefault,
            Some(bool_literal(false)),
        )])];
        stmts.extend(self.names.gen_init_event_locals());
        for (index, eb) in event_bindings.iter().enumerate() {
            stmts.push(self.gen_event_binding(logic, index, eb)?);
        }
        stmts.push(Stmt::Return(read(Var::PreventDefault)));
        Ok(Some(stmts))
    }

    fn gen_event_binding(&self, logic: &CodegenLogicUtil<'_>, index: usize, eb: &EventBinding) -> Result<Stmt> {
        let local = |record| Var::EventLocal {
            binding: index,
            record,
        };
        let mut block = SkipBlockBuilder::new(Vec::new());
        for (i, r) in eb.records.iter().enumerate() {
            if r.is_conditional_skip_record() {
                block.open(r, gen_skip_condition(r, local)?)?;
            } else if r.is_unconditional_skip_record() {
                block.open_else(r)?;
            } else {
                block.push(logic.gen_event_binding_eval_value(index, r)?);
                if r.last_in_binding {
                    block.extend(gen_mark_path_to_root_as_check_once(eb));
                    block.push(if_stmt(
                        Expr::IsFalse(Box::new(read(local(r.self_index)))),
                        vec![assign(Var::PreventDefault, bool_literal(true))],
                    ));
                }
            }
            block.close_ended(i);
        }
        Ok(if_stmt(
            Expr::EventMatches {
                event_name: eb.full_name(),
                el_index: eb.el_index,
            },
            block.finish()?,
        ))
    }

    fn maybe_gen_hydrate_directives(&self, logic: &CodegenLogicUtil<'_>) -> Option<Vec<Stmt>> {
        let directive_records = &self.definition.directive_records;
        let mut stmts = logic.gen_hydrate_directives(directive_records);
        stmts.extend(logic.gen_hydrate_detectors(directive_records));
        non_empty(stmts)
    }

    fn maybe_gen_dehydrate_directives(&self) -> Option<Vec<Stmt>> {
        let mut stmts = Vec::new();
        let destroy_pipes = self.names.gen_pipe_on_destroy();
        if !destroy_pipes.is_empty() {
            stmts.push(if_stmt(read(Var::DestroyPipes), destroy_pipes));
        }
        stmts.extend(self.names.gen_dehydrate_fields());
        non_empty(stmts)
    }

    fn gen_directive_lifecycle(&self, r: &ProtoRecord) -> Result<Stmt> {
        let hook: LifecycleHook = r.name.parse()?;
        let directive = self.directive_of(r)?;
        let call = vec![Stmt::CallLifecycle { directive, hook }];
        let not_throw = not(read(Var::ThrowOnChange));
        match hook {
            LifecycleHook::DoCheck => Ok(if_stmt(not_throw, call)),
            LifecycleHook::OnInit => Ok(if_stmt(
                Expr::And(vec![not_throw, Expr::StateIsNeverChecked]),
                call,
            )),
            LifecycleHook::OnChanges => Ok(if_stmt(Expr::And(vec![not_throw, Expr::HasChanges]), call)),
            _ => Err(ChangeDetectionError::UnknownLifecycleEvent(r.name.clone())),
        }
    }

    fn gen_pipe_check(&self, r: &ProtoRecord) -> Result<Vec<Stmt>> {
        let i = r.self_index;
        let init = if_stmt(
            Expr::PipeUninitialized(i),
            vec![Stmt::ResolvePipe {
                record: i,
                name: r.name.clone(),
            }],
        );
        let read_value = assign(
            Var::Local(i),
            Expr::PipeTransform {
                pipe: i,
                context: Box::new(context_of(r)),
                args: r.args.iter().map(|&a| read(Var::Local(a))).collect(),
            },
        );

        let mut gen = vec![read_value];
        if self.names.has_field(i) {
            let mut on_change = vec![assign(Var::Local(i), Expr::UnwrapValue(Box::new(read(Var::Local(i)))))];
            on_change.extend(self.gen_on_change(r)?);
            gen.push(if_stmt(self.gen_not_identical(i), on_change));
        }

        let mut condition = vec![not(Expr::PipeIsPure(i))];
        condition.extend(r.dependencies().map(|a| read(Var::Change(a))));
        // A pure pipe over the component context has no change flag to watch.
        if r.dependencies().next().is_none() {
            condition.push(Expr::FieldUninitialized(i));
        }
        let check = if r.is_used_by_other_record() {
            if_else(Expr::Or(condition), gen, vec![self.gen_reuse_previous(i)])
        } else {
            if_stmt(Expr::Or(condition), gen)
        };
        Ok(vec![init, check])
    }

    fn gen_reference_check(&self, logic: &CodegenLogicUtil<'_>, r: &ProtoRecord) -> Result<Vec<Stmt>> {
        let i = r.self_index;
        let mut gen = vec![logic.gen_property_binding_eval_value(r)?];
        if self.names.has_field(i) {
            gen.push(if_stmt(self.gen_not_identical(i), self.gen_on_change(r)?));
        }
        if !r.is_pure_function() {
            return Ok(gen);
        }

        let condition = if r.args.is_empty() {
            Expr::FieldUninitialized(i)
        } else {
            Expr::Or(r.args.iter().map(|&a| read(Var::Change(a))).collect())
        };
        if r.is_used_by_other_record() {
            Ok(vec![if_else(condition, gen, vec![self.gen_reuse_previous(i)])])
        } else {
            Ok(vec![if_stmt(condition, gen)])
        }
    }

    fn gen_not_identical(&self, i: usize) -> Expr {
        Expr::LooseNotIdentical(Box::new(read(Var::Field(i))), Box::new(read(Var::Local(i))))
    }

    fn gen_reuse_previous(&self, i: usize) -> Stmt {
        assign(Var::Local(i), read(Var::Field(i)))
    }

    /// Runs when record `r` holds a value not identical to its previous one.
    fn gen_on_change(&self, r: &ProtoRecord) -> Result<Vec<Stmt>> {
        let i = r.self_index;
        let mut stmts = Vec::new();
        if self.names.is_tracked(i) {
            stmts.push(assign(Var::Change(i), bool_literal(true)));
        }
        stmts.extend(self.gen_update_directive_or_element(r)?);
        stmts.extend(self.gen_add_to_changes(r)?);
        stmts.push(assign(Var::Field(i), read(Var::Local(i))));
        Ok(stmts)
    }

    fn gen_update_directive_or_element(&self, r: &ProtoRecord) -> Result<Vec<Stmt>> {
        if !r.last_in_binding {
            return Ok(Vec::new());
        }
        let i = r.self_index;
        let binding = self.binding(r)?;
        let target = binding
            .target
            .as_ref()
            .ok_or(ChangeDetectionError::MissingBindingTarget(r.binding_index))?;

        let mut stmts = Vec::new();
        if VERIFY_CHANGES {
            stmts.push(if_stmt(
                read(Var::ThrowOnChange),
                vec![Stmt::ThrowOnChangeError {
                    previous: read(Var::Field(i)),
                    current: read(Var::Local(i)),
                }],
            ));
        }
        if target.is_directive() {
            stmts.push(Stmt::SetDirectiveProperty {
                directive: self.directive_of(r)?,
                property: target.name.clone(),
                value: read(Var::Local(i)),
            });
            if self.definition.gen_config.log_binding_update {
                stmts.push(Stmt::LogBindingUpdate(read(Var::Local(i))));
            }
            stmts.push(assign(Var::IsChanged, bool_literal(true)));
        } else {
            stmts.push(Stmt::NotifyDispatcher(read(Var::Local(i))));
            if self.definition.gen_config.log_binding_update {
                stmts.push(Stmt::LogBindingUpdate(read(Var::Local(i))));
            }
        }
        Ok(stmts)
    }

    fn gen_add_to_changes(&self, r: &ProtoRecord) -> Result<Vec<Stmt>> {
        if !self.binding(r)?.call_on_changes() {
            return Ok(Vec::new());
        }
        Ok(vec![Stmt::AddChange {
            previous: read(Var::Field(r.self_index)),
            current: read(Var::Local(r.self_index)),
        }])
    }

    fn maybe_first_in_binding(&self, r: &ProtoRecord, prev: Option<&ProtoRecord>) -> Result<Option<Stmt>> {
        let first_in_binding = prev.map_or(true, |p| p.binding_index != r.binding_index);
        if first_in_binding && !self.binding(r)?.is_directive_lifecycle() {
            Ok(Some(assign(Var::PropertyBindingIndex, literal(r.binding_index))))
        } else {
            Ok(None)
        }
    }

    fn maybe_gen_last_in_directive(&self, r: &ProtoRecord) -> Result<Vec<Stmt>> {
        if !r.last_in_directive {
            return Ok(Vec::new());
        }
        let mut stmts = vec![assign(Var::Changes, Expr::Literal(Literal::Null))];
        let binding = self.binding(r)?;
        if !binding.is_default_change_detection() {
            stmts.push(if_stmt(
                read(Var::IsChanged),
                vec![Stmt::MarkAsCheckOnce(self.directive_of(r)?)],
            ));
        }
        stmts.push(assign(Var::IsChanged, bool_literal(false)));
        Ok(stmts)
    }

    fn directive_of(&self, r: &ProtoRecord) -> Result<DirectiveIndex> {
        self.binding(r)?
            .directive_record
            .map(|d| d.directive_index)
            .ok_or(ChangeDetectionError::MissingDirectiveRecord(r.binding_index))
    }
}

fn non_empty(stmts: Vec<Stmt>) -> Option<Vec<Stmt>> {
    (!stmts.is_empty()).then_some(stmts)
}

fn context_of(r: &ProtoRecord) -> Expr {
    match (r.context_index, r.directive_index) {
        (Some(index), _) => read(Var::Local(index)),
        (None, Some(directive)) => Expr::DirectiveContext(directive),
        (None, None) => read(Var::Context),
    }
}

/// The condition under which the records of a skip block run.
fn gen_skip_condition(r: &ProtoRecord, local: impl Fn(usize) -> Var) -> Result<Expr> {
    let condition = r
        .context_index
        .map(|index| read(local(index)))
        .ok_or_else(|| malformed(r, "skip record without a condition".to_string()))?;
    Ok(if r.mode == RecordType::SkipRecordsIf {
        not(condition)
    } else {
        condition
    })
}

fn gen_mark_path_to_root_as_check_once(eb: &EventBinding) -> Option<Stmt> {
    eb.directive_record
        .filter(|d| !d.is_default_change_detection())
        .map(|d| Stmt::MarkPathToRootAsCheckOnce(d.directive_index))
}

/// Checks what the generator relies on: records sit at their own index,
/// only read earlier records and skip blocks end inside the list.
fn validate_records(records: &[ProtoRecord]) -> Result<()> {
    for (i, r) in records.iter().enumerate() {
        if r.self_index != i {
            return Err(malformed(r, format!("expected self index {}", i)));
        }
        if let Some(dependency) = r.dependencies().find(|&d| d >= i) {
            return Err(ChangeDetectionError::RecordOrder {
                record: i,
                dependency,
            });
        }
        if r.is_skip_record() {
            match r.skip_end() {
                Some(end) if end > i && end <= records.len() => {}
                end => return Err(ChangeDetectionError::SkipRegion { record: i, end }),
            }
        }
    }
    Ok(())
}

struct SkipFrame {
    condition: Expr,
    then: Vec<Stmt>,
    otherwise: Option<Vec<Stmt>>,
    /// Index of the last record inside the block.
    end: usize,
    record: usize,
}

/// Turns the flat record walk into nested `if` statements. The stack of
/// open blocks lives for one walk only.
struct SkipBlockBuilder {
    root: Vec<Stmt>,
    frames: Vec<SkipFrame>,
}

impl SkipBlockBuilder {
    fn new(root: Vec<Stmt>) -> Self {
        SkipBlockBuilder {
            root,
            frames: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Vec<Stmt> {
        match self.frames.last_mut() {
            Some(SkipFrame {
                otherwise: Some(otherwise),
                ..
            }) => otherwise,
            Some(frame) => &mut frame.then,
            None => &mut self.root,
        }
    }

    fn push(&mut self, stmt: Stmt) {
        self.current().push(stmt);
    }

    fn extend(&mut self, stmts: impl IntoIterator<Item = Stmt>) {
        self.current().extend(stmts);
    }

    fn block_end(r: &ProtoRecord) -> Result<usize> {
        r.skip_end()
            .and_then(|end| end.checked_sub(1))
            .ok_or(ChangeDetectionError::SkipRegion {
                record: r.self_index,
                end: r.skip_end(),
            })
    }

    fn open(&mut self, r: &ProtoRecord, condition: Expr) -> Result<()> {
        let end = Self::block_end(r)?;
        if self.frames.last().is_some_and(|outer| end > outer.end) {
            return Err(ChangeDetectionError::SkipRegion {
                record: r.self_index,
                end: r.skip_end(),
            });
        }
        self.frames.push(SkipFrame {
            condition,
            then: Vec::new(),
            otherwise: None,
            end,
            record: r.self_index,
        });
        Ok(())
    }

    /// Switches the innermost block, which must end at `r`, to its else arm.
    fn open_else(&mut self, r: &ProtoRecord) -> Result<()> {
        let end = Self::block_end(r)?;
        let depth = self.frames.len();
        let outer_end = depth
            .checked_sub(2)
            .and_then(|i| self.frames.get(i))
            .map(|outer| outer.end);
        match self.frames.last_mut() {
            Some(frame)
                if frame.otherwise.is_none()
                    && frame.end == r.self_index
                    && outer_end.map_or(true, |outer| end <= outer) =>
            {
                frame.otherwise = Some(Vec::new());
                frame.end = end;
                Ok(())
            }
            _ => Err(ChangeDetectionError::SkipRegion {
                record: r.self_index,
                end: r.skip_end(),
            }),
        }
    }

    /// Closes every block whose last record is `index`.
    fn close_ended(&mut self, index: usize) {
        while self.frames.last().is_some_and(|frame| frame.end == index) {
            if let Some(frame) = self.frames.pop() {
                let stmt = Stmt::If {
                    condition: frame.condition,
                    then: frame.then,
                    otherwise: frame.otherwise.unwrap_or_default(),
                };
                self.push(stmt);
            }
        }
    }

    fn finish(self) -> Result<Vec<Stmt>> {
        match self.frames.last() {
            Some(frame) => Err(ChangeDetectionError::SkipRegion {
                record: frame.record,
                end: Some(frame.end + 1),
            }),
            None => Ok(self.root),
        }
    }
}
