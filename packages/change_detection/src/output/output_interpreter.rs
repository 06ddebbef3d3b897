//! Output Interpreter Module
//!
//! Corresponds to packages/compiler/src/output/output_interpreter.ts
//! Runs the statements of a generated procedure against one detector instance.

use crate::change_detection::abstract_change_detector::AbstractChangeDetector;
use crate::change_detection::change_detection_util::{
    array_fn, loose_not_identical, map_fn, s, unwrap_value, SimpleChanges,
};
use crate::change_detection::constants::ChangeDetectorState;
use crate::change_detection::directive_record::LifecycleHook;
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::interfaces::{Directives, Locals};
use crate::change_detection::proto_record::CollectionKind;
use crate::change_detection::value::Value;
use crate::output::output_ast::{Expr, LocalsScope, Stmt, Var};
use std::collections::HashMap;
use std::rc::Rc;

struct EventScope {
    name: String,
    el_index: usize,
    locals: Rc<Locals>,
}

/// Procedure-local state: parameters, record locals and change flags.
#[derive(Default)]
pub struct Frame<'a> {
    vars: HashMap<Var, Value>,
    changes: Option<SimpleChanges>,
    event: Option<EventScope>,
    directives: Option<&'a dyn Directives>,
}

impl<'a> Frame<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect_changes(throw_on_change: bool) -> Self {
        let mut frame = Self::new();
        frame.vars.insert(Var::ThrowOnChange, Value::Bool(throw_on_change));
        frame
    }

    pub fn handle_event(event_name: &str, el_index: usize, locals: Rc<Locals>) -> Self {
        let mut frame = Self::new();
        frame.event = Some(EventScope {
            name: event_name.to_string(),
            el_index,
            locals,
        });
        frame
    }

    pub fn hydrate(directives: &'a dyn Directives) -> Self {
        let mut frame = Self::new();
        frame.directives = Some(directives);
        frame
    }

    pub fn dehydrate(destroy_pipes: bool) -> Self {
        let mut frame = Self::new();
        frame.vars.insert(Var::DestroyPipes, Value::Bool(destroy_pipes));
        frame
    }
}

enum Flow {
    Next,
    Return(Value),
}

/// Executes `stmts` and returns the value of the `return` statement, or
/// `undefined` when the procedure falls off its end.
pub fn execute(detector: &mut AbstractChangeDetector, frame: &mut Frame<'_>, stmts: &[Stmt]) -> Result<Value> {
    let mut interpreter = StatementInterpreter { detector, frame };
    match interpreter.run(stmts)? {
        Flow::Return(value) => Ok(value),
        Flow::Next => Ok(Value::Undefined),
    }
}

struct StatementInterpreter<'d, 'f, 'a> {
    detector: &'d mut AbstractChangeDetector,
    frame: &'f mut Frame<'a>,
}

impl<'a> StatementInterpreter<'_, '_, 'a> {
    fn run(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::DeclareVars(vars) => {
                for (var, init) in vars {
                    let value = match init {
                        Some(init) => self.eval(init)?,
                        None => Value::Undefined,
                    };
                    self.assign(*var, value)?;
                }
            }
            Stmt::Assign { var, value } => {
                let value = self.eval(value)?;
                self.assign(*var, value)?;
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if self.eval(condition)?.is_truthy() {
                    then
                } else {
                    otherwise
                };
                return self.run(branch);
            }
            Stmt::Expression(expr) => {
                self.eval(expr)?;
            }
            Stmt::ResolvePipe { record, name } => self.detector.resolve_pipe(*record, name)?,
            Stmt::ThrowOnChangeError { previous, current } => {
                let previous = self.eval(previous)?;
                let current = self.eval(current)?;
                return Err(self.detector.throw_on_change_error(previous, current));
            }
            Stmt::SetDirectiveProperty {
                directive,
                property,
                value,
            } => {
                let value = self.eval(value)?;
                self.detector
                    .directive(*directive)?
                    .borrow_mut()
                    .set_property(property, value)?;
            }
            Stmt::NotifyDispatcher(value) => {
                let value = self.eval(value)?;
                self.detector.notify_dispatcher(&value)?;
            }
            Stmt::LogBindingUpdate(value) => {
                let value = self.eval(value)?;
                self.detector.log_binding_update(&value)?;
            }
            Stmt::AddChange { previous, current } => {
                let previous = self.eval(previous)?;
                let current = self.eval(current)?;
                self.detector.add_change(&mut self.frame.changes, previous, current)?;
            }
            Stmt::CallLifecycle { directive, hook } => {
                let directive = self.detector.directive(*directive)?;
                let mut directive = directive.borrow_mut();
                match hook {
                    LifecycleHook::OnChanges => {
                        let changes = self.frame.changes.clone().unwrap_or_default();
                        directive.on_changes(&changes);
                    }
                    LifecycleHook::OnInit => directive.on_init(),
                    LifecycleHook::DoCheck => directive.do_check(),
                    LifecycleHook::AfterContentInit => directive.after_content_init(),
                    LifecycleHook::AfterContentChecked => directive.after_content_checked(),
                    LifecycleHook::AfterViewInit => directive.after_view_init(),
                    LifecycleHook::AfterViewChecked => directive.after_view_checked(),
                }
            }
            Stmt::MarkAsCheckOnce(directive) => self.detector.detector(*directive)?.mark_as_check_once(),
            Stmt::MarkPathToRootAsCheckOnce(directive) => {
                self.detector.detector(*directive)?.mark_path_to_root_as_check_once()
            }
            Stmt::HydrateDirective { position, .. } => {
                let directives = self.directives()?;
                self.detector.hydrate_directive(*position, directives)?;
            }
            Stmt::HydrateDetector { position, .. } => {
                let directives = self.directives()?;
                self.detector.hydrate_detector(*position, directives)?;
            }
            Stmt::DestroyPipe(record) => self.detector.destroy_pipe(*record),
            Stmt::DehydrateFields(fields) => {
                for field in fields {
                    self.detector.reset_slot(*field);
                }
            }
            Stmt::Return(value) => return Ok(Flow::Return(self.eval(value)?)),
        }
        Ok(Flow::Next)
    }

    fn directives(&self) -> Result<&'a dyn Directives> {
        self.frame
            .directives
            .ok_or_else(|| ChangeDetectionError::UnknownOperation("hydrate without directives".to_string()))
    }

    fn assign(&mut self, var: Var, value: Value) -> Result<()> {
        match var {
            Var::Field(index) => self.detector.set_field(index, value),
            Var::PropertyBindingIndex => {
                let index = value
                    .as_number()
                    .filter(|n| *n >= 0.0)
                    .ok_or_else(|| ChangeDetectionError::UnknownOperation(format!("binding index {}", value)))?;
                self.detector.set_property_binding_index(index as usize);
            }
            Var::Changes => {
                if value.is_blank() {
                    self.frame.changes = None;
                }
            }
            Var::Pipe(_) | Var::Directive(_) | Var::Detector(_) => {
                return Err(ChangeDetectionError::UnknownOperation(format!("assignment to {:?}", var)));
            }
            _ => {
                self.frame.vars.insert(var, value);
            }
        }
        Ok(())
    }

    fn read(&self, var: Var) -> Result<Value> {
        match var {
            Var::Field(index) => Ok(self.detector.field(index)),
            Var::PropertyBindingIndex => Ok(Value::Number(self.detector.property_binding_index() as f64)),
            Var::Changes => Ok(Value::Bool(self.has_changes())),
            Var::Directive(index) => Ok(self.detector.directive(index)?.borrow().as_context()),
            Var::Pipe(_) | Var::Detector(_) => {
                Err(ChangeDetectionError::UnknownOperation(format!("read of {:?}", var)))
            }
            _ => Ok(self.frame.vars.get(&var).cloned().unwrap_or_default()),
        }
    }

    fn has_changes(&self) -> bool {
        self.frame.changes.as_ref().is_some_and(|c| !c.is_empty())
    }

    fn eval_all(&self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval(&self, expr: &Expr) -> Result<Value> {
        let value = match expr {
            Expr::Literal(literal) => literal.to_value(),
            Expr::Read(var) => self.read(*var)?,
            Expr::InstanceContext => self.detector.context()?,
            Expr::DirectiveContext(index) => self.detector.directive(*index)?.borrow().as_context(),
            Expr::Not(inner) => Value::Bool(!self.eval(inner)?.is_truthy()),
            Expr::Or(operands) => {
                for operand in operands {
                    if self.eval(operand)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                }
                Value::Bool(false)
            }
            Expr::And(operands) => {
                for operand in operands {
                    if !self.eval(operand)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Value::Bool(true)
            }
            Expr::IsFalse(inner) => Value::Bool(matches!(self.eval(inner)?, Value::Bool(false))),
            Expr::StateIsNeverChecked => {
                Value::Bool(self.detector.state() == ChangeDetectorState::NeverChecked)
            }
            Expr::HasChanges => Value::Bool(self.has_changes()),
            Expr::LooseNotIdentical(a, b) => {
                Value::Bool(loose_not_identical(&self.eval(a)?, &self.eval(b)?))
            }
            Expr::UnwrapValue(inner) => unwrap_value(self.eval(inner)?),
            Expr::PipeUninitialized(record) => Value::Bool(self.detector.pipe(*record).is_none()),
            Expr::FieldUninitialized(record) => Value::Bool(self.detector.field(*record).is_uninitialized()),
            Expr::PipeIsPure(record) => Value::Bool(self.detector.pipe(*record).is_some_and(|p| p.pure)),
            Expr::EventMatches {
                event_name,
                el_index,
            } => Value::Bool(
                self.frame
                    .event
                    .as_ref()
                    .is_some_and(|e| e.name == *event_name && e.el_index == *el_index),
            ),
            Expr::PropertyRead { receiver, name } => self.eval(receiver)?.get_property(name)?,
            Expr::PropertyWrite {
                receiver,
                name,
                value,
            } => {
                let receiver = self.eval(receiver)?;
                let value = self.eval(value)?;
                receiver.set_property(name, value.clone())?;
                value
            }
            Expr::KeyedRead { receiver, key } => self.eval(receiver)?.get_keyed(&self.eval(key)?)?,
            Expr::KeyedWrite {
                receiver,
                key,
                value,
            } => {
                let receiver = self.eval(receiver)?;
                let key = self.eval(key)?;
                let value = self.eval(value)?;
                receiver.set_keyed(&key, value.clone())?;
                value
            }
            Expr::ReadLocals { scope, name } => match scope {
                LocalsScope::Detector => self.detector.read_local(name)?,
                LocalsScope::Event => match &self.frame.event {
                    Some(event) => event.locals.get(name)?,
                    None => return Err(ChangeDetectionError::UnknownLocal(name.clone())),
                },
            },
            Expr::InvokeMethod {
                receiver,
                name,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                receiver.invoke_method(name, &self.eval_all(args)?)?
            }
            Expr::InvokeClosure { function, args } => {
                let function = self.eval(function)?;
                function.call(&self.eval_all(args)?)?
            }
            Expr::SafeAccess { receiver, access } => {
                if self.eval(receiver)?.is_blank() {
                    Value::Null
                } else {
                    self.eval(access)?
                }
            }
            Expr::PrimitiveOp { op, args } => op.apply(&self.eval_all(args)?),
            Expr::CollectionLiteral { kind, keys, args } => {
                let values = self.eval_all(args)?;
                match kind {
                    CollectionKind::List => array_fn(&values),
                    CollectionKind::Map => map_fn(keys, &values),
                }
            }
            Expr::Interpolate { fragments, args } => {
                let mut out = String::new();
                for (i, fragment) in fragments.iter().enumerate() {
                    out.push_str(fragment);
                    if let Some(arg) = args.get(i) {
                        out.push_str(&s(&self.eval(arg)?));
                    }
                }
                Value::string(out)
            }
            Expr::PipeTransform {
                pipe,
                context,
                args,
            } => {
                let selected = self
                    .detector
                    .pipe(*pipe)
                    .cloned()
                    .ok_or_else(|| ChangeDetectionError::PipeNotFound(format!("record {}", pipe)))?;
                let value = self.eval(context)?;
                selected.transform(&value, &self.eval_all(args)?)?
            }
        };
        Ok(value)
    }
}
