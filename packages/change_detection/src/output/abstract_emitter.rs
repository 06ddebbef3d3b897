//! Abstract Emitter Module
//!
//! Corresponds to packages/compiler/src/output/abstract_emitter.ts
//! Renders a change detector program as JavaScript-like source

use crate::change_detection::change_detection_jit_generator::ChangeDetectorProgram;
use crate::change_detection::codegen_name_util::CodegenNameUtil;
use crate::change_detection::directive_record::LifecycleHook;
use crate::change_detection::proto_record::CollectionKind;
use crate::change_detection::value::Literal;
use crate::output::output_ast::{Expr, LocalsScope, Stmt, Var};
use once_cell::sync::Lazy;
use regex::Regex;

const INDENT_WITH: &str = "  ";
const UTIL: &str = "ChangeDetectionUtil";
const ABSTRACT_CHANGE_DETECTOR: &str = "AbstractChangeDetector";

static LEGAL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$][0-9a-zA-Z_$]*$").unwrap());

#[derive(Debug, Clone)]
struct EmittedLine {
    parts: Vec<String>,
    indent: usize,
}

impl EmittedLine {
    fn new(indent: usize) -> Self {
        EmittedLine {
            parts: Vec::new(),
            indent,
        }
    }
}

pub struct EmitterVisitorContext {
    lines: Vec<EmittedLine>,
    indent: usize,
}

impl EmitterVisitorContext {
    pub fn create_root() -> Self {
        EmitterVisitorContext::new(0)
    }

    pub fn new(indent: usize) -> Self {
        EmitterVisitorContext {
            lines: vec![EmittedLine::new(indent)],
            indent,
        }
    }

    fn current_line_mut(&mut self) -> &mut EmittedLine {
        if self.lines.is_empty() {
            self.lines.push(EmittedLine::new(self.indent));
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn println(&mut self, last_part: &str) {
        self.print(last_part, true);
    }

    pub fn line_is_empty(&self) -> bool {
        self.lines.last().map_or(true, |l| l.parts.is_empty())
    }

    pub fn print(&mut self, part: &str, new_line: bool) {
        if !part.is_empty() {
            self.current_line_mut().parts.push(part.to_string());
        }
        if new_line {
            self.lines.push(EmittedLine::new(self.indent));
        }
    }

    pub fn remove_empty_last_line(&mut self) {
        if self.line_is_empty() {
            self.lines.pop();
        }
    }

    pub fn inc_indent(&mut self) {
        self.indent += 1;
        if self.line_is_empty() {
            let indent = self.indent;
            self.current_line_mut().indent = indent;
        }
    }

    pub fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        if self.line_is_empty() {
            let indent = self.indent;
            self.current_line_mut().indent = indent;
        }
    }

    pub fn to_source(&self) -> String {
        self.lines
            .iter()
            .map(|l| {
                if l.parts.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", create_indent(l.indent), l.parts.join(""))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn create_indent(count: usize) -> String {
    INDENT_WITH.repeat(count)
}

/// Escape identifier for safe use in generated code
pub fn escape_identifier(input: &str, escape_dollar: bool, always_quote: bool) -> String {
    if input.is_empty() {
        return "''".to_string();
    }
    if !always_quote && LEGAL_IDENTIFIER_RE.is_match(input) {
        return input.to_string();
    }

    let mut escaped = input.replace('\\', "\\\\");
    escaped = escaped.replace('\'', "\\'");
    escaped = escaped.replace('\n', "\\n");
    escaped = escaped.replace('\r', "\\r");
    if escape_dollar {
        escaped = escaped.replace('$', "\\$");
    }

    format!("'{}'", escaped)
}

fn quote(s: &str) -> String {
    escape_identifier(s, false, true)
}

/// Prints the constructor, the prototype procedures and the static tables of
/// one generated detector type.
pub struct ChangeDetectorEmitter<'a> {
    program: &'a ChangeDetectorProgram,
    names: &'a CodegenNameUtil,
}

impl<'a> ChangeDetectorEmitter<'a> {
    pub fn new(program: &'a ChangeDetectorProgram) -> Self {
        ChangeDetectorEmitter {
            program,
            names: &program.names,
        }
    }

    pub fn emit(&self) -> String {
        let mut ctx = EmitterVisitorContext::create_root();
        let type_name = &self.program.type_name;

        ctx.println(&format!("var {} = function {}(dispatcher) {{", type_name, type_name));
        ctx.inc_indent();
        ctx.println(&format!(
            "{}.call(this, {}, dispatcher, {}, {}.gen_propertyBindingTargets, {}.gen_directiveIndices, {});",
            ABSTRACT_CHANGE_DETECTOR,
            quote(&self.program.id),
            self.program.record_count(),
            type_name,
            type_name,
            self.emit_strategy(),
        ));
        ctx.println("this.dehydrateDirectives(false);");
        ctx.dec_indent();
        ctx.println("}");
        ctx.println("");
        ctx.println(&format!(
            "{}.prototype = Object.create({}.prototype);",
            type_name, ABSTRACT_CHANGE_DETECTOR
        ));
        ctx.println("");

        self.emit_procedure(
            &mut ctx,
            "detectChangesInRecordsInternal",
            "throwOnChange",
            Some(&self.program.detect_changes_in_records),
        );
        self.emit_procedure(
            &mut ctx,
            "handleEventInternal",
            "eventName, elIndex, locals",
            self.program.handle_event.as_deref(),
        );
        self.emit_procedure(
            &mut ctx,
            "afterContentLifecycleCallbacksInternal",
            "",
            self.program.after_content_lifecycle_callbacks.as_deref(),
        );
        self.emit_procedure(
            &mut ctx,
            "afterViewLifecycleCallbacksInternal",
            "",
            self.program.after_view_lifecycle_callbacks.as_deref(),
        );
        self.emit_procedure(
            &mut ctx,
            "hydrateDirectives",
            "directives",
            self.program.hydrate_directives.as_deref(),
        );
        self.emit_procedure(
            &mut ctx,
            "dehydrateDirectives",
            "destroyPipes",
            self.program.dehydrate_directives.as_deref(),
        );

        ctx.println(&format!(
            "{}.gen_propertyBindingTargets = [{}];",
            type_name,
            self.emit_binding_targets()
        ));
        ctx.println(&format!(
            "{}.gen_directiveIndices = [{}];",
            type_name,
            self.program
                .directive_indices
                .iter()
                .map(|d| format!("{{elementIndex: {}, directiveIndex: {}}}", d.element_index, d.directive_index))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        ctx.println("");
        ctx.println(&format!(
            "return function(dispatcher) {{ return new {}(dispatcher); }}",
            type_name
        ));
        ctx.remove_empty_last_line();
        ctx.to_source()
    }

    /// Procedures the generator left out fall back to the base class.
    fn emit_procedure(&self, ctx: &mut EmitterVisitorContext, name: &str, params: &str, body: Option<&[Stmt]>) {
        let Some(body) = body else {
            return;
        };
        ctx.println(&format!(
            "{}.prototype.{} = function({}) {{",
            self.program.type_name, name, params
        ));
        ctx.inc_indent();
        self.emit_stmts(ctx, body);
        ctx.dec_indent();
        ctx.println("}");
        ctx.println("");
    }

    fn emit_strategy(&self) -> String {
        format!("ChangeDetectionStrategy.{}", self.program.strategy)
    }

    fn emit_binding_targets(&self) -> String {
        self.program
            .property_binding_targets
            .iter()
            .map(|target| match target {
                None => "null".to_string(),
                Some(t) => format!(
                    "{}.bindingTarget({}, {}, {}, {}, {})",
                    UTIL,
                    quote(&t.mode.to_string()),
                    t.element_index,
                    quote(&t.name),
                    t.unit.as_deref().map_or_else(|| "null".to_string(), quote),
                    t.debug.as_deref().map_or_else(|| "null".to_string(), quote),
                ),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn emit_stmts(&self, ctx: &mut EmitterVisitorContext, stmts: &[Stmt]) {
        for stmt in stmts {
            self.emit_stmt(ctx, stmt);
        }
    }

    fn emit_stmt(&self, ctx: &mut EmitterVisitorContext, stmt: &Stmt) {
        match stmt {
            Stmt::DeclareVars(vars) => {
                let decls: Vec<String> = vars
                    .iter()
                    .map(|(var, init)| match init {
                        Some(init) => format!("{} = {}", self.var(*var), self.expr(init)),
                        None => self.var(*var),
                    })
                    .collect();
                ctx.println(&format!("var {};", decls.join(", ")));
            }
            Stmt::Assign { var, value } => {
                ctx.println(&format!("{} = {};", self.var(*var), self.expr(value)));
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                ctx.println(&format!("if ({}) {{", self.expr(condition)));
                ctx.inc_indent();
                self.emit_stmts(ctx, then);
                ctx.dec_indent();
                if otherwise.is_empty() {
                    ctx.println("}");
                } else {
                    ctx.println("} else {");
                    ctx.inc_indent();
                    self.emit_stmts(ctx, otherwise);
                    ctx.dec_indent();
                    ctx.println("}");
                }
            }
            Stmt::Expression(expr) => ctx.println(&format!("{};", self.expr(expr))),
            Stmt::ResolvePipe { record, name } => ctx.println(&format!(
                "{} = {}.get({});",
                self.var(Var::Pipe(*record)),
                self.names.get_pipes_accessor_name(),
                quote(name)
            )),
            Stmt::ThrowOnChangeError { previous, current } => ctx.println(&format!(
                "this.throwOnChangeError({}, {});",
                self.expr(previous),
                self.expr(current)
            )),
            Stmt::SetDirectiveProperty {
                directive,
                property,
                value,
            } => ctx.println(&format!(
                "{}.{} = {};",
                self.names.get_directive_name(*directive),
                escape_identifier(property, false, false),
                self.expr(value)
            )),
            Stmt::NotifyDispatcher(value) => {
                ctx.println(&format!("this.notifyDispatcher({});", self.expr(value)))
            }
            Stmt::LogBindingUpdate(value) => {
                ctx.println(&format!("this.logBindingUpdate({});", self.expr(value)))
            }
            Stmt::AddChange { previous, current } => ctx.println(&format!(
                "{changes} = this.addChange({changes}, {}, {});",
                self.expr(previous),
                self.expr(current),
                changes = self.var(Var::Changes)
            )),
            Stmt::CallLifecycle { directive, hook } => {
                let args = if *hook == LifecycleHook::OnChanges {
                    self.var(Var::Changes)
                } else {
                    String::new()
                };
                ctx.println(&format!(
                    "{}.{}({});",
                    self.names.get_directive_name(*directive),
                    hook.method_name(),
                    args
                ));
            }
            Stmt::MarkAsCheckOnce(directive) => ctx.println(&format!(
                "{}.markAsCheckOnce();",
                self.names.get_detector_name(*directive)
            )),
            Stmt::MarkPathToRootAsCheckOnce(directive) => ctx.println(&format!(
                "{}.markPathToRootAsCheckOnce();",
                self.names.get_detector_name(*directive)
            )),
            Stmt::HydrateDirective {
                directive,
                position,
            } => ctx.println(&format!(
                "{} = directives.getDirectiveFor(this.directiveIndices[{}]);",
                self.names.get_directive_name(*directive),
                position
            )),
            Stmt::HydrateDetector {
                directive,
                position,
            } => ctx.println(&format!(
                "{} = directives.getDetectorFor(this.directiveIndices[{}]);",
                self.names.get_detector_name(*directive),
                position
            )),
            Stmt::DestroyPipe(record) => {
                ctx.println(&format!("{}.pipe.onDestroy();", self.var(Var::Pipe(*record))))
            }
            Stmt::DehydrateFields(fields) => {
                let mut names: Vec<String> = fields.iter().map(|f| self.var(*f)).collect();
                names.push(format!("{}.uninitialized", UTIL));
                ctx.println(&format!("{};", names.join(" = ")));
            }
            Stmt::Return(value) => ctx.println(&format!("return {};", self.expr(value))),
        }
    }

    fn var(&self, var: Var) -> String {
        self.names.name(var)
    }

    fn args(&self, args: &[Expr]) -> String {
        args.iter().map(|a| self.expr(a)).collect::<Vec<_>>().join(", ")
    }

    /// Wraps operators so they can be used as an operand.
    fn operand(&self, expr: &Expr) -> String {
        match expr {
            Expr::Or(_)
            | Expr::And(_)
            | Expr::IsFalse(_)
            | Expr::StateIsNeverChecked
            | Expr::PipeUninitialized(_)
            | Expr::FieldUninitialized(_)
            | Expr::EventMatches { .. }
            | Expr::SafeAccess { .. }
            | Expr::Interpolate { .. }
            | Expr::PropertyWrite { .. }
            | Expr::KeyedWrite { .. } => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => emit_literal(literal),
            Expr::Read(var) => self.var(*var),
            Expr::InstanceContext => self.names.get_context_field_name(),
            Expr::DirectiveContext(directive) => self.names.get_directive_name(*directive),
            Expr::Not(inner) => format!("!{}", self.operand(inner)),
            Expr::Or(operands) if operands.is_empty() => "false".to_string(),
            Expr::Or(operands) => operands
                .iter()
                .map(|o| self.operand(o))
                .collect::<Vec<_>>()
                .join(" || "),
            Expr::And(operands) if operands.is_empty() => "true".to_string(),
            Expr::And(operands) => operands
                .iter()
                .map(|o| self.operand(o))
                .collect::<Vec<_>>()
                .join(" && "),
            Expr::IsFalse(inner) => format!("{} === false", self.operand(inner)),
            Expr::StateIsNeverChecked => format!(
                "{} === ChangeDetectorState.NeverChecked",
                self.names.get_state_name()
            ),
            Expr::HasChanges => self.var(Var::Changes),
            Expr::LooseNotIdentical(a, b) => {
                format!("{}.looseNotIdentical({}, {})", UTIL, self.expr(a), self.expr(b))
            }
            Expr::UnwrapValue(inner) => format!("{}.unwrapValue({})", UTIL, self.expr(inner)),
            Expr::PipeUninitialized(record) => {
                format!("{} === {}.uninitialized", self.var(Var::Pipe(*record)), UTIL)
            }
            Expr::FieldUninitialized(record) => {
                format!("{} === {}.uninitialized", self.var(Var::Field(*record)), UTIL)
            }
            Expr::PipeIsPure(record) => format!("{}.pure", self.var(Var::Pipe(*record))),
            Expr::EventMatches {
                event_name,
                el_index,
            } => format!("eventName === {} && elIndex === {}", quote(event_name), el_index),
            Expr::PropertyRead { receiver, name } => format!(
                "{}.{}",
                self.operand(receiver),
                escape_identifier(name, false, false)
            ),
            Expr::PropertyWrite {
                receiver,
                name,
                value,
            } => format!(
                "{}.{} = {}",
                self.operand(receiver),
                escape_identifier(name, false, false),
                self.expr(value)
            ),
            Expr::KeyedRead { receiver, key } => {
                format!("{}[{}]", self.operand(receiver), self.expr(key))
            }
            Expr::KeyedWrite {
                receiver,
                key,
                value,
            } => format!(
                "{}[{}] = {}",
                self.operand(receiver),
                self.expr(key),
                self.expr(value)
            ),
            Expr::ReadLocals { scope, name } => {
                let locals = match scope {
                    LocalsScope::Detector => self.names.get_locals_accessor_name(),
                    LocalsScope::Event => "locals".to_string(),
                };
                format!("{}.get({})", locals, quote(name))
            }
            Expr::InvokeMethod {
                receiver,
                name,
                args,
            } => format!(
                "{}.{}({})",
                self.operand(receiver),
                escape_identifier(name, false, false),
                self.args(args)
            ),
            Expr::InvokeClosure { function, args } => {
                format!("{}({})", self.operand(function), self.args(args))
            }
            Expr::SafeAccess { receiver, access } => format!(
                "{}.isValueBlank({}) ? null : {}",
                UTIL,
                self.expr(receiver),
                self.expr(access)
            ),
            Expr::PrimitiveOp { op, args } => {
                format!("{}.{}({})", UTIL, op.helper_name(), self.args(args))
            }
            Expr::CollectionLiteral { kind, keys, args } => match kind {
                CollectionKind::List => format!("{}.arrayFn{}({})", UTIL, args.len(), self.args(args)),
                CollectionKind::Map => format!(
                    "{}.mapFn([{}])({})",
                    UTIL,
                    keys.iter().map(|k| quote(k)).collect::<Vec<_>>().join(", "),
                    self.args(args)
                ),
            },
            Expr::Interpolate { fragments, args } => {
                let mut parts = Vec::new();
                for (i, fragment) in fragments.iter().enumerate() {
                    if !fragment.is_empty() {
                        parts.push(quote(fragment));
                    }
                    if let Some(arg) = args.get(i) {
                        parts.push(format!("{}.s({})", UTIL, self.expr(arg)));
                    }
                }
                if parts.is_empty() {
                    "''".to_string()
                } else {
                    parts.join(" + ")
                }
            }
            Expr::PipeTransform {
                pipe,
                context,
                args,
            } => format!(
                "{}.pipe.transform({}, [{}])",
                self.var(Var::Pipe(*pipe)),
                self.expr(context),
                self.args(args)
            ),
        }
    }
}

fn emit_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::String(s) => quote(s),
        other => other.to_string(),
    }
}
