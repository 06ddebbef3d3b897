//! Output AST Module
//!
//! Corresponds to packages/compiler/src/output/output_ast.ts
//! The statements a change detector program is made of. The generator builds
//! them, the interpreter runs them and the emitter renders them as source.

use crate::change_detection::change_detection_util::PrimitiveOp;
use crate::change_detection::directive_record::{DirectiveIndex, LifecycleHook};
use crate::change_detection::proto_record::CollectionKind;
use crate::change_detection::value::Literal;

/// A storage slot of a generated procedure or of the detector instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Var {
    /// Procedure parameter of `detectChangesInRecordsInternal`.
    ThrowOnChange,
    /// Procedure parameter of `dehydrateDirectives`.
    DestroyPipes,
    /// Local copy of the detector context.
    Context,
    /// Current value of a property record.
    Local(usize),
    /// Whether a record changed during this pass.
    Change(usize),
    /// Current value of an event record.
    EventLocal { binding: usize, record: usize },
    /// Previous value of a record, kept on the instance.
    Field(usize),
    /// Pipe instance of a pipe record, kept on the instance.
    Pipe(usize),
    Directive(DirectiveIndex),
    Detector(DirectiveIndex),
    IsChanged,
    Changes,
    PreventDefault,
    PropertyBindingIndex,
}

/// Where a `Local` record looks up template variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalsScope {
    /// The locals the detector was hydrated with.
    Detector,
    /// The locals passed to the event handler.
    Event,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Read(Var),
    /// `this.context`
    InstanceContext,
    /// The instance a directive's host bindings are evaluated against.
    DirectiveContext(DirectiveIndex),
    Not(Box<Expr>),
    /// `||` over all operands; empty is `false`.
    Or(Vec<Expr>),
    And(Vec<Expr>),
    /// `value === false`
    IsFalse(Box<Expr>),
    StateIsNeverChecked,
    /// `changes` holds at least one change record.
    HasChanges,
    LooseNotIdentical(Box<Expr>, Box<Expr>),
    UnwrapValue(Box<Expr>),
    PipeUninitialized(usize),
    FieldUninitialized(usize),
    PipeIsPure(usize),
    /// `eventName === name && elIndex === el`
    EventMatches { event_name: String, el_index: usize },
    PropertyRead {
        receiver: Box<Expr>,
        name: String,
    },
    PropertyWrite {
        receiver: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },
    KeyedRead {
        receiver: Box<Expr>,
        key: Box<Expr>,
    },
    KeyedWrite {
        receiver: Box<Expr>,
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ReadLocals { scope: LocalsScope, name: String },
    InvokeMethod {
        receiver: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    InvokeClosure { function: Box<Expr>, args: Vec<Expr> },
    /// `receiver` is blank ? `null` : `access`
    SafeAccess { receiver: Box<Expr>, access: Box<Expr> },
    PrimitiveOp { op: PrimitiveOp, args: Vec<Expr> },
    CollectionLiteral {
        kind: CollectionKind,
        keys: Vec<String>,
        args: Vec<Expr>,
    },
    /// `fragments` has one more entry than `args`.
    Interpolate { fragments: Vec<String>, args: Vec<Expr> },
    PipeTransform {
        pipe: usize,
        context: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Declares procedure variables with their initial values.
    DeclareVars(Vec<(Var, Option<Expr>)>),
    Assign { var: Var, value: Expr },
    If {
        condition: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    /// Evaluates an expression for its side effects.
    Expression(Expr),
    ResolvePipe { record: usize, name: String },
    ThrowOnChangeError { previous: Expr, current: Expr },
    SetDirectiveProperty {
        directive: DirectiveIndex,
        property: String,
        value: Expr,
    },
    NotifyDispatcher(Expr),
    LogBindingUpdate(Expr),
    AddChange { previous: Expr, current: Expr },
    CallLifecycle {
        directive: DirectiveIndex,
        hook: LifecycleHook,
    },
    MarkAsCheckOnce(DirectiveIndex),
    MarkPathToRootAsCheckOnce(DirectiveIndex),
    HydrateDirective {
        directive: DirectiveIndex,
        position: usize,
    },
    HydrateDetector {
        directive: DirectiveIndex,
        position: usize,
    },
    /// Calls `onDestroy` on the pipe of a record, once per pipe instance.
    DestroyPipe(usize),
    /// Resets instance slots to the uninitialized sentinel.
    DehydrateFields(Vec<Var>),
    Return(Expr),
}

pub fn read(var: Var) -> Expr {
    Expr::Read(var)
}

pub fn literal(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

pub fn bool_literal(value: bool) -> Expr {
    Expr::Literal(Literal::Bool(value))
}

pub fn not(expr: Expr) -> Expr {
    Expr::Not(Box::new(expr))
}

pub fn assign(var: Var, value: Expr) -> Stmt {
    Stmt::Assign { var, value }
}

pub fn if_stmt(condition: Expr, then: Vec<Stmt>) -> Stmt {
    Stmt::If {
        condition,
        then,
        otherwise: Vec::new(),
    }
}

pub fn if_else(condition: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Stmt {
    Stmt::If {
        condition,
        then,
        otherwise,
    }
}
