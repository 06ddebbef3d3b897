//! Proto Records
//!
//! Corresponds to angular2/src/core/change_detection/proto_record.ts
//! One evaluation step of a change detector, plus event bindings

use crate::change_detection::change_detection_util::PrimitiveOp;
use crate::change_detection::directive_record::{DirectiveIndex, DirectiveRecord};
use crate::change_detection::value::Literal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    List,
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordType {
    /// The record's context itself (`this` in a template expression).
    #[serde(rename = "self")]
    ImplicitReceiver,
    /// `fixedArgs[0]` is the value.
    Const,
    PrimitiveOp(PrimitiveOp),
    PropertyRead,
    PropertyWrite,
    /// A template variable looked up in the locals chain.
    Local,
    InvokeMethod,
    /// Calls the context as a function.
    InvokeClosure,
    /// Calls the context as a function, only when an argument changed.
    PureFunction,
    KeyedRead,
    KeyedWrite,
    Pipe,
    /// `fixedArgs` holds the literal fragments around each argument.
    Interpolate,
    SafeProperty,
    /// For maps `fixedArgs` holds the keys.
    CollectionLiteral(CollectionKind),
    SafeMethodInvoke,
    DirectiveLifecycle,
    Chain,
    SkipRecordsIf,
    SkipRecordsIfNot,
    SkipRecords,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::PrimitiveOp(op) => write!(f, "PrimitiveOp({:?})", op),
            RecordType::CollectionLiteral(kind) => write!(f, "CollectionLiteral({:?})", kind),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoRecord {
    pub mode: RecordType,
    /// Property, method, pipe, local or lifecycle hook name.
    pub name: String,
    /// `None` reads the detector context, or the directive named by
    /// `directive_index` when that is set.
    #[serde(default)]
    pub context_index: Option<usize>,
    #[serde(default)]
    pub args: SmallVec<[usize; 4]>,
    #[serde(default)]
    pub fixed_args: Vec<Literal>,
    /// Index into the definition's binding records.
    #[serde(default)]
    pub binding_index: usize,
    #[serde(default)]
    pub directive_index: Option<DirectiveIndex>,
    pub self_index: usize,
    #[serde(default)]
    pub last_in_binding: bool,
    #[serde(default)]
    pub last_in_directive: bool,
    #[serde(default)]
    pub argument_to_pure_function: bool,
    #[serde(default)]
    pub referenced_by_self: bool,
}

impl ProtoRecord {
    pub fn new(mode: RecordType, name: impl Into<String>, self_index: usize) -> Self {
        ProtoRecord {
            mode,
            name: name.into(),
            context_index: None,
            args: SmallVec::new(),
            fixed_args: Vec::new(),
            binding_index: 0,
            directive_index: None,
            self_index,
            last_in_binding: false,
            last_in_directive: false,
            argument_to_pure_function: false,
            referenced_by_self: false,
        }
    }

    pub fn is_pure_function(&self) -> bool {
        matches!(
            self.mode,
            RecordType::Interpolate | RecordType::CollectionLiteral(_) | RecordType::PureFunction
        )
    }

    pub fn is_used_by_other_record(&self) -> bool {
        !self.last_in_binding || self.referenced_by_self
    }

    pub fn should_be_checked(&self) -> bool {
        self.argument_to_pure_function
            || self.last_in_binding
            || self.is_pure_function()
            || self.is_pipe_record()
    }

    pub fn is_pipe_record(&self) -> bool {
        self.mode == RecordType::Pipe
    }

    pub fn is_conditional_skip_record(&self) -> bool {
        matches!(self.mode, RecordType::SkipRecordsIfNot | RecordType::SkipRecordsIf)
    }

    pub fn is_unconditional_skip_record(&self) -> bool {
        self.mode == RecordType::SkipRecords
    }

    pub fn is_skip_record(&self) -> bool {
        self.is_conditional_skip_record() || self.is_unconditional_skip_record()
    }

    pub fn is_life_cycle_record(&self) -> bool {
        self.mode == RecordType::DirectiveLifecycle
    }

    /// Index one past the last record of the skipped block.
    pub fn skip_end(&self) -> Option<usize> {
        if self.is_skip_record() {
            self.fixed_args.first().and_then(Literal::as_index)
        } else {
            None
        }
    }

    /// Records this one reads, context first.
    pub fn dependencies(&self) -> impl Iterator<Item = usize> + '_ {
        self.context_index.into_iter().chain(self.args.iter().copied())
    }
}

/// The records evaluating one event handler expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBinding {
    pub event_name: String,
    #[serde(default)]
    pub target: Option<String>,
    pub el_index: usize,
    /// The directive a host listener belongs to.
    #[serde(default)]
    pub directive_record: Option<DirectiveRecord>,
    pub records: Vec<ProtoRecord>,
}

impl EventBinding {
    /// `target:event` for global targets (`window:resize`), else the event name.
    pub fn full_name(&self) -> String {
        match &self.target {
            Some(target) => format!("{}:{}", target, self.event_name),
            None => self.event_name.clone(),
        }
    }
}
