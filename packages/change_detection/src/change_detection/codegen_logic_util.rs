//! Codegen Logic Util
//!
//! Corresponds to angular2/src/core/change_detection/codegen_logic_util.ts
//! Translates record semantics into statements, independent of the dirty
//! checking that wraps them.

use crate::change_detection::binding_record::{BindingRecord, BindingTarget};
use crate::change_detection::codegen_name_util::CodegenNameUtil;
use crate::change_detection::directive_record::{DirectiveIndex, DirectiveRecord, LifecycleHook};
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::proto_record::{CollectionKind, ProtoRecord, RecordType};
use crate::change_detection::value::Literal;
use crate::output::output_ast::{assign, if_stmt, read, Expr, LocalsScope, Stmt, Var};

pub struct CodegenLogicUtil<'a> {
    names: &'a CodegenNameUtil,
}

impl<'a> CodegenLogicUtil<'a> {
    pub fn new(names: &'a CodegenNameUtil) -> Self {
        CodegenLogicUtil { names }
    }

    pub fn names(&self) -> &'a CodegenNameUtil {
        self.names
    }

    /// `l<i> = <value of record i>;`
    pub fn gen_property_binding_eval_value(&self, record: &ProtoRecord) -> Result<Stmt> {
        let value = gen_eval_value(record, Var::Local, LocalsScope::Detector)?;
        Ok(assign(Var::Local(record.self_index), value))
    }

    /// `e<b>_<i> = <value of record i>;` inside the handler of event binding `binding`.
    pub fn gen_event_binding_eval_value(&self, binding: usize, record: &ProtoRecord) -> Result<Stmt> {
        let local = |index| Var::EventLocal {
            binding,
            record: index,
        };
        let value = gen_eval_value(record, &local, LocalsScope::Event)?;
        Ok(assign(local(record.self_index), value))
    }

    pub fn gen_hydrate_directives(&self, directive_records: &[DirectiveRecord]) -> Vec<Stmt> {
        directive_records
            .iter()
            .enumerate()
            .map(|(position, d)| Stmt::HydrateDirective {
                directive: d.directive_index,
                position,
            })
            .collect()
    }

    /// Only directives with their own change detection strategy get a
    /// nested detector.
    pub fn gen_hydrate_detectors(&self, directive_records: &[DirectiveRecord]) -> Vec<Stmt> {
        directive_records
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_default_change_detection())
            .map(|(position, d)| Stmt::HydrateDetector {
                directive: d.directive_index,
                position,
            })
            .collect()
    }

    /// Directives are notified last to first.
    pub fn gen_content_lifecycle_callbacks(&self, directive_records: &[DirectiveRecord]) -> Vec<Stmt> {
        let mut res = Vec::new();
        for dir in directive_records.iter().rev() {
            if dir.call_after_content_init() {
                res.push(gen_init_callback(dir.directive_index, LifecycleHook::AfterContentInit));
            }
            if dir.call_after_content_checked() {
                res.push(Stmt::CallLifecycle {
                    directive: dir.directive_index,
                    hook: LifecycleHook::AfterContentChecked,
                });
            }
        }
        res
    }

    pub fn gen_view_lifecycle_callbacks(&self, directive_records: &[DirectiveRecord]) -> Vec<Stmt> {
        let mut res = Vec::new();
        for dir in directive_records.iter().rev() {
            if dir.call_after_view_init() {
                res.push(gen_init_callback(dir.directive_index, LifecycleHook::AfterViewInit));
            }
            if dir.call_after_view_checked() {
                res.push(Stmt::CallLifecycle {
                    directive: dir.directive_index,
                    hook: LifecycleHook::AfterViewChecked,
                });
            }
        }
        res
    }

    /// One target per binding record, parallel to binding indices. Binding
    /// source text is only kept with debug info on.
    pub fn gen_property_binding_targets(
        &self,
        binding_records: &[BindingRecord],
        gen_debug_info: bool,
    ) -> Vec<Option<BindingTarget>> {
        binding_records
            .iter()
            .map(|b| {
                b.target.clone().map(|mut target| {
                    if !gen_debug_info {
                        target.debug = None;
                    }
                    target
                })
            })
            .collect()
    }

    pub fn gen_directive_indices(&self, directive_records: &[DirectiveRecord]) -> Vec<DirectiveIndex> {
        directive_records.iter().map(|d| d.directive_index).collect()
    }
}

fn gen_init_callback(directive: DirectiveIndex, hook: LifecycleHook) -> Stmt {
    if_stmt(
        Expr::StateIsNeverChecked,
        vec![Stmt::CallLifecycle { directive, hook }],
    )
}

fn gen_eval_value(record: &ProtoRecord, local: impl Fn(usize) -> Var, scope: LocalsScope) -> Result<Expr> {
    let context = match (record.context_index, record.directive_index) {
        (Some(index), _) => read(local(index)),
        (None, Some(directive)) => Expr::DirectiveContext(directive),
        (None, None) => read(Var::Context),
    };
    let args: Vec<Expr> = record.args.iter().map(|&a| read(local(a))).collect();
    let arg = |i: usize| -> Result<Box<Expr>> {
        args.get(i)
            .cloned()
            .map(Box::new)
            .ok_or_else(|| malformed(record, format!("expected at least {} argument(s)", i + 1)))
    };

    let value = match record.mode {
        RecordType::ImplicitReceiver => context,
        RecordType::Const => Expr::Literal(
            record
                .fixed_args
                .first()
                .cloned()
                .ok_or_else(|| malformed(record, "constant without a value".to_string()))?,
        ),
        RecordType::PropertyRead => Expr::PropertyRead {
            receiver: Box::new(context),
            name: record.name.clone(),
        },
        RecordType::SafeProperty => Expr::SafeAccess {
            receiver: Box::new(context.clone()),
            access: Box::new(Expr::PropertyRead {
                receiver: Box::new(context),
                name: record.name.clone(),
            }),
        },
        RecordType::PropertyWrite => Expr::PropertyWrite {
            receiver: Box::new(context),
            name: record.name.clone(),
            value: arg(0)?,
        },
        RecordType::Local => Expr::ReadLocals {
            scope,
            name: record.name.clone(),
        },
        RecordType::InvokeMethod => Expr::InvokeMethod {
            receiver: Box::new(context),
            name: record.name.clone(),
            args,
        },
        RecordType::SafeMethodInvoke => Expr::SafeAccess {
            receiver: Box::new(context.clone()),
            access: Box::new(Expr::InvokeMethod {
                receiver: Box::new(context),
                name: record.name.clone(),
                args,
            }),
        },
        RecordType::InvokeClosure | RecordType::PureFunction => Expr::InvokeClosure {
            function: Box::new(context),
            args,
        },
        RecordType::PrimitiveOp(op) => {
            if args.len() != op.arity() {
                return Err(malformed(
                    record,
                    format!("{} takes {} argument(s)", op.helper_name(), op.arity()),
                ));
            }
            Expr::PrimitiveOp { op, args }
        }
        RecordType::CollectionLiteral(kind) => {
            let keys: Vec<String> = match kind {
                CollectionKind::List => Vec::new(),
                CollectionKind::Map => record.fixed_args.iter().map(Literal::to_string).collect(),
            };
            if kind == CollectionKind::Map && keys.len() != args.len() {
                return Err(malformed(record, "map keys and values differ in length".to_string()));
            }
            Expr::CollectionLiteral { kind, keys, args }
        }
        RecordType::Interpolate => {
            if record.fixed_args.len() != args.len() + 1 {
                return Err(malformed(
                    record,
                    "interpolation needs one more fragment than arguments".to_string(),
                ));
            }
            Expr::Interpolate {
                fragments: record.fixed_args.iter().map(Literal::to_string).collect(),
                args,
            }
        }
        RecordType::KeyedRead => Expr::KeyedRead {
            receiver: Box::new(context),
            key: arg(0)?,
        },
        RecordType::KeyedWrite => Expr::KeyedWrite {
            receiver: Box::new(context),
            key: arg(0)?,
            value: arg(1)?,
        },
        RecordType::Chain => Expr::Literal(Literal::Null),
        RecordType::Pipe
        | RecordType::DirectiveLifecycle
        | RecordType::SkipRecordsIf
        | RecordType::SkipRecordsIfNot
        | RecordType::SkipRecords => {
            return Err(ChangeDetectionError::UnknownOperation(record.mode.to_string()));
        }
    };
    Ok(value)
}

pub(crate) fn malformed(record: &ProtoRecord, reason: String) -> ChangeDetectionError {
    ChangeDetectionError::MalformedRecord {
        record: record.self_index,
        mode: record.mode.to_string(),
        reason,
    }
}
