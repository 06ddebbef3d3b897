//! Proto Record Builder
//!
//! Corresponds to angular2/src/core/change_detection/proto_change_detector.ts
//! Assembles ordered records binding by binding and sets the flags the code
//! generator relies on.

use crate::change_detection::binding_record::BindingRecord;
use crate::change_detection::directive_record::{DirectiveIndex, DirectiveRecord};
use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use crate::change_detection::proto_record::{EventBinding, ProtoRecord, RecordType};
use crate::change_detection::value::Literal;

#[derive(Debug)]
struct BuiltRecord {
    record: ProtoRecord,
    /// Directive owning the binding the record was built for.
    owner: Option<DirectiveIndex>,
}

#[derive(Debug, Clone, Copy)]
struct OpenBinding {
    binding_index: usize,
    owner: Option<DirectiveIndex>,
    start: usize,
}

#[derive(Debug, Default)]
pub struct ProtoRecordBuilder {
    records: Vec<BuiltRecord>,
    open: Option<OpenBinding>,
}

impl ProtoRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the records of `binding`. When the previous binding belongs to
    /// the same directive its last record stops being last in directive.
    pub fn begin_binding(&mut self, binding_index: usize, binding: &BindingRecord) {
        self.end_binding();
        let owner = binding.directive_record.map(|d| d.directive_index);
        if let Some(old_last) = self.records.last_mut() {
            if old_last.owner == owner {
                old_last.record.last_in_directive = false;
            }
        }
        self.open = Some(OpenBinding {
            binding_index,
            owner,
            start: self.records.len(),
        });
    }

    /// Appends a record to the open binding and returns its index.
    pub fn push(
        &mut self,
        mode: RecordType,
        name: impl Into<String>,
        context_index: Option<usize>,
        args: &[usize],
        fixed_args: Vec<Literal>,
    ) -> usize {
        let self_index = self.records.len();
        let mut record = ProtoRecord::new(mode, name, self_index);
        record.context_index = context_index;
        record.args = args.iter().copied().collect();
        record.fixed_args = fixed_args;
        record.binding_index = self.open.map(|b| b.binding_index).unwrap_or_default();
        self.records.push(BuiltRecord {
            record,
            owner: self.open.and_then(|b| b.owner),
        });
        self_index
    }

    /// Evaluates a record with a blank context against a directive instance
    /// (host bindings).
    pub fn in_directive_context(&mut self, index: usize, directive: DirectiveIndex) {
        if let Some(built) = self.records.get_mut(index) {
            built.record.directive_index = Some(directive);
        }
    }

    /// Closes the open binding: its last record becomes last in binding and
    /// last in directive, and arguments of pure functions and pipes are
    /// flagged.
    pub fn end_binding(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        if self.records.len() == open.start {
            return;
        }
        if let Some(last) = self.records.last_mut() {
            last.record.last_in_binding = true;
            last.record.last_in_directive = true;
        }
        self.set_argument_to_pure_function(open.start);
    }

    /// Adds the single record of a lifecycle binding.
    pub fn add_lifecycle(&mut self, binding_index: usize, binding: &BindingRecord) -> Result<usize> {
        let hook = binding
            .lifecycle_event
            .ok_or(ChangeDetectionError::MissingBindingTarget(binding_index))?;
        if binding.directive_record.is_none() {
            return Err(ChangeDetectionError::MissingDirectiveRecord(binding_index));
        }
        self.begin_binding(binding_index, binding);
        let index = self.push(RecordType::DirectiveLifecycle, hook.to_string(), None, &[], Vec::new());
        self.end_binding();
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(mut self) -> Vec<ProtoRecord> {
        self.end_binding();
        self.records.into_iter().map(|built| built.record).collect()
    }

    /// Finishes the records of one event handler. Each statement of the
    /// handler is one binding, so every statement result is checked for
    /// `false`.
    pub fn finish_event(
        self,
        event_name: impl Into<String>,
        el_index: usize,
        directive_record: Option<DirectiveRecord>,
    ) -> EventBinding {
        EventBinding {
            event_name: event_name.into(),
            target: None,
            el_index,
            directive_record,
            records: self.finish(),
        }
    }

    fn set_argument_to_pure_function(&mut self, start: usize) {
        for i in start..self.records.len() {
            let record = &self.records[i].record;
            let flagged: Vec<usize> = if record.is_pipe_record() {
                record.dependencies().collect()
            } else if record.is_pure_function() {
                record.args.to_vec()
            } else {
                continue;
            };
            for index in flagged {
                if let Some(arg) = self.records.get_mut(index) {
                    arg.record.argument_to_pure_function = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_detection::directive_record::LifecycleHook;

    fn dir(el: usize) -> DirectiveRecord {
        DirectiveRecord::new(DirectiveIndex::new(el, 0)).with_hooks([LifecycleHook::DoCheck])
    }

    #[test]
    fn test_last_in_binding_and_directive() {
        let a = BindingRecord::create_for_directive(dir(0), "a");
        let b = BindingRecord::create_for_directive(dir(0), "b");
        let mut builder = ProtoRecordBuilder::new();
        builder.begin_binding(0, &a);
        let ra = builder.push(RecordType::PropertyRead, "a", None, &[], vec![]);
        builder.begin_binding(1, &b);
        let rb = builder.push(RecordType::PropertyRead, "b", None, &[], vec![]);
        let records = builder.finish();

        assert!(records[ra].last_in_binding);
        assert!(!records[ra].last_in_directive);
        assert!(records[rb].last_in_binding);
        assert!(records[rb].last_in_directive);
        assert_eq!(records[rb].binding_index, 1);
    }

    #[test]
    fn test_directive_change_keeps_last_in_directive() {
        let a = BindingRecord::create_for_directive(dir(0), "a");
        let b = BindingRecord::create_for_directive(dir(1), "b");
        let mut builder = ProtoRecordBuilder::new();
        builder.begin_binding(0, &a);
        builder.push(RecordType::PropertyRead, "a", None, &[], vec![]);
        builder.begin_binding(1, &b);
        builder.push(RecordType::PropertyRead, "b", None, &[], vec![]);
        let records = builder.finish();
        assert!(records[0].last_in_directive);
        assert!(records[1].last_in_directive);
    }

    #[test]
    fn test_pure_function_and_pipe_arguments_are_flagged() {
        let binding = BindingRecord::create_for_text_node(0);
        let mut builder = ProtoRecordBuilder::new();
        builder.begin_binding(0, &binding);
        let name = builder.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        let arg = builder.push(RecordType::Const, "const", None, &[], vec![Literal::from(2)]);
        let pipe = builder.push(RecordType::Pipe, "slice", Some(name), &[arg], vec![]);
        let interpolate = builder.push(
            RecordType::Interpolate,
            "interpolate",
            None,
            &[pipe],
            vec![Literal::from("<"), Literal::from(">")],
        );
        builder.end_binding();
        let records = builder.finish();

        assert!(records[name].argument_to_pure_function);
        assert!(records[arg].argument_to_pure_function);
        assert!(records[pipe].argument_to_pure_function);
        assert!(!records[interpolate].argument_to_pure_function);
        assert!(records[interpolate].last_in_binding);
    }

    #[test]
    fn test_lifecycle_binding_needs_directive() {
        let mut builder = ProtoRecordBuilder::new();
        let binding = BindingRecord::create_directive_do_check(dir(0));
        let index = builder.add_lifecycle(0, &binding).unwrap();
        let records = builder.finish();
        assert_eq!(records[index].mode, RecordType::DirectiveLifecycle);
        assert_eq!(records[index].name, "DoCheck");

        let mut builder = ProtoRecordBuilder::new();
        let element = BindingRecord::create_for_element_property(0, "value");
        assert!(builder.add_lifecycle(0, &element).is_err());
    }
}
