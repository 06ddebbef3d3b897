//! Change Detector Codegen Tests
//!
//! Corresponds to angular2/test/core/change_detection/change_detector_spec.ts
//! (property bindings, pipes, pure functions and verification)


use angular_change_detection::change_detection::PrimitiveOp;
use angular_change_detection::{
    BindingRecord, ChangeDetection, ChangeDetectionError, ChangeDetectorDefinition, ChangeDetectorState,
    DirectiveInstances, DirectiveRecord, JitProtoChangeDetector, LifecycleHook, PipeRegistry, PipeTransform,
    Pipes, ProtoRecordBuilder, RecordType, Result, Value,
};
use angular_change_detection::change_detection::Literal;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use test_util::*;

/// `title` bound to the value built by `build`.
fn title_definition(build: impl FnOnce(&mut ProtoRecordBuilder)) -> ChangeDetectorDefinition {
    let binding = BindingRecord::create_for_element_property(0, "title").with_debug("title: {{a}}");
    let mut builder = ProtoRecordBuilder::new();
    builder.begin_binding(0, &binding);
    build(&mut builder);

    let mut def = ChangeDetectorDefinition::new("MyComp_comp_0");
    def.binding_records.push(binding);
    def.records = builder.finish();
    def
}

fn read_a() -> ChangeDetectorDefinition {
    title_definition(|b| {
        b.push(RecordType::PropertyRead, "a", None, &[], vec![]);
    })
}

fn counter_fn(calls: &Rc<Cell<usize>>, result: Value) -> Value {
    let calls = calls.clone();
    Value::function(move |_| {
        calls.set(calls.get() + 1);
        result.clone()
    })
}

#[test]
fn should_notify_the_dispatcher_on_change() {
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::from(1))]);
    let mut cd = hydrated(&read_a(), &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=1"]);

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=1"]);

    context.set_property("a", Value::from(2)).unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=1", "title=2"]);
    assert_eq!(cd.state(), ChangeDetectorState::CheckedBefore);
}

#[test]
fn should_treat_nan_as_unchanged() {
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::Number(f64::NAN))]);
    let mut cd = hydrated(&read_a(), &dispatcher, context, None);

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=NaN"]);
}

#[test]
fn should_evaluate_safe_property_reads_of_null() {
    let def = title_definition(|b| {
        let user = b.push(RecordType::PropertyRead, "user", None, &[], vec![]);
        b.push(RecordType::SafeProperty, "name", Some(user), &[], vec![]);
    });
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("user", Value::Null)]);
    let mut cd = hydrated(&def, &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=null"]);

    context
        .set_property("user", Value::object([("name", Value::from("bob"))]))
        .unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=null", "title=bob"]);
}

#[test]
fn should_interpolate() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        b.push(
            RecordType::Interpolate,
            "interpolate",
            None,
            &[name],
            vec![Literal::from("Hello "), Literal::from("!")],
        );
    });
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("name", Value::Null)]);
    let mut cd = hydrated(&def, &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    context.set_property("name", Value::from("bob")).unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=Hello !", "title=Hello bob!"]);
}

#[test]
fn should_call_pure_pipes_only_when_their_input_changes() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        b.push(RecordType::Pipe, "upper", Some(name), &[], vec![]);
    });
    let (calls, destroyed) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("name", Value::from("bob"))]);
    let mut cd = hydrated(&def, &dispatcher, context.clone(), Some(pipes(&calls, &destroyed)));

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(dispatcher.borrow().log, vec!["title=BOB"]);

    context.set_property("name", Value::from("alice")).unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(dispatcher.borrow().log, vec!["title=BOB", "title=ALICE"]);
}

#[test]
fn should_call_impure_pipes_on_every_pass() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        b.push(RecordType::Pipe, "impureUpper", Some(name), &[], vec![]);
    });
    let (calls, destroyed) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("name", Value::from("bob"))]);
    let mut cd = hydrated(&def, &dispatcher, context, Some(pipes(&calls, &destroyed)));

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(dispatcher.borrow().log, vec!["title=BOB"]);
}

#[test]
fn should_call_pure_pipes_over_the_context_once() {
    // {{ this | upper }}
    let def = title_definition(|b| {
        b.push(RecordType::Pipe, "upper", None, &[], vec![]);
    });
    let (calls, destroyed) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let dispatcher = TestDispatcher::new();
    let mut cd = hydrated(&def, &dispatcher, Value::from("bob"), Some(pipes(&calls, &destroyed)));

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(dispatcher.borrow().log, vec!["title=BOB"]);
}

#[test]
fn should_pass_pipe_arguments() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        let suffix = b.push(RecordType::Const, "suffix", None, &[], vec![Literal::from("?")]);
        b.push(RecordType::Pipe, "upper", Some(name), &[suffix], vec![]);
    });
    let (calls, destroyed) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("name", Value::from("bob"))]);
    let mut cd = hydrated(&def, &dispatcher, context, Some(pipes(&calls, &destroyed)));

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=BOB?"]);
}

#[test]
fn should_fail_on_unknown_pipes() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        b.push(RecordType::Pipe, "lower", Some(name), &[], vec![]);
    });
    let (calls, destroyed) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("name", Value::from("bob"))]);
    let mut cd = hydrated(&def, &dispatcher, context, Some(pipes(&calls, &destroyed)));

    assert!(matches!(
        cd.detect_changes(),
        Err(ChangeDetectionError::PipeNotFound(name)) if name == "lower"
    ));
    assert_eq!(cd.state(), ChangeDetectorState::Errored);
}

struct WrapPipe;

impl PipeTransform for WrapPipe {
    fn transform(&mut self, value: &Value, _args: &[Value]) -> Result<Value> {
        Ok(Value::wrap(value.clone()))
    }
}

#[test]
fn should_notify_wrapped_values_on_every_pass() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        b.push(RecordType::Pipe, "wrap", Some(name), &[], vec![]);
    });
    let mut registry = PipeRegistry::new();
    registry.register("wrap", false, || WrapPipe);
    let pipes: Rc<dyn Pipes> = Rc::new(registry);
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("name", Value::from("bob"))]);
    let mut cd = hydrated(&def, &dispatcher, context, Some(pipes));

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=bob", "title=bob"]);
}

#[test]
fn should_only_evaluate_the_taken_branch_of_a_conditional() {
    // cond ? getA() : getB()
    let def = title_definition(|b| {
        let cond = b.push(RecordType::PropertyRead, "cond", None, &[], vec![]);
        b.push(RecordType::SkipRecordsIfNot, "skip", Some(cond), &[], vec![Literal::from(4)]);
        let a = b.push(RecordType::InvokeMethod, "getA", None, &[], vec![]);
        b.push(RecordType::SkipRecords, "skip", None, &[], vec![Literal::from(5)]);
        let other = b.push(RecordType::InvokeMethod, "getB", None, &[], vec![]);
        b.push(RecordType::PrimitiveOp(PrimitiveOp::Cond), "cond", None, &[cond, a, other], vec![]);
    });
    let (a_calls, b_calls) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let context = Value::object([
        ("cond", Value::from(true)),
        ("getA", counter_fn(&a_calls, Value::from("A"))),
        ("getB", counter_fn(&b_calls, Value::from("B"))),
    ]);
    let dispatcher = TestDispatcher::new();
    let mut cd = hydrated(&def, &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    assert_eq!((a_calls.get(), b_calls.get()), (1, 0));
    assert_eq!(dispatcher.borrow().log, vec!["title=A"]);

    context.set_property("cond", Value::from(false)).unwrap();
    cd.detect_changes().unwrap();
    assert_eq!((a_calls.get(), b_calls.get()), (1, 1));
    assert_eq!(dispatcher.borrow().log, vec!["title=A", "title=B"]);
}

#[test]
fn should_skip_records_when_the_condition_holds() {
    // `a?.b` lowered to a skip block guarded by `a == null`
    let def = title_definition(|b| {
        let a = b.push(RecordType::PropertyRead, "a", None, &[], vec![]);
        let null = b.push(RecordType::Const, "null", None, &[], vec![Literal::Null]);
        let is_null = b.push(RecordType::PrimitiveOp(PrimitiveOp::Equals), "==", None, &[a, null], vec![]);
        b.push(RecordType::SkipRecordsIf, "skip", Some(is_null), &[], vec![Literal::from(5)]);
        b.push(RecordType::PropertyRead, "b", Some(a), &[], vec![]);
    });
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::Null)]);
    let mut cd = hydrated(&def, &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    assert!(dispatcher.borrow().log.is_empty());

    context
        .set_property("a", Value::object([("b", Value::from(7))]))
        .unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=7"]);
}

#[test]
fn should_memoize_pure_functions() {
    let def = title_definition(|b| {
        let f = b.push(RecordType::PropertyRead, "double", None, &[], vec![]);
        let x = b.push(RecordType::PropertyRead, "x", None, &[], vec![]);
        b.push(RecordType::PureFunction, "double", Some(f), &[x], vec![]);
    });
    let calls = Rc::new(Cell::new(0));
    let counted = calls.clone();
    let double = Value::function(move |args| {
        counted.set(counted.get() + 1);
        Value::Number(args[0].as_number().unwrap_or_default() * 2.0)
    });
    let context = Value::object([("double", double), ("x", Value::from(2))]);
    let dispatcher = TestDispatcher::new();
    let mut cd = hydrated(&def, &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 1);

    context.set_property("x", Value::from(5)).unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(dispatcher.borrow().log, vec!["title=4", "title=10"]);
}

#[test]
fn should_call_zero_argument_pure_functions_once() {
    let def = title_definition(|b| {
        let f = b.push(RecordType::PropertyRead, "make", None, &[], vec![]);
        b.push(RecordType::PureFunction, "make", Some(f), &[], vec![]);
    });
    let calls = Rc::new(Cell::new(0));
    let context = Value::object([("make", counter_fn(&calls, Value::from("made")))]);
    let dispatcher = TestDispatcher::new();
    let mut cd = hydrated(&def, &dispatcher, context, None);

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(dispatcher.borrow().log, vec!["title=made"]);
}

#[test]
fn should_evaluate_collection_literals() {
    let def = title_definition(|b| {
        let a = b.push(RecordType::PropertyRead, "a", None, &[], vec![]);
        let list = b.push(
            RecordType::CollectionLiteral(angular_change_detection::change_detection::CollectionKind::List),
            "arrayFn1",
            None,
            &[a],
            vec![],
        );
        b.push(RecordType::PropertyRead, "length", Some(list), &[], vec![]);
    });
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::from(1))]);
    let mut cd = hydrated(&def, &dispatcher, context, None);

    cd.detect_changes().unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=1"]);
}

#[cfg(any(debug_assertions, feature = "verify-changes"))]
#[test]
fn should_throw_when_a_binding_changes_during_verification() {
    let mut def = read_a();
    def.gen_config.gen_debug_info = true;
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::from(1))]);
    let mut cd = hydrated(&def, &dispatcher, context.clone(), None);

    cd.detect_changes().unwrap();
    cd.check_no_changes().unwrap();

    context.set_property("a", Value::from(2)).unwrap();
    let err = cd.check_no_changes().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expression 'title: {{a}}' has changed after it was checked. Previous value: '1'. Current value: '2'"
    );
    assert_ne!(cd.state(), ChangeDetectorState::Errored);

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=1", "title=2"]);
}

#[test]
fn should_not_notify_during_verification() {
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::from(1))]);
    let mut cd = hydrated(&read_a(), &dispatcher, context, None);

    cd.detect_changes().unwrap();
    cd.check_no_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=1"]);
}

#[test]
fn should_record_changes_for_on_changes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let directive = TestDirective::new("dir", log.clone());
    let record = DirectiveRecord::new(dir(0, 0)).with_hooks([LifecycleHook::OnChanges]);

    let a = BindingRecord::create_for_directive(record, "a");
    let b = BindingRecord::create_for_directive(record, "b");
    let on_changes = BindingRecord::create_directive_on_changes(record);
    let mut builder = ProtoRecordBuilder::new();
    builder.begin_binding(0, &a);
    builder.push(RecordType::PropertyRead, "x", None, &[], vec![]);
    builder.begin_binding(1, &b);
    builder.push(RecordType::PropertyRead, "y", None, &[], vec![]);
    builder.add_lifecycle(2, &on_changes).unwrap();

    let mut def = ChangeDetectorDefinition::new("MyComp_comp_0");
    def.binding_records = vec![a, b, on_changes];
    def.directive_records.push(record);
    def.records = builder.finish();

    let dispatcher = TestDispatcher::new();
    let context = Value::object([("x", Value::from(1)), ("y", Value::from(2))]);
    let mut cd = instantiate(&def, &dispatcher);
    let mut instances = DirectiveInstances::new();
    instances.add(dir(0, 0), directive.clone());
    cd.hydrate(context.clone(), None, &instances, None).unwrap();

    cd.detect_changes().unwrap();
    {
        let directive = directive.borrow();
        assert_eq!(directive.props["a"], Value::from(1));
        assert_eq!(directive.props["b"], Value::from(2));
        let changes = &directive.changes[0];
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(changes["a"].is_first_change());
        assert_eq!(changes["b"].current_value, Value::from(2));
    }

    cd.detect_changes().unwrap();
    assert_eq!(directive.borrow().changes.len(), 1);

    context.set_property("y", Value::from(3)).unwrap();
    cd.detect_changes().unwrap();
    {
        let directive = directive.borrow();
        assert_eq!(directive.changes.len(), 2);
        let changes = &directive.changes[1];
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(changes["b"].previous_value, Value::from(2));
        assert_eq!(changes["b"].current_value, Value::from(3));
    }
    assert_eq!(*log.borrow(), vec!["dir.onChanges", "dir.onChanges"]);
    // Directive inputs never reach the dispatcher.
    assert!(dispatcher.borrow().log.is_empty());
}

#[test]
fn should_keep_changes_separate_per_directive() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let first = TestDirective::new("first", log.clone());
    let second = TestDirective::new("second", log.clone());
    let first_record = DirectiveRecord::new(dir(0, 0)).with_hooks([LifecycleHook::OnChanges]);
    let second_record = DirectiveRecord::new(dir(0, 1)).with_hooks([LifecycleHook::OnChanges]);

    let a = BindingRecord::create_for_directive(first_record, "a");
    let first_on_changes = BindingRecord::create_directive_on_changes(first_record);
    let b = BindingRecord::create_for_directive(second_record, "b");
    let second_on_changes = BindingRecord::create_directive_on_changes(second_record);
    let mut builder = ProtoRecordBuilder::new();
    builder.begin_binding(0, &a);
    builder.push(RecordType::PropertyRead, "x", None, &[], vec![]);
    builder.add_lifecycle(1, &first_on_changes).unwrap();
    builder.begin_binding(2, &b);
    builder.push(RecordType::PropertyRead, "y", None, &[], vec![]);
    builder.add_lifecycle(3, &second_on_changes).unwrap();

    let mut def = ChangeDetectorDefinition::new("MyComp_comp_0");
    def.binding_records = vec![a, first_on_changes, b, second_on_changes];
    def.directive_records = vec![first_record, second_record];
    def.records = builder.finish();

    let dispatcher = TestDispatcher::new();
    let context = Value::object([("x", Value::from(1)), ("y", Value::from(2))]);
    let mut cd = instantiate(&def, &dispatcher);
    let mut instances = DirectiveInstances::new();
    instances
        .add(dir(0, 0), first.clone())
        .add(dir(0, 1), second.clone());
    cd.hydrate(context.clone(), None, &instances, None).unwrap();

    cd.detect_changes().unwrap();
    assert_eq!(first.borrow().changes[0].keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(second.borrow().changes[0].keys().collect::<Vec<_>>(), vec!["b"]);

    context.set_property("x", Value::from(5)).unwrap();
    cd.detect_changes().unwrap();
    assert_eq!(first.borrow().changes.len(), 2);
    assert_eq!(first.borrow().changes[1]["a"].current_value, Value::from(5));
    assert_eq!(second.borrow().changes.len(), 1);
    assert_eq!(
        *log.borrow(),
        vec!["first.onChanges", "second.onChanges", "first.onChanges"]
    );
}

#[test]
fn should_enter_the_errored_state() {
    let def = title_definition(|b| {
        b.push(RecordType::Local, "missing", None, &[], vec![]);
    });
    let dispatcher = TestDispatcher::new();
    let mut cd = hydrated(&def, &dispatcher, Value::object(Vec::<(&str, Value)>::new()), None);

    assert!(matches!(
        cd.detect_changes(),
        Err(ChangeDetectionError::UnknownLocal(name)) if name == "missing"
    ));
    assert_eq!(cd.state(), ChangeDetectorState::Errored);

    // Errored detectors are skipped.
    cd.detect_changes().unwrap();
    assert!(dispatcher.borrow().log.is_empty());
}

#[test]
fn should_read_locals() {
    let def = title_definition(|b| {
        b.push(RecordType::Local, "item", None, &[], vec![]);
    });
    let dispatcher = TestDispatcher::new();
    let mut cd = instantiate(&def, &dispatcher);
    cd.hydrate(
        Value::object(Vec::<(&str, Value)>::new()),
        Some(locals(&[("item", Value::from("first"))])),
        &DirectiveInstances::new(),
        None,
    )
    .unwrap();

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=first"]);
}

#[test]
fn should_log_binding_updates_when_configured() {
    let mut def = read_a();
    def.gen_config.log_binding_update = true;
    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::from(1))]);
    let mut cd = hydrated(&def, &dispatcher, context, None);

    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().logged_updates, vec!["title=1"]);

    let dispatcher = TestDispatcher::new();
    let context = Value::object([("a", Value::from(1))]);
    let mut cd = hydrated(&read_a(), &dispatcher, context, None);
    cd.detect_changes().unwrap();
    assert!(dispatcher.borrow().logged_updates.is_empty());
}

#[test]
fn should_share_generated_programs_between_instances() {
    let detection = ChangeDetection::new();
    let def = read_a();
    let proto = detection.get_proto_change_detector(&def).unwrap();
    detection.get_proto_change_detector(&def).unwrap();
    assert_eq!(detection.len(), 1);
    assert!(JitProtoChangeDetector::is_supported());

    let first_dispatcher = TestDispatcher::new();
    let second_dispatcher = TestDispatcher::new();
    let mut first = proto.instantiate(first_dispatcher.clone()).unwrap();
    let mut second = proto.instantiate(second_dispatcher.clone()).unwrap();
    assert!(Rc::ptr_eq(first.program(), second.program()));

    first
        .hydrate(Value::object([("a", Value::from(1))]), None, &DirectiveInstances::new(), None)
        .unwrap();
    second
        .hydrate(Value::object([("a", Value::from(2))]), None, &DirectiveInstances::new(), None)
        .unwrap();
    first.detect_changes().unwrap();
    second.detect_changes().unwrap();
    assert_eq!(first_dispatcher.borrow().log, vec!["title=1"]);
    assert_eq!(second_dispatcher.borrow().log, vec!["title=2"]);
}

#[test]
fn should_load_definitions_from_json() {
    let def = ChangeDetectorDefinition::from_json(
        r#"{
            "id": "MyComp_comp_0",
            "bindingRecords": [
                {"mode": "elementProperty", "target": {"mode": "elementProperty", "elementIndex": 0, "name": "title"}}
            ],
            "records": [
                {"mode": "propertyRead", "name": "a", "selfIndex": 0, "lastInBinding": true, "lastInDirective": true}
            ]
        }"#,
    )
    .unwrap();
    let dispatcher = TestDispatcher::new();
    let mut cd = hydrated(&def, &dispatcher, Value::object([("a", Value::from("x"))]), None);
    cd.detect_changes().unwrap();
    assert_eq!(dispatcher.borrow().log, vec!["title=x"]);
}
