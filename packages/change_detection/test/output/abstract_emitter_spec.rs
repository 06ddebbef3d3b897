//! Abstract Emitter Tests
//!
//! Corresponds to packages/compiler/test/output/abstract_emitter_spec.ts
//! and the generated source of change_detection_jit_generator.ts

use angular_change_detection::output::abstract_emitter::escape_identifier;
use angular_change_detection::{
    BindingRecord, ChangeDetectionStrategy, ChangeDetectorDefinition, ChangeDetectorJitGenerator,
    DirectiveIndex, DirectiveRecord, LifecycleHook, ProtoRecordBuilder, RecordType, VERIFY_CHANGES,
};

fn source(def: &ChangeDetectorDefinition) -> String {
    ChangeDetectorJitGenerator::new(def).generate().unwrap().source()
}

fn title_definition(build: impl FnOnce(&mut ProtoRecordBuilder)) -> ChangeDetectorDefinition {
    let binding = BindingRecord::create_for_element_property(0, "title");
    let mut builder = ProtoRecordBuilder::new();
    builder.begin_binding(0, &binding);
    build(&mut builder);

    let mut def = ChangeDetectorDefinition::new("MyComp_comp_0");
    def.gen_config.gen_debug_info = false;
    def.binding_records.push(binding);
    def.records = builder.finish();
    def
}

fn assert_lines(source: &str, lines: &[&str]) {
    for line in lines {
        assert!(
            source.lines().any(|l| l.trim() == *line),
            "missing line `{}` in:\n{}",
            line,
            source
        );
    }
}

#[test]
fn should_escape_identifiers() {
    assert_eq!(escape_identifier("'", false, true), "'\\''");
    assert_eq!(escape_identifier("\\", false, true), "'\\\\'");
    assert_eq!(escape_identifier("\n", false, true), "'\\n'");
    assert_eq!(escape_identifier("$", true, true), "'\\$'");
    assert_eq!(escape_identifier("$", false, true), "'$'");
    assert_eq!(escape_identifier("==", false, false), "'=='");
    assert_eq!(escape_identifier("a$b", false, false), "a$b");
}

#[test]
fn should_emit_a_complete_detector_type() {
    let def = title_definition(|b| {
        b.push(RecordType::PropertyRead, "a", None, &[], vec![]);
    });
    let verify = if VERIFY_CHANGES {
        "    if (throwOnChange) {\n      this.throwOnChangeError(this.f0_a, l0_a);\n    }\n"
    } else {
        ""
    };
    let expected = format!(
        "\
var ChangeDetector_MyComp_comp_0 = function ChangeDetector_MyComp_comp_0(dispatcher) {{
  AbstractChangeDetector.call(this, 'MyComp_comp_0', dispatcher, 1, ChangeDetector_MyComp_comp_0.gen_propertyBindingTargets, ChangeDetector_MyComp_comp_0.gen_directiveIndices, ChangeDetectionStrategy.Default);
  this.dehydrateDirectives(false);
}}

ChangeDetector_MyComp_comp_0.prototype = Object.create(AbstractChangeDetector.prototype);

ChangeDetector_MyComp_comp_0.prototype.detectChangesInRecordsInternal = function(throwOnChange) {{
  var l_context = this.context, l0_a;
  var isChanged = false, changes = null;
  this.propertyBindingIndex = 0;
  l0_a = l_context.a;
  if (ChangeDetectionUtil.looseNotIdentical(this.f0_a, l0_a)) {{
{verify}    this.notifyDispatcher(l0_a);
    this.f0_a = l0_a;
  }}
  changes = null;
  isChanged = false;
}}

ChangeDetector_MyComp_comp_0.prototype.dehydrateDirectives = function(destroyPipes) {{
  this.f0_a = ChangeDetectionUtil.uninitialized;
}}

ChangeDetector_MyComp_comp_0.gen_propertyBindingTargets = [ChangeDetectionUtil.bindingTarget('elementProperty', 0, 'title', null, null)];
ChangeDetector_MyComp_comp_0.gen_directiveIndices = [];

return function(dispatcher) {{ return new ChangeDetector_MyComp_comp_0(dispatcher); }}"
    );
    assert_eq!(source(&def), expected);
}

#[test]
fn should_emit_pipe_checks_and_teardown() {
    let def = title_definition(|b| {
        let name = b.push(RecordType::PropertyRead, "name", None, &[], vec![]);
        b.push(RecordType::Pipe, "upper", Some(name), &[], vec![]);
    });
    assert_lines(
        &source(&def),
        &[
            "var l_context = this.context, l0_name, c0_name = false, l1_upper;",
            "c0_name = true;",
            "if (this.p1_upper === ChangeDetectionUtil.uninitialized) {",
            "this.p1_upper = this.pipes.get('upper');",
            "if (!this.p1_upper.pure || c0_name) {",
            "l1_upper = this.p1_upper.pipe.transform(l0_name, []);",
            "l1_upper = ChangeDetectionUtil.unwrapValue(l1_upper);",
            "if (destroyPipes) {",
            "this.p1_upper.pipe.onDestroy();",
            "this.f0_name = this.f1_upper = this.p1_upper = ChangeDetectionUtil.uninitialized;",
        ],
    );
}

#[test]
fn should_emit_event_handlers() {
    let binding = BindingRecord::create_for_event(None, "click");
    let mut builder = ProtoRecordBuilder::new();
    builder.begin_binding(0, &binding);
    let event = builder.push(RecordType::Local, "$event", None, &[], vec![]);
    builder.push(RecordType::InvokeMethod, "onClick", None, &[event], vec![]);
    let mut def = ChangeDetectorDefinition::new("MyComp_comp_0");
    def.event_bindings.push(builder.finish_event("click", 0, None));

    assert_lines(
        &source(&def),
        &[
            "ChangeDetector_MyComp_comp_0.prototype.handleEventInternal = function(eventName, elIndex, locals) {",
            "var preventDefault = false;",
            "var l_context = this.context, e0_0_event, e0_1_onClick;",
            "if (eventName === 'click' && elIndex === 0) {",
            "e0_0_event = locals.get('$event');",
            "e0_1_onClick = l_context.onClick(e0_0_event);",
            "if (e0_1_onClick === false) {",
            "preventDefault = true;",
            "return preventDefault;",
        ],
    );
}

#[test]
fn should_emit_directive_lifecycle_and_hydration() {
    let index = DirectiveIndex::new(0, 0);
    let record = DirectiveRecord::new(index)
        .with_hooks([
            LifecycleHook::OnChanges,
            LifecycleHook::OnInit,
            LifecycleHook::DoCheck,
            LifecycleHook::AfterViewInit,
        ])
        .with_change_detection(ChangeDetectionStrategy::OnPush);
    let input = BindingRecord::create_for_directive(record, "a");
    let on_changes = BindingRecord::create_directive_on_changes(record);
    let on_init = BindingRecord::create_directive_on_init(record);
    let do_check = BindingRecord::create_directive_do_check(record);
    let mut builder = ProtoRecordBuilder::new();
    builder.begin_binding(0, &input);
    builder.push(RecordType::PropertyRead, "x", None, &[], vec![]);
    builder.add_lifecycle(1, &on_changes).unwrap();
    builder.add_lifecycle(2, &on_init).unwrap();
    builder.add_lifecycle(3, &do_check).unwrap();

    let mut def = ChangeDetectorDefinition::new("MyComp_comp_0");
    def.binding_records = vec![input, on_changes, on_init, do_check];
    def.directive_records.push(record);
    def.records = builder.finish();

    let source = source(&def);
    assert_lines(
        &source,
        &[
            "this.directive_0_0.a = l0_x;",
            "isChanged = true;",
            "changes = this.addChange(changes, this.f0_x, l0_x);",
            "if (!throwOnChange && changes) {",
            "this.directive_0_0.onChanges(changes);",
            "if (!throwOnChange && (this.state === ChangeDetectorState.NeverChecked)) {",
            "this.directive_0_0.onInit();",
            "if (!throwOnChange) {",
            "this.directive_0_0.doCheck();",
            "if (isChanged) {",
            "this.detector_0_0.markAsCheckOnce();",
            "ChangeDetector_MyComp_comp_0.prototype.afterViewLifecycleCallbacksInternal = function() {",
            "if (this.state === ChangeDetectorState.NeverChecked) {",
            "this.directive_0_0.afterViewInit();",
            "this.directive_0_0 = directives.getDirectiveFor(this.directiveIndices[0]);",
            "this.detector_0_0 = directives.getDetectorFor(this.directiveIndices[0]);",
            "ChangeDetector_MyComp_comp_0.gen_directiveIndices = [{elementIndex: 0, directiveIndex: 0}];",
        ],
    );
    assert!(!source.contains("afterContentLifecycleCallbacksInternal"));
}
