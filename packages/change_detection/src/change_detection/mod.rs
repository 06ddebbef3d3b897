//! Change Detection Module
//!
//! Corresponds to angular2/src/core/change_detection
//! Proto records, the JIT code generator and the runtime detectors it produces

pub mod abstract_change_detector;
pub mod binding_record;
pub mod change_detection_jit_generator;
pub mod change_detection_util;
pub mod change_detector;
pub mod change_detector_ref;
pub mod codegen_logic_util;
pub mod codegen_name_util;
pub mod constants;
pub mod definition;
pub mod directive_record;
pub mod exceptions;
pub mod interfaces;
pub mod jit_change_detection;
pub mod pipes;
pub mod proto_record;
pub mod proto_record_builder;
pub mod value;

pub use abstract_change_detector::AbstractChangeDetector;
pub use binding_record::{BindingMode, BindingRecord, BindingTarget};
pub use change_detection_jit_generator::{ChangeDetectorJitGenerator, ChangeDetectorProgram, VERIFY_CHANGES};
pub use change_detection_util::{PrimitiveOp, SimpleChange, SimpleChanges};
pub use change_detector::{ChangeDetector, ChangeDetectorHandle};
pub use change_detector_ref::ChangeDetectorRef;
pub use codegen_name_util::{sanitize_name, CodegenNameUtil};
pub use constants::{ChangeDetectionStrategy, ChangeDetectorState};
pub use definition::{ChangeDetectorDefinition, ChangeDetectorGenConfig};
pub use directive_record::{DirectiveIndex, DirectiveRecord, LifecycleHook, LifecycleHooks};
pub use exceptions::{ChangeDetectionError, Result};
pub use interfaces::{ChangeDispatcher, Directive, DirectiveInstances, DirectiveRef, Directives, Locals};
pub use jit_change_detection::{ChangeDetection, JitProtoChangeDetector};
pub use pipes::{PipeRegistry, PipeTransform, Pipes, SelectedPipe};
pub use proto_record::{CollectionKind, EventBinding, ProtoRecord, RecordType};
pub use proto_record_builder::ProtoRecordBuilder;
pub use value::{Literal, Value};
