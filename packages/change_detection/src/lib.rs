#![deny(clippy::all)]

/**
 * Angular Change Detection - Rust Implementation
 *
 * Generates specialized change detectors from proto records and runs them
 * against live directive instances.
 */

// Change detection modules (mirrors angular2/src/core/change_detection/*.ts)
pub mod change_detection;

// Generated program representation, rendering and evaluation
pub mod output;

// Re-exports
pub use change_detection::{
    BindingRecord, BindingTarget, ChangeDetection, ChangeDetectionError, ChangeDetectionStrategy,
    ChangeDetector, ChangeDetectorDefinition, ChangeDetectorGenConfig, ChangeDetectorHandle,
    ChangeDetectorJitGenerator, ChangeDetectorProgram, ChangeDetectorRef, ChangeDetectorState,
    ChangeDispatcher, Directive, DirectiveIndex, DirectiveInstances, DirectiveRecord, DirectiveRef,
    EventBinding, JitProtoChangeDetector, LifecycleHook, Locals, PipeRegistry, PipeTransform, Pipes,
    ProtoRecord, ProtoRecordBuilder, RecordType, Result, SelectedPipe, SimpleChange, SimpleChanges,
    Value, VERIFY_CHANGES,
};
