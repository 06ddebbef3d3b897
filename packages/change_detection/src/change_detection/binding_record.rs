//! Binding Records
//!
//! Corresponds to angular2/src/core/change_detection/binding_record.ts

use crate::change_detection::directive_record::{DirectiveRecord, LifecycleHook};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingMode {
    Directive,
    ElementProperty,
    ElementAttribute,
    ElementClass,
    ElementStyle,
    TextNode,
    Event,
    HostEvent,
    DirectiveLifecycle,
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingMode::Directive => "directive",
            BindingMode::ElementProperty => "elementProperty",
            BindingMode::ElementAttribute => "elementAttribute",
            BindingMode::ElementClass => "elementClass",
            BindingMode::ElementStyle => "elementStyle",
            BindingMode::TextNode => "textNode",
            BindingMode::Event => "event",
            BindingMode::HostEvent => "hostEvent",
            BindingMode::DirectiveLifecycle => "directiveLifecycle",
        };
        f.write_str(name)
    }
}

/// Where a binding writes: an element slot or a directive input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingTarget {
    pub mode: BindingMode,
    pub element_index: usize,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Source text of the binding, reported by verification errors.
    #[serde(default)]
    pub debug: Option<String>,
}

impl BindingTarget {
    pub fn new(mode: BindingMode, element_index: usize, name: impl Into<String>) -> Self {
        BindingTarget {
            mode,
            element_index,
            name: name.into(),
            unit: None,
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }

    pub fn is_directive(&self) -> bool {
        self.mode == BindingMode::Directive
    }

    pub fn is_element_property(&self) -> bool {
        self.mode == BindingMode::ElementProperty
    }

    pub fn is_element_attribute(&self) -> bool {
        self.mode == BindingMode::ElementAttribute
    }

    pub fn is_element_class(&self) -> bool {
        self.mode == BindingMode::ElementClass
    }

    pub fn is_element_style(&self) -> bool {
        self.mode == BindingMode::ElementStyle
    }

    pub fn is_text_node(&self) -> bool {
        self.mode == BindingMode::TextNode
    }

    /// Text used to attribute errors to this binding.
    pub fn describe(&self) -> String {
        self.debug.clone().unwrap_or_else(|| self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    pub mode: BindingMode,
    #[serde(default)]
    pub target: Option<BindingTarget>,
    #[serde(default)]
    pub directive_record: Option<DirectiveRecord>,
    #[serde(default)]
    pub lifecycle_event: Option<LifecycleHook>,
}

impl BindingRecord {
    pub fn is_directive_lifecycle(&self) -> bool {
        self.mode == BindingMode::DirectiveLifecycle
    }

    pub fn call_on_changes(&self) -> bool {
        self.directive_record
            .map(|d| d.call_on_changes())
            .unwrap_or(false)
    }

    pub fn is_default_change_detection(&self) -> bool {
        self.directive_record
            .map(|d| d.is_default_change_detection())
            .unwrap_or(true)
    }

    pub fn create_directive_do_check(directive_record: DirectiveRecord) -> Self {
        Self::create_directive_lifecycle(LifecycleHook::DoCheck, directive_record)
    }

    pub fn create_directive_on_init(directive_record: DirectiveRecord) -> Self {
        Self::create_directive_lifecycle(LifecycleHook::OnInit, directive_record)
    }

    pub fn create_directive_on_changes(directive_record: DirectiveRecord) -> Self {
        Self::create_directive_lifecycle(LifecycleHook::OnChanges, directive_record)
    }

    fn create_directive_lifecycle(hook: LifecycleHook, directive_record: DirectiveRecord) -> Self {
        BindingRecord {
            mode: BindingMode::DirectiveLifecycle,
            target: None,
            directive_record: Some(directive_record),
            lifecycle_event: Some(hook),
        }
    }

    pub fn create_for_directive(directive_record: DirectiveRecord, property_name: impl Into<String>) -> Self {
        let element_index = directive_record.directive_index.element_index;
        BindingRecord {
            mode: BindingMode::Directive,
            target: Some(BindingTarget::new(BindingMode::Directive, element_index, property_name)),
            directive_record: Some(directive_record),
            lifecycle_event: None,
        }
    }

    pub fn create_for_element_property(element_index: usize, property_name: impl Into<String>) -> Self {
        Self::create_for_element(BindingMode::ElementProperty, element_index, property_name)
    }

    pub fn create_for_element_attribute(element_index: usize, attribute_name: impl Into<String>) -> Self {
        Self::create_for_element(BindingMode::ElementAttribute, element_index, attribute_name)
    }

    pub fn create_for_element_class(element_index: usize, class_name: impl Into<String>) -> Self {
        Self::create_for_element(BindingMode::ElementClass, element_index, class_name)
    }

    pub fn create_for_element_style(
        element_index: usize,
        style_name: impl Into<String>,
        unit: Option<String>,
    ) -> Self {
        let mut record = Self::create_for_element(BindingMode::ElementStyle, element_index, style_name);
        if let Some(target) = record.target.as_mut() {
            target.unit = unit;
        }
        record
    }

    pub fn create_for_text_node(text_node_index: usize) -> Self {
        Self::create_for_element(BindingMode::TextNode, text_node_index, "")
    }

    pub fn create_for_event(directive_record: Option<DirectiveRecord>, event_name: impl Into<String>) -> Self {
        BindingRecord {
            mode: if directive_record.is_some() {
                BindingMode::HostEvent
            } else {
                BindingMode::Event
            },
            target: Some(BindingTarget::new(BindingMode::Event, 0, event_name)),
            directive_record,
            lifecycle_event: None,
        }
    }

    fn create_for_element(mode: BindingMode, element_index: usize, name: impl Into<String>) -> Self {
        BindingRecord {
            mode,
            target: Some(BindingTarget::new(mode, element_index, name)),
            directive_record: None,
            lifecycle_event: None,
        }
    }

    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        if let Some(target) = self.target.as_mut() {
            target.debug = Some(debug.into());
        }
        self
    }
}
