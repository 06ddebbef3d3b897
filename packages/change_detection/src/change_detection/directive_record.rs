//! Directive Records
//!
//! Corresponds to angular2/src/core/change_detection/directive_record.ts

use crate::change_detection::constants::ChangeDetectionStrategy;
use crate::change_detection::exceptions::ChangeDetectionError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a directive: the element it sits on and its slot on that element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveIndex {
    pub element_index: usize,
    pub directive_index: usize,
}

impl DirectiveIndex {
    pub fn new(element_index: usize, directive_index: usize) -> Self {
        DirectiveIndex {
            element_index,
            directive_index,
        }
    }

    pub fn name(&self) -> String {
        format!("{}_{}", self.element_index, self.directive_index)
    }
}

impl fmt::Display for DirectiveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleHook {
    OnChanges,
    OnInit,
    DoCheck,
    AfterContentInit,
    AfterContentChecked,
    AfterViewInit,
    AfterViewChecked,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 7] = [
        LifecycleHook::OnChanges,
        LifecycleHook::OnInit,
        LifecycleHook::DoCheck,
        LifecycleHook::AfterContentInit,
        LifecycleHook::AfterContentChecked,
        LifecycleHook::AfterViewInit,
        LifecycleHook::AfterViewChecked,
    ];

    pub fn flag(self) -> LifecycleHooks {
        match self {
            LifecycleHook::OnChanges => LifecycleHooks::ON_CHANGES,
            LifecycleHook::OnInit => LifecycleHooks::ON_INIT,
            LifecycleHook::DoCheck => LifecycleHooks::DO_CHECK,
            LifecycleHook::AfterContentInit => LifecycleHooks::AFTER_CONTENT_INIT,
            LifecycleHook::AfterContentChecked => LifecycleHooks::AFTER_CONTENT_CHECKED,
            LifecycleHook::AfterViewInit => LifecycleHooks::AFTER_VIEW_INIT,
            LifecycleHook::AfterViewChecked => LifecycleHooks::AFTER_VIEW_CHECKED,
        }
    }

    /// Name of the directive method the hook calls.
    pub fn method_name(self) -> &'static str {
        match self {
            LifecycleHook::OnChanges => "onChanges",
            LifecycleHook::OnInit => "onInit",
            LifecycleHook::DoCheck => "doCheck",
            LifecycleHook::AfterContentInit => "afterContentInit",
            LifecycleHook::AfterContentChecked => "afterContentChecked",
            LifecycleHook::AfterViewInit => "afterViewInit",
            LifecycleHook::AfterViewChecked => "afterViewChecked",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for LifecycleHook {
    type Err = ChangeDetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleHook::ALL
            .into_iter()
            .find(|hook| hook.to_string() == s)
            .ok_or_else(|| ChangeDetectionError::UnknownLifecycleEvent(s.to_string()))
    }
}

bitflags! {
    /// Lifecycle hooks a directive implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LifecycleHooks: u8 {
        const ON_CHANGES = 1 << 0;
        const ON_INIT = 1 << 1;
        const DO_CHECK = 1 << 2;
        const AFTER_CONTENT_INIT = 1 << 3;
        const AFTER_CONTENT_CHECKED = 1 << 4;
        const AFTER_VIEW_INIT = 1 << 5;
        const AFTER_VIEW_CHECKED = 1 << 6;
    }
}

impl Default for LifecycleHooks {
    fn default() -> Self {
        LifecycleHooks::empty()
    }
}

impl LifecycleHooks {
    pub fn hooks(self) -> impl Iterator<Item = LifecycleHook> {
        LifecycleHook::ALL
            .into_iter()
            .filter(move |hook| self.contains(hook.flag()))
    }
}

impl FromIterator<LifecycleHook> for LifecycleHooks {
    fn from_iter<I: IntoIterator<Item = LifecycleHook>>(iter: I) -> Self {
        iter.into_iter()
            .fold(LifecycleHooks::empty(), |acc, hook| acc | hook.flag())
    }
}

/// Hooks serialize as a list of hook names; an unknown name fails deserialization.
mod hook_list {
    use super::{LifecycleHook, LifecycleHooks};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(hooks: &LifecycleHooks, serializer: S) -> Result<S::Ok, S::Error> {
        hooks.hooks().collect::<Vec<_>>().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LifecycleHooks, D::Error> {
        let hooks = Vec::<LifecycleHook>::deserialize(deserializer)?;
        Ok(hooks.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveRecord {
    pub directive_index: DirectiveIndex,
    /// Whether the directive is the component hosted on its element.
    #[serde(default)]
    pub is_component: bool,
    #[serde(default, with = "hook_list")]
    pub lifecycle_hooks: LifecycleHooks,
    #[serde(default)]
    pub change_detection: ChangeDetectionStrategy,
}

impl DirectiveRecord {
    pub fn new(directive_index: DirectiveIndex) -> Self {
        DirectiveRecord {
            directive_index,
            is_component: false,
            lifecycle_hooks: LifecycleHooks::empty(),
            change_detection: ChangeDetectionStrategy::Default,
        }
    }

    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = LifecycleHook>) -> Self {
        self.lifecycle_hooks |= hooks.into_iter().collect::<LifecycleHooks>();
        self
    }

    pub fn with_component(mut self, is_component: bool) -> Self {
        self.is_component = is_component;
        self
    }

    pub fn with_change_detection(mut self, strategy: ChangeDetectionStrategy) -> Self {
        self.change_detection = strategy;
        self
    }

    pub fn calls(&self, hook: LifecycleHook) -> bool {
        self.lifecycle_hooks.contains(hook.flag())
    }

    pub fn call_on_changes(&self) -> bool {
        self.calls(LifecycleHook::OnChanges)
    }

    pub fn call_after_content_init(&self) -> bool {
        self.calls(LifecycleHook::AfterContentInit)
    }

    pub fn call_after_content_checked(&self) -> bool {
        self.calls(LifecycleHook::AfterContentChecked)
    }

    pub fn call_after_view_init(&self) -> bool {
        self.calls(LifecycleHook::AfterViewInit)
    }

    pub fn call_after_view_checked(&self) -> bool {
        self.calls(LifecycleHook::AfterViewChecked)
    }

    pub fn is_default_change_detection(&self) -> bool {
        self.change_detection.is_default()
    }
}
