//! Change Detector Definitions
//!
//! Corresponds to angular2/src/core/change_detection/interfaces.ts
//! (`ChangeDetectorDefinition`, `ChangeDetectorGenConfig`)

use crate::change_detection::binding_record::BindingRecord;
use crate::change_detection::constants::ChangeDetectionStrategy;
use crate::change_detection::directive_record::DirectiveRecord;
use crate::change_detection::exceptions::Result;
use crate::change_detection::proto_record::{EventBinding, ProtoRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeDetectorGenConfig {
    /// Keep binding source text in the property binding target table.
    pub gen_debug_info: bool,
    /// Report every binding update to the dispatcher.
    pub log_binding_update: bool,
}

impl Default for ChangeDetectorGenConfig {
    fn default() -> Self {
        ChangeDetectorGenConfig {
            gen_debug_info: cfg!(debug_assertions),
            log_binding_update: false,
        }
    }
}

impl ChangeDetectorGenConfig {
    pub fn new(gen_debug_info: bool, log_binding_update: bool) -> Self {
        ChangeDetectorGenConfig {
            gen_debug_info,
            log_binding_update,
        }
    }
}

/// Everything the generator needs to build one change detector program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDetectorDefinition {
    pub id: String,
    #[serde(default)]
    pub strategy: ChangeDetectionStrategy,
    #[serde(default)]
    pub binding_records: Vec<BindingRecord>,
    #[serde(default)]
    pub directive_records: Vec<DirectiveRecord>,
    #[serde(default)]
    pub event_bindings: Vec<EventBinding>,
    /// Property records in evaluation order.
    #[serde(default)]
    pub records: Vec<ProtoRecord>,
    #[serde(default)]
    pub gen_config: ChangeDetectorGenConfig,
}

impl ChangeDetectorDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        ChangeDetectorDefinition {
            id: id.into(),
            strategy: ChangeDetectionStrategy::Default,
            binding_records: Vec::new(),
            directive_records: Vec::new(),
            event_bindings: Vec::new(),
            records: Vec::new(),
            gen_config: ChangeDetectorGenConfig::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let definition: Self = serde_json::from_str(&content)?;
        Ok(definition)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
