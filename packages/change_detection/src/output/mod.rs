//! Output Module
//!
//! Corresponds to packages/compiler/src/output
//! The program IR, its source rendering and its interpreter

pub mod abstract_emitter;
pub mod output_ast;
pub mod output_interpreter;
