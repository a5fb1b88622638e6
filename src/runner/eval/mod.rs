//! Evaluation module for executing script ASTs.
//!
//! A tree-walking evaluator over [`crate::parser::ast`]. Identifiers are
//! resolved through [`EvalContext::get_global`](crate::runner::ds::realm::EvalContext::get_global),
//! so every free name a script mentions can reach the context's
//! `get_property` hook.

pub mod expression;
pub mod statement;
pub mod types;

pub use types::{Completion, EvalResult, ValueResult};
