//! Statement execution.

use crate::parser::ast::{ProgramData, StatementType};
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;

use super::expression::evaluate_expression;
use super::types::{Completion, EvalResult, ValueResult};

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &EvalContext) -> EvalResult {
    match stmt {
        StatementType::EmptyStatement { .. } => Ok(Completion::normal()),

        StatementType::VariableDeclaration { declarations, .. } => {
            for declaration in declarations {
                let value = match &declaration.init {
                    Some(init) => Some(evaluate_expression(init, ctx)?),
                    None => None,
                };
                ctx.declare_global(&declaration.id.name, value)?;
            }
            Ok(Completion::normal())
        }

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }
    }
}

/// Run every statement of a program in order. The result is the value of the
/// last statement that produced one, `undefined` if none did.
pub fn execute_program(program: &ProgramData, ctx: &EvalContext) -> ValueResult {
    let mut last_value = JsValue::Undefined;
    for stmt in &program.body {
        if let Some(value) = execute_statement(stmt, ctx)?.value {
            last_value = value;
        }
    }
    Ok(last_value)
}
