//! Expression evaluation.

use crate::parser::ast::{
    BinaryOperator, ExpressionType, LiteralData, LiteralType, NumberLiteralType, UnaryOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::{JsNumberType, JsValue};

use super::types::ValueResult;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(id) => ctx.get_global(&id.name),

        ExpressionType::MemberExpression { object, property, .. } => {
            let object = evaluate_expression(object, ctx)?;
            ctx.get_property(&object, &property.name)
        }

        ExpressionType::CallExpression { callee, arguments, .. } => {
            evaluate_call_expression(callee, arguments, ctx)
        }

        ExpressionType::NewExpression { callee, arguments, .. } => {
            let constructor = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            ctx.construct(&constructor, args)
        }

        ExpressionType::UnaryExpression { operator, argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(match operator {
                UnaryOperator::TypeOf => JsValue::String(value.type_of().to_string()),
                UnaryOperator::LogicalNot => JsValue::Boolean(!value.is_truthy()),
            })
        }

        ExpressionType::BinaryExpression { operator, left, right, .. } => {
            let left = evaluate_expression(left, ctx)?;
            let right = evaluate_expression(right, ctx)?;
            Ok(JsValue::Boolean(match operator {
                BinaryOperator::StrictlyEqual => left == right,
                BinaryOperator::StrictlyUnequal => left != right,
                BinaryOperator::LooselyEqual => left.loosely_equals(&right),
                BinaryOperator::LooselyUnequal => !left.loosely_equals(&right),
            }))
        }

        ExpressionType::AssignmentExpression { left, right, .. } => {
            evaluate_assignment_expression(left, right, ctx)
        }
    }
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => {
            JsValue::Number(JsNumberType::Integer(*i))
        }
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => {
            JsValue::Number(JsNumberType::Float(*f))
        }
    }
}

fn evaluate_arguments(arguments: &[ExpressionType], ctx: &EvalContext) -> Result<Vec<JsValue>, JErrorType> {
    arguments
        .iter()
        .map(|arg| evaluate_expression(arg, ctx))
        .collect()
}

/// Member calls pass the object as `this`; plain calls pass `undefined`.
fn evaluate_call_expression(
    callee: &ExpressionType,
    arguments: &[ExpressionType],
    ctx: &EvalContext,
) -> ValueResult {
    let (this, function) = match callee {
        ExpressionType::MemberExpression { object, property, .. } => {
            let this = evaluate_expression(object, ctx)?;
            let function = ctx.get_property(&this, &property.name)?;
            (this, function)
        }
        _ => (JsValue::Undefined, evaluate_expression(callee, ctx)?),
    };
    let args = evaluate_arguments(arguments, ctx)?;
    ctx.call(&function, this, args)
}

fn evaluate_assignment_expression(
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &EvalContext,
) -> ValueResult {
    match left {
        ExpressionType::Identifier(id) => {
            let value = evaluate_expression(right, ctx)?;
            ctx.set_global(&id.name, value.clone())?;
            Ok(value)
        }
        ExpressionType::MemberExpression { object, property, .. } => {
            let target = evaluate_expression(object, ctx)?;
            let value = evaluate_expression(right, ctx)?;
            ctx.set_property(&target, &property.name, value.clone())?;
            Ok(value)
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}
