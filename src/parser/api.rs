use pest::error::{Error, ErrorVariant};
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Span};
use pest_derive::Parser;

use super::ast::*;

#[derive(Parser)]
#[grammar = "parser/script_grammar.pest"] // relative to src
pub struct ScriptParser;

const TAB_WIDTH: usize = 2;

impl ScriptParser {
    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, Error<Rule>> {
        let pairs = ScriptParser::parse(Rule::script, script)?;
        build_ast_from_script(pairs, script)
    }

    /// Indented dump of the parse tree, one rule per line.
    pub fn parse_to_token_tree(script: &str) -> Result<String, Error<Rule>> {
        let mut tree = vec![];
        for pair in ScriptParser::parse(Rule::script, script)? {
            tree.push(pair_to_string(pair, 0).join("\n"));
        }
        Ok(tree.join("\n"))
    }
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    tree.push(format!(
        "{}{:?} => ({},{}) #{:?}",
        " ".repeat(level * TAB_WIDTH),
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    ));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    Meta {
        start_index: pair.as_span().start(),
        end_index: pair.as_span().end(),
    }
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn next_pair<'i>(pair_iter: &mut Pairs<'i, Rule>, parent: Span<'i>) -> Result<Pair<'i, Rule>, Error<Rule>> {
    pair_iter.next().ok_or_else(|| {
        Error::new_from_span(
            ErrorVariant::CustomError {
                message: "Unexpected end of rule".to_string(),
            },
            parent,
        )
    })
}

fn build_ast_from_script(pairs: Pairs<Rule>, script: &str) -> Result<ProgramData, Error<Rule>> {
    let mut body = vec![];
    for pair in pairs {
        if pair.as_rule() != Rule::script {
            return Err(get_unexpected_error(1, &pair));
        }
        for inner_pair in pair.into_inner() {
            match inner_pair.as_rule() {
                Rule::EOI => { /* Do nothing */ }
                _ => body.push(build_ast_from_statement(inner_pair)?),
            }
        }
    }
    Ok(ProgramData {
        meta: Meta {
            start_index: 0,
            end_index: script.len(),
        },
        body,
    })
}

fn build_ast_from_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::variable_statement => {
            let mut declarations = vec![];
            for var_pair in pair.into_inner() {
                match var_pair.as_rule() {
                    Rule::kw_var => { /* Do nothing */ }
                    Rule::variable_declaration => {
                        declarations.push(build_ast_from_variable_declaration(var_pair)?)
                    }
                    _ => return Err(get_unexpected_error(2, &var_pair)),
                }
            }
            StatementType::VariableDeclaration { meta, declarations }
        }
        Rule::expression_statement => {
            let mut pair_iter = pair.into_inner();
            StatementType::ExpressionStatement {
                meta,
                expression: build_ast_from_assignment_expression(next_pair(&mut pair_iter, span)?)?,
            }
        }
        _ => return Err(get_unexpected_error(3, &pair)),
    })
}

fn build_ast_from_variable_declaration(pair: Pair<Rule>) -> Result<VariableDeclaratorData, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut pair_iter = pair.into_inner();
    let id = get_identifier_data(next_pair(&mut pair_iter, span)?);
    let init = match pair_iter.next() {
        Some(init_pair) => Some(build_ast_from_assignment_expression(init_pair)?),
        None => None,
    };
    Ok(VariableDeclaratorData { meta, id, init })
}

fn get_identifier_data(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        meta: get_meta(&pair),
        name: pair.as_str().to_string(),
    }
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut pair_iter = pair.into_inner();
    let first = next_pair(&mut pair_iter, span)?;
    match first.as_rule() {
        Rule::equality_expression => build_ast_from_equality_expression(first),
        Rule::left_hand_side_expression => {
            let target_span = first.as_span();
            let left = build_ast_from_left_hand_side_expression(first)?;
            match left {
                ExpressionType::Identifier(_) | ExpressionType::MemberExpression { .. } => {}
                _ => {
                    return Err(Error::new_from_span(
                        ErrorVariant::CustomError {
                            message: "Invalid left-hand side in assignment".to_string(),
                        },
                        target_span,
                    ))
                }
            }
            let operator = next_pair(&mut pair_iter, span)?;
            if operator.as_rule() != Rule::assignment_operator {
                return Err(get_unexpected_error(4, &operator));
            }
            let right = build_ast_from_assignment_expression(next_pair(&mut pair_iter, span)?)?;
            Ok(ExpressionType::AssignmentExpression {
                meta,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        _ => Err(get_unexpected_error(5, &first)),
    }
}

fn build_ast_from_equality_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let span = pair.as_span();
    let start_index = span.start();
    let mut pair_iter = pair.into_inner();
    let mut left = build_ast_from_unary_expression(next_pair(&mut pair_iter, span)?)?;
    while let Some(operator_pair) = pair_iter.next() {
        let operator = match operator_pair.as_str() {
            "===" => BinaryOperator::StrictlyEqual,
            "!==" => BinaryOperator::StrictlyUnequal,
            "==" => BinaryOperator::LooselyEqual,
            "!=" => BinaryOperator::LooselyUnequal,
            _ => return Err(get_unexpected_error(6, &operator_pair)),
        };
        let right_pair = next_pair(&mut pair_iter, span)?;
        let end_index = right_pair.as_span().end();
        let right = build_ast_from_unary_expression(right_pair)?;
        left = ExpressionType::BinaryExpression {
            meta: Meta {
                start_index,
                end_index,
            },
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let span = pair.as_span();
    let end_index = span.end();
    let mut operators = vec![];
    let mut operand = None;
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::unary_operator => {
                let operator = if inner_pair.as_str() == "!" {
                    UnaryOperator::LogicalNot
                } else {
                    UnaryOperator::TypeOf
                };
                operators.push((operator, inner_pair.as_span().start()));
            }
            Rule::left_hand_side_expression => {
                operand = Some(build_ast_from_left_hand_side_expression(inner_pair)?)
            }
            _ => return Err(get_unexpected_error(7, &inner_pair)),
        }
    }
    let mut expression = match operand {
        Some(expression) => expression,
        None => {
            return Err(Error::new_from_span(
                ErrorVariant::CustomError {
                    message: "Missing operand".to_string(),
                },
                span,
            ))
        }
    };
    // Innermost operator applies first.
    for (operator, start_index) in operators.into_iter().rev() {
        expression = ExpressionType::UnaryExpression {
            meta: Meta {
                start_index,
                end_index,
            },
            operator,
            argument: Box::new(expression),
        };
    }
    Ok(expression)
}

fn build_ast_from_left_hand_side_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let span = pair.as_span();
    let mut pair_iter = pair.into_inner();
    let first = next_pair(&mut pair_iter, span)?;
    let obj = match first.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(first)?,
        Rule::primary_expression => build_ast_from_primary_expression(first)?,
        _ => return Err(get_unexpected_error(8, &first)),
    };
    build_ast_from_tails(obj, pair_iter, span.start())
}

/// Folds `.name` and `(args)` suffixes onto `obj`, left to right.
fn build_ast_from_tails(
    mut obj: ExpressionType,
    pair_iter: Pairs<Rule>,
    start_index: usize,
) -> Result<ExpressionType, Error<Rule>> {
    for pair in pair_iter {
        let meta = Meta {
            start_index,
            end_index: pair.as_span().end(),
        };
        obj = match pair.as_rule() {
            Rule::property_access => {
                let span = pair.as_span();
                ExpressionType::MemberExpression {
                    meta,
                    object: Box::new(obj),
                    property: get_identifier_data(next_pair(&mut pair.into_inner(), span)?),
                }
            }
            Rule::arguments => ExpressionType::CallExpression {
                meta,
                callee: Box::new(obj),
                arguments: get_arguments(pair)?,
            },
            _ => return Err(get_unexpected_error(9, &pair)),
        };
    }
    Ok(obj)
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut callee = None;
    let mut arguments = vec![];
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::kw_new => { /* Do nothing */ }
            Rule::member_expression => callee = Some(build_ast_from_member_expression(inner_pair)?),
            Rule::arguments => arguments = get_arguments(inner_pair)?,
            _ => return Err(get_unexpected_error(10, &inner_pair)),
        }
    }
    match callee {
        Some(callee) => Ok(ExpressionType::NewExpression {
            meta,
            callee: Box::new(callee),
            arguments,
        }),
        None => Err(Error::new_from_span(
            ErrorVariant::CustomError {
                message: "Missing constructor in new expression".to_string(),
            },
            span,
        )),
    }
}

fn build_ast_from_member_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let span = pair.as_span();
    let mut pair_iter = pair.into_inner();
    let obj = build_ast_from_primary_expression(next_pair(&mut pair_iter, span)?)?;
    build_ast_from_tails(obj, pair_iter, span.start())
}

fn get_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionType>, Error<Rule>> {
    let mut arguments = vec![];
    for inner_pair in pair.into_inner() {
        arguments.push(build_ast_from_assignment_expression(inner_pair)?);
    }
    Ok(arguments)
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let span = pair.as_span();
    let inner_pair = next_pair(&mut pair.into_inner(), span)?;
    Ok(match inner_pair.as_rule() {
        Rule::literal => build_ast_from_literal(inner_pair)?,
        Rule::identifier_reference => ExpressionType::Identifier(get_identifier_data(inner_pair)),
        Rule::assignment_expression => build_ast_from_assignment_expression(inner_pair)?,
        _ => return Err(get_unexpected_error(11, &inner_pair)),
    })
}

fn build_ast_from_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let inner_pair = next_pair(&mut pair.into_inner(), span)?;
    let value = match inner_pair.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(inner_pair.as_str() == "true"),
        Rule::numeric_literal => build_ast_from_numeric_literal(inner_pair)?,
        Rule::string_literal => build_ast_from_string_literal(inner_pair)?,
        _ => return Err(get_unexpected_error(12, &inner_pair)),
    };
    Ok(ExpressionType::Literal(LiteralData { meta, value }))
}

fn build_ast_from_numeric_literal(pair: Pair<Rule>) -> Result<LiteralType, Error<Rule>> {
    let text = pair.as_str();
    let is_float = pair
        .clone()
        .into_inner()
        .any(|p| p.as_rule() == Rule::decimal_digits);
    let invalid = |e: String| {
        Error::new_from_span(
            ErrorVariant::CustomError {
                message: format!("Invalid number literal {}: {}", text, e),
            },
            pair.as_span(),
        )
    };
    Ok(LiteralType::NumberLiteral(if is_float {
        NumberLiteralType::FloatLiteral(text.parse::<f64>().map_err(|e| invalid(e.to_string()))?)
    } else {
        NumberLiteralType::IntegerLiteral(text.parse::<i64>().map_err(|e| invalid(e.to_string()))?)
    }))
}

fn build_ast_from_string_literal(pair: Pair<Rule>) -> Result<LiteralType, Error<Rule>> {
    let span = pair.as_span();
    let characters = next_pair(&mut pair.into_inner(), span)?;
    let mut value = String::with_capacity(characters.as_str().len());
    let mut chars = characters.as_str().chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('0') => value.push('\0'),
            Some(other) => value.push(other),
            None => {}
        }
    }
    Ok(LiteralType::StringLiteral(value))
}
