#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
}

impl HasMeta for ProgramData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

impl HasMeta for IdentifierData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementType {
    EmptyStatement {
        meta: Meta,
    },
    VariableDeclaration {
        meta: Meta,
        declarations: Vec<VariableDeclaratorData>,
    },
    ExpressionStatement {
        meta: Meta,
        expression: ExpressionType,
    },
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::EmptyStatement { meta }
            | StatementType::VariableDeclaration { meta, .. }
            | StatementType::ExpressionStatement { meta, .. } => meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<ExpressionType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    MemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: IdentifierData,
    },
    CallExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    NewExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    /// `left` is always an identifier or a member expression.
    AssignmentExpression {
        meta: Meta,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(data) => &data.meta,
            ExpressionType::Identifier(data) => &data.meta,
            ExpressionType::MemberExpression { meta, .. }
            | ExpressionType::CallExpression { meta, .. }
            | ExpressionType::NewExpression { meta, .. }
            | ExpressionType::UnaryExpression { meta, .. }
            | ExpressionType::BinaryExpression { meta, .. }
            | ExpressionType::AssignmentExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    TypeOf,
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    StrictlyEqual,
    StrictlyUnequal,
    LooselyEqual,
    LooselyUnequal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    NumberLiteral(NumberLiteralType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberLiteralType {
    IntegerLiteral(i64),
    FloatLiteral(f64),
}
