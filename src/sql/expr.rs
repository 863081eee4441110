//! Expression AST - the core of SQL expression building.
//!
//! This module provides a strongly-typed AST for SQL expressions
//! with exhaustive pattern matching enforced by the compiler. Rendering is
//! fallible: a construct the target dialect cannot express is reported as
//! `UnsupportedFeature`, never approximated.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use uuid::Uuid;

use super::dialect::{Dialect, Feature, SqlDialect};
use super::function::{DatePart, PortableFunction};
use super::query::{QueryExpr, Select};
use super::token::{Token, TokenStream};
use super::types::ValueType;
use crate::error::{Error, Result};
use crate::mapping::temporal::infinity_sign;
use crate::mapping::{MappingOptions, NativeInterval, Sign, Value};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal values
    Literal(Literal),

    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Bound parameter, rendered as a dialect placeholder.
    Parameter(Parameter),

    /// Unary operation: op expr
    Unary { op: UnaryOperator, expr: Box<Expr> },

    /// Binary operation: left op right
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Function call: portable or native name with arguments.
    Function {
        name: FunctionName,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// Date part extraction.
    Extract { part: DatePart, expr: Box<Expr> },

    /// CAST(expr AS type)
    Cast { expr: Box<Expr>, to: ValueType },

    /// CASE [operand] WHEN... THEN... ELSE... END
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// Row value constructor: (a, b, c)
    Row(Vec<Expr>),

    /// Subquery: (SELECT ...)
    Subquery(Box<QueryExpr>),

    /// IN: expr IN (values...)
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// IN subquery: expr IN (SELECT ...)
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<QueryExpr>,
        negated: bool,
    },

    /// [NOT] EXISTS (SELECT ...)
    Exists {
        subquery: Box<QueryExpr>,
        negated: bool,
    },

    /// UNIQUE (SELECT ...)
    Unique(Box<QueryExpr>),

    /// expr MATCH [UNIQUE] [SIMPLE | PARTIAL | FULL] (SELECT ...)
    Match {
        expr: Box<Expr>,
        subquery: Box<QueryExpr>,
        unique: bool,
        kind: MatchKind,
    },

    /// left op ALL | ANY | SOME (SELECT ...)
    Quantified {
        left: Box<Expr>,
        op: BinaryOperator,
        quantifier: Quantifier,
        subquery: Box<QueryExpr>,
    },

    /// BETWEEN: expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// LIKE with ESCAPE: expr LIKE pattern ESCAPE escape_char
    LikeEscape {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        escape_char: char,
        negated: bool,
    },

    /// Wildcard: * or table.*
    Star { table: Option<String> },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Provider SQL kept verbatim.
    ///
    /// Extraction produces these for default values and view bodies it
    /// cannot parse. Never pass user input here: the text is not escaped.
    Native(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Exact decimal in plain notation.
    Decimal(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Interval(TimeDelta),
    Bytes(Vec<u8>),
    Guid(Uuid),
}

/// A named, typed parameter. The value is optional: a statement can be
/// compiled before its arguments are known.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value_type: ValueType,
    pub value: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Function name: portable (translated per dialect) or native (emitted as is).
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionName {
    Portable(PortableFunction),
    Native(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    // String
    Concat,
    Like,
}

/// Binding strength of comparison-like predicates (`=`, `BETWEEN`, `IN`,
/// `IS NULL`, `LIKE`).
const PREDICATE: u8 = 4;
/// Bitwise and concatenation operators rank differently across dialects,
/// so mixing them with any other operator is always parenthesized.
const BITWISE: u8 = 5;

impl BinaryOperator {
    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Gt
            | BinaryOperator::Lte
            | BinaryOperator::Gte
            | BinaryOperator::Like => PREDICATE,
            BinaryOperator::BitAnd
            | BinaryOperator::BitOr
            | BinaryOperator::BitXor
            | BinaryOperator::Concat => BITWISE,
            BinaryOperator::Plus | BinaryOperator::Minus => 6,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 7,
        }
    }

    /// Whether `(a op b) op c` may be written `a op b op c`.
    pub fn is_left_associative(&self) -> bool {
        !self.is_comparison() && *self != BinaryOperator::Like
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Gt
                | BinaryOperator::Lte
                | BinaryOperator::Gte
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    BitNot,
}

/// Quantifier of a quantified comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    Some,
}

/// MATCH predicate flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchKind {
    #[default]
    Simple,
    Partial,
    Full,
}

// =============================================================================
// Render Context
// =============================================================================

/// Everything rendering needs besides the tree itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderContext {
    pub dialect: Dialect,
    pub options: MappingOptions,
}

impl RenderContext {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            options: MappingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MappingOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<Dialect> for RenderContext {
    fn from(dialect: Dialect) -> Self {
        RenderContext::new(dialect)
    }
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream for the context's dialect.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        let mut ts = TokenStream::new();

        match self {
            Expr::Literal(lit) => {
                ts.append(&lit.to_tokens(cx)?);
            }

            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Parameter(p) => {
                ts.push(Token::Param(Box::new(p.clone())));
            }

            Expr::Unary { op, expr } => {
                let wrap = match op {
                    UnaryOperator::Not => match expr.precedence() {
                        Some(p) => p < NOT,
                        None => false,
                    },
                    // "- -x" must not collapse into a "--" comment
                    UnaryOperator::Minus | UnaryOperator::BitNot => expr.precedence().is_some(),
                };
                match op {
                    UnaryOperator::Not => ts.push(Token::Not).space(),
                    UnaryOperator::Minus => ts.push(Token::Minus),
                    UnaryOperator::BitNot => ts.push(Token::BitNot),
                };
                ts.append(&operand(expr, wrap, cx)?);
            }

            Expr::Binary { left, op, right } => {
                let l = operand(left, left.needs_parens_under(*op, false), cx)?;
                let r = operand(right, right.needs_parens_under(*op, true), cx)?;
                if *op == BinaryOperator::Concat && !dialect.supports_concat_operator() {
                    // Emit CONCAT(left, right) function instead
                    ts.push(Token::FunctionName("CONCAT".into()));
                    ts.parenthesized([&l, &r]);
                } else {
                    if *op == BinaryOperator::BitXor {
                        dialect.require(Feature::BitwiseXor)?;
                    }
                    ts.append(&l);
                    ts.space();
                    ts.push(binary_op_to_token(*op));
                    ts.space();
                    ts.append(&r);
                }
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                let rendered = args
                    .iter()
                    .map(|a| a.to_tokens(cx))
                    .collect::<Result<Vec<_>>>()?;
                match name {
                    FunctionName::Portable(func) => {
                        if !func.arity().accepts(args.len()) {
                            return Err(Error::InvalidStatement(format!(
                                "{} does not accept {} argument(s)",
                                func,
                                args.len()
                            )));
                        }
                        if *distinct {
                            return Err(Error::InvalidStatement(format!(
                                "DISTINCT is not valid for {}",
                                func
                            )));
                        }
                        let emitted = dialect.emit_function(*func, &rendered).ok_or_else(|| {
                            Error::unsupported(format!("function {}", func), dialect.name())
                        })?;
                        ts.append(&emitted);
                    }
                    FunctionName::Native(fname) => {
                        ts.push(Token::FunctionName(fname.clone()));
                        ts.lparen();
                        if *distinct {
                            ts.push(Token::Distinct).space();
                        }
                        ts.comma_separated(&rendered);
                        ts.rparen();
                    }
                }
            }

            Expr::Extract { part, expr } => {
                let inner = expr.to_tokens(cx)?;
                let emitted = dialect.emit_extract(*part, &inner).ok_or_else(|| {
                    Error::unsupported(format!("date part {}", part), dialect.name())
                })?;
                ts.append(&emitted);
            }

            Expr::Cast { expr, to } => {
                ts.push(Token::Cast).lparen();
                ts.append(&expr.to_tokens(cx)?);
                ts.space().push(Token::As).space();
                ts.raw(dialect.emit_data_type(to));
                ts.rparen();
            }

            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                ts.push(Token::Case);
                if let Some(op) = operand {
                    ts.space().append(&op.to_tokens(cx)?);
                }
                for (when, then) in when_clauses {
                    ts.space().push(Token::When).space();
                    ts.append(&when.to_tokens(cx)?);
                    ts.space().push(Token::Then).space();
                    ts.append(&then.to_tokens(cx)?);
                }
                if let Some(else_expr) = else_clause {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_expr.to_tokens(cx)?);
                }
                ts.space().push(Token::End);
            }

            Expr::Row(items) => {
                dialect.require(Feature::RowConstructor)?;
                let rendered = items
                    .iter()
                    .map(|e| e.to_tokens(cx))
                    .collect::<Result<Vec<_>>>()?;
                ts.parenthesized(&rendered);
            }

            Expr::Subquery(query) => {
                ts.lparen();
                ts.append(&query.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::InList {
                expr,
                list,
                negated,
            } => {
                // "x IN ()" is invalid SQL; it is always false
                if list.is_empty() {
                    ts.raw(if *negated { "1 = 1" } else { "1 = 0" });
                } else {
                    ts.append(&predicate_operand(expr, cx)?);
                    if *negated {
                        ts.space().push(Token::Not);
                    }
                    let rendered = list
                        .iter()
                        .map(|e| e.to_tokens(cx))
                        .collect::<Result<Vec<_>>>()?;
                    ts.space().push(Token::In).space();
                    ts.parenthesized(&rendered);
                }
            }

            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                ts.append(&predicate_operand(expr, cx)?);
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::In).space().lparen();
                ts.append(&subquery.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::Exists { subquery, negated } => {
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Exists).space().lparen();
                ts.append(&subquery.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::Unique(subquery) => {
                dialect.require(Feature::UniquePredicate)?;
                ts.push(Token::Unique).space().lparen();
                ts.append(&subquery.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::Match {
                expr,
                subquery,
                unique,
                kind,
            } => {
                dialect.require(Feature::MatchPredicate)?;
                ts.append(&predicate_operand(expr, cx)?);
                ts.space().push(Token::Match);
                if *unique {
                    ts.space().push(Token::Unique);
                }
                match kind {
                    MatchKind::Simple => {}
                    MatchKind::Partial => {
                        ts.space().push(Token::Partial);
                    }
                    MatchKind::Full => {
                        ts.space().push(Token::Full);
                    }
                }
                ts.space().lparen();
                ts.append(&subquery.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::Quantified {
                left,
                op,
                quantifier,
                subquery,
            } => {
                dialect.require(Feature::QuantifiedComparison)?;
                if !op.is_comparison() {
                    return Err(Error::InvalidStatement(format!(
                        "{:?} cannot be used in a quantified comparison",
                        op
                    )));
                }
                ts.append(&predicate_operand(left, cx)?);
                ts.space().push(binary_op_to_token(*op)).space();
                ts.push(match quantifier {
                    Quantifier::All => Token::All,
                    Quantifier::Any => Token::Any,
                    Quantifier::Some => Token::Some,
                });
                ts.space().lparen();
                ts.append(&subquery.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                ts.append(&predicate_operand(expr, cx)?);
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::Between).space();
                ts.append(&predicate_operand(low, cx)?);
                ts.space().push(Token::And).space();
                ts.append(&predicate_operand(high, cx)?);
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&predicate_operand(expr, cx)?);
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }

            Expr::LikeEscape {
                expr,
                pattern,
                escape_char,
                negated,
            } => {
                ts.append(&predicate_operand(expr, cx)?);
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space()
                    .push(Token::Like)
                    .space()
                    .append(&predicate_operand(pattern, cx)?)
                    .space()
                    .push(Token::Escape)
                    .space()
                    .push(Token::LitString(escape_char.to_string()));
            }

            Expr::Star { table } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Star);
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens(cx)?);
                ts.rparen();
            }

            Expr::Native(sql) => {
                ts.raw(sql.clone());
            }
        }

        Ok(ts)
    }

    /// Binding strength of the outermost operator; `None` for atoms, which
    /// never need parentheses.
    fn precedence(&self) -> Option<u8> {
        match self {
            Expr::Binary { op, .. } => Some(op.precedence()),
            Expr::Unary {
                op: UnaryOperator::Not,
                ..
            }
            | Expr::Exists { negated: true, .. } => Some(NOT),
            Expr::Unary { .. } => Some(SIGN),
            Expr::Between { .. }
            | Expr::InList { .. }
            | Expr::InSubquery { .. }
            | Expr::IsNull { .. }
            | Expr::LikeEscape { .. }
            | Expr::Quantified { .. }
            | Expr::Match { .. } => Some(PREDICATE),
            Expr::Literal(lit) if lit.is_negative() => Some(SIGN),
            _ => None,
        }
    }

    /// Whether this expression must be parenthesized as the left or right
    /// operand of `parent`.
    fn needs_parens_under(&self, parent: BinaryOperator, right: bool) -> bool {
        let Some(prec) = self.precedence() else {
            return false;
        };
        let outer = parent.precedence();
        match self {
            Expr::Binary { op, .. } => {
                if *op != parent && (prec == BITWISE || outer == BITWISE) {
                    true
                } else if prec == outer {
                    right || !op.is_left_associative()
                } else {
                    prec < outer
                }
            }
            _ => prec <= outer,
        }
    }

    /// Render to SQL text with default mapping options.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        Ok(self.to_tokens(&RenderContext::new(dialect))?.serialize(dialect))
    }

    /// Direct child expressions. Subquery bodies are not included; see
    /// [`Expr::subquery`].
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_)
            | Expr::Column { .. }
            | Expr::Parameter(_)
            | Expr::Star { .. }
            | Expr::Native(_)
            | Expr::Subquery(_)
            | Expr::Unique(_) => vec![],
            Expr::Exists { .. } => vec![],
            Expr::Unary { expr, .. }
            | Expr::Extract { expr, .. }
            | Expr::Cast { expr, .. }
            | Expr::IsNull { expr, .. }
            | Expr::Paren(expr)
            | Expr::InSubquery { expr, .. }
            | Expr::Match { expr, .. } => vec![expr],
            Expr::Quantified { left, .. } => vec![left],
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Function { args, .. } | Expr::Row(args) => args.iter().collect(),
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                let mut out: Vec<&Expr> = operand.iter().map(|b| b.as_ref()).collect();
                for (w, t) in when_clauses {
                    out.push(w);
                    out.push(t);
                }
                out.extend(else_clause.iter().map(|b| b.as_ref()));
                out
            }
            Expr::InList { expr, list, .. } => {
                let mut out = vec![expr.as_ref()];
                out.extend(list.iter());
                out
            }
            Expr::Between {
                expr, low, high, ..
            } => vec![expr, low, high],
            Expr::LikeEscape { expr, pattern, .. } => vec![expr, pattern],
        }
    }

    /// The subquery this node holds directly, if any.
    pub fn subquery(&self) -> Option<&QueryExpr> {
        match self {
            Expr::Subquery(q)
            | Expr::Unique(q)
            | Expr::Exists { subquery: q, .. }
            | Expr::InSubquery { subquery: q, .. }
            | Expr::Match { subquery: q, .. }
            | Expr::Quantified { subquery: q, .. } => Some(q),
            _ => None,
        }
    }

    /// Visit this node and every descendant, pre-order, without entering
    /// subqueries.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expr)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Column references outside of subqueries, as `(qualifier, column)`.
    pub fn columns(&self) -> Vec<(Option<&str>, &str)> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Column { table, column } = e {
                out.push((table.as_deref(), column.as_str()));
            }
        });
        out
    }

    /// Parameters outside of subqueries, in tree order.
    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Parameter(p) = e {
                out.push(p);
            }
        });
        out
    }
}

impl Literal {
    /// Numeric literal that renders with a leading `-`.
    pub fn is_negative(&self) -> bool {
        match self {
            Literal::Int(n) => *n < 0,
            Literal::Float(f) => f.is_sign_negative(),
            Literal::Decimal(s) => s.trim_start().starts_with('-'),
            _ => false,
        }
    }

    /// Render through the dialect's literal formats.
    ///
    /// With infinity aliasing on, temporal host bounds become the dialect's
    /// infinity sentinel when it has one.
    pub fn to_tokens(&self, cx: &RenderContext) -> Result<TokenStream> {
        let dialect = cx.dialect;
        let token = match self {
            Literal::Null => Token::LitNull,
            Literal::Bool(b) => Token::LitBool(*b),
            Literal::Int(n) => Token::LitInt(*n),
            Literal::Float(f) => {
                if !f.is_finite() {
                    return Err(Error::InvalidStatement(format!(
                        "non-finite float literal {}",
                        f
                    )));
                }
                Token::LitFloat(*f)
            }
            Literal::String(s) => Token::LitString(s.clone()),
            Literal::Decimal(s) => {
                if crate::mapping::convert::parse_decimal(s).is_none() {
                    return Err(Error::InvalidStatement(format!(
                        "malformed decimal literal '{}'",
                        s
                    )));
                }
                Token::Raw(s.clone())
            }
            Literal::Date(d) => {
                match infinity_literal(cx, &ValueType::Date, &Value::Date(*d)) {
                    Some(text) => Token::Raw(text),
                    None => Token::Raw(dialect.format_date_literal(*d)),
                }
            }
            Literal::Time(t) => Token::Raw(dialect.format_time_literal(*t)),
            Literal::DateTime(dt) => {
                match infinity_literal(cx, &ValueType::DateTime, &Value::DateTime(*dt)) {
                    Some(text) => Token::Raw(text),
                    None => Token::Raw(dialect.format_datetime_literal(*dt)),
                }
            }
            Literal::DateTimeOffset(dto) => {
                match infinity_literal(cx, &ValueType::DateTimeOffset, &Value::DateTimeOffset(*dto))
                {
                    Some(text) => Token::Raw(text),
                    None => Token::Raw(dialect.format_datetimeoffset_literal(dto)),
                }
            }
            Literal::Interval(d) => {
                let native = NativeInterval::from_duration(*d)?;
                Token::Raw(dialect.format_interval_literal(&native)?)
            }
            Literal::Bytes(b) => Token::Raw(dialect.format_bytes_literal(b)),
            Literal::Guid(g) => Token::Raw(dialect.format_guid_literal(g)),
        };
        Ok(TokenStream::from(token))
    }
}

fn infinity_literal(cx: &RenderContext, ty: &ValueType, value: &Value) -> Option<String> {
    if !cx.options.infinity_aliasing || !cx.dialect.supports(Feature::InfinityLiterals) {
        return None;
    }
    let sign = infinity_sign(value)?;
    cx.dialect
        .format_infinity_literal(ty, sign == Sign::Positive)
}

/// Binding strength of `NOT`.
const NOT: u8 = 3;
/// Binding strength of unary minus and bitwise NOT.
const SIGN: u8 = 8;

fn operand(expr: &Expr, wrap: bool, cx: &RenderContext) -> Result<TokenStream> {
    let inner = expr.to_tokens(cx)?;
    if !wrap {
        return Ok(inner);
    }
    let mut ts = TokenStream::new();
    ts.lparen().append(&inner).rparen();
    Ok(ts)
}

/// Operand of `BETWEEN`, `IN`, `IS NULL`, `LIKE ... ESCAPE` and quantified
/// comparisons.
fn predicate_operand(expr: &Expr, cx: &RenderContext) -> Result<TokenStream> {
    let wrap = matches!(expr.precedence(), Some(p) if p <= PREDICATE);
    operand(expr, wrap, cx)
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
        BinaryOperator::Mod => Token::Mod,
        BinaryOperator::BitAnd => Token::BitAnd,
        BinaryOperator::BitOr => Token::BitOr,
        BinaryOperator::BitXor => Token::BitXor,
        BinaryOperator::Concat => Token::Concat,
        BinaryOperator::Like => Token::Like,
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a float literal.
pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a boolean literal.
pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

/// Create a NULL literal.
pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

pub fn lit_decimal(text: &str) -> Expr {
    Expr::Literal(Literal::Decimal(text.into()))
}

pub fn lit_date(d: NaiveDate) -> Expr {
    Expr::Literal(Literal::Date(d))
}

pub fn lit_time(t: NaiveTime) -> Expr {
    Expr::Literal(Literal::Time(t))
}

pub fn lit_datetime(dt: NaiveDateTime) -> Expr {
    Expr::Literal(Literal::DateTime(dt))
}

pub fn lit_datetimeoffset(dt: DateTime<FixedOffset>) -> Expr {
    Expr::Literal(Literal::DateTimeOffset(dt))
}

pub fn lit_interval(d: TimeDelta) -> Expr {
    Expr::Literal(Literal::Interval(d))
}

pub fn lit_bytes(b: &[u8]) -> Expr {
    Expr::Literal(Literal::Bytes(b.to_vec()))
}

pub fn lit_guid(g: Uuid) -> Expr {
    Expr::Literal(Literal::Guid(g))
}

/// Create a parameter with no value yet.
pub fn param(name: &str, value_type: ValueType) -> Expr {
    Expr::Parameter(Parameter::new(name, value_type))
}

/// Create a parameter carrying its value.
pub fn param_value(name: &str, value_type: ValueType, value: impl Into<Value>) -> Expr {
    Expr::Parameter(Parameter::new(name, value_type).with_value(value))
}

/// Create a star (*) expression.
pub fn star() -> Expr {
    Expr::Star { table: None }
}

/// Create a qualified star (table.*) expression.
pub fn table_star(table: &str) -> Expr {
    Expr::Star {
        table: Some(table.into()),
    }
}

/// Generic native function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: FunctionName::Native(name.into()),
        args,
        distinct: false,
    }
}

/// Portable function call, translated by each dialect.
pub fn portable(function: PortableFunction, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: FunctionName::Portable(function),
        args,
        distinct: false,
    }
}

/// COUNT(*)
pub fn count_star() -> Expr {
    func("COUNT", vec![star()])
}

/// COUNT(DISTINCT expr)
pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Function {
        name: FunctionName::Native("COUNT".into()),
        args: vec![expr],
        distinct: true,
    }
}

/// SUM(expr)
pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr])
}

/// MAX(expr)
pub fn max(expr: Expr) -> Expr {
    func("MAX", vec![expr])
}

/// MIN(expr)
pub fn min(expr: Expr) -> Expr {
    func("MIN", vec![expr])
}

pub fn extract(part: DatePart, expr: Expr) -> Expr {
    Expr::Extract {
        part,
        expr: Box::new(expr),
    }
}

pub fn cast(expr: Expr, to: ValueType) -> Expr {
    Expr::Cast {
        expr: Box::new(expr),
        to,
    }
}

pub fn row(items: Vec<Expr>) -> Expr {
    Expr::Row(items)
}

pub fn exists(query: impl Into<QueryExpr>) -> Expr {
    Expr::Exists {
        subquery: Box::new(query.into()),
        negated: false,
    }
}

pub fn not_exists(query: impl Into<QueryExpr>) -> Expr {
    Expr::Exists {
        subquery: Box::new(query.into()),
        negated: true,
    }
}

pub fn unique(query: impl Into<QueryExpr>) -> Expr {
    Expr::Unique(Box::new(query.into()))
}

/// Searched CASE: `CASE WHEN c1 THEN r1 ... ELSE e END`.
pub fn case_when(clauses: Vec<(Expr, Expr)>, otherwise: Option<Expr>) -> Expr {
    Expr::Case {
        operand: None,
        when_clauses: clauses,
        else_clause: otherwise.map(Box::new),
    }
}

/// Simple CASE: `CASE operand WHEN v1 THEN r1 ... ELSE e END`.
pub fn case_of(operand: Expr, clauses: Vec<(Expr, Expr)>, otherwise: Option<Expr>) -> Expr {
    Expr::Case {
        operand: Some(Box::new(operand)),
        when_clauses: clauses,
        else_clause: otherwise.map(Box::new),
    }
}

/// Provider SQL kept verbatim.
pub fn native(sql: &str) -> Expr {
    Expr::Native(sql.into())
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn quantified(left: Expr, op: BinaryOperator, quantifier: Quantifier, q: QueryExpr) -> Expr {
    Expr::Quantified {
        left: Box::new(left),
        op,
        quantifier,
        subquery: Box::new(q),
    }
}

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    // Comparison operators
    fn eq(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Eq, other.into())
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Ne, other.into())
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Gt, other.into())
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Gte, other.into())
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lt, other.into())
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lte, other.into())
    }

    // Logical operators
    fn and(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::And, other.into())
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Or, other.into())
    }

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOperator::Not,
            expr: Box::new(self.into_expr()),
        }
    }

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOperator::Minus,
            expr: Box::new(self.into_expr()),
        }
    }

    // Arithmetic operators
    fn add(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Plus, other.into())
    }

    fn sub(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Minus, other.into())
    }

    fn mul(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Mul, other.into())
    }

    fn div(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Div, other.into())
    }

    fn modulo(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Mod, other.into())
    }

    // Bitwise operators
    fn bit_and(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::BitAnd, other.into())
    }

    fn bit_or(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::BitOr, other.into())
    }

    fn bit_xor(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::BitXor, other.into())
    }

    fn bit_not(self) -> Expr {
        Expr::Unary {
            op: UnaryOperator::BitNot,
            expr: Box::new(self.into_expr()),
        }
    }

    // String operators
    fn like(self, pattern: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Like, pattern.into())
    }

    /// LIKE with ESCAPE clause for matching literal `%` and `_` characters.
    fn like_escape(self, pattern: impl Into<Expr>, escape_char: char) -> Expr {
        Expr::LikeEscape {
            expr: Box::new(self.into_expr()),
            pattern: Box::new(pattern.into()),
            escape_char,
            negated: false,
        }
    }

    /// NOT LIKE with ESCAPE clause.
    fn not_like_escape(self, pattern: impl Into<Expr>, escape_char: char) -> Expr {
        Expr::LikeEscape {
            expr: Box::new(self.into_expr()),
            pattern: Box::new(pattern.into()),
            escape_char,
            negated: true,
        }
    }

    fn concat(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Concat, other.into())
    }

    // NULL checks
    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    // IN operator
    fn in_list(self, values: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            list: values,
            negated: false,
        }
    }

    fn not_in_list(self, values: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            list: values,
            negated: true,
        }
    }

    fn in_subquery(self, query: impl Into<QueryExpr>) -> Expr {
        Expr::InSubquery {
            expr: Box::new(self.into_expr()),
            subquery: Box::new(query.into()),
            negated: false,
        }
    }

    fn not_in_subquery(self, query: impl Into<QueryExpr>) -> Expr {
        Expr::InSubquery {
            expr: Box::new(self.into_expr()),
            subquery: Box::new(query.into()),
            negated: true,
        }
    }

    // Quantified comparisons
    fn all(self, op: BinaryOperator, query: impl Into<QueryExpr>) -> Expr {
        quantified(self.into_expr(), op, Quantifier::All, query.into())
    }

    fn any(self, op: BinaryOperator, query: impl Into<QueryExpr>) -> Expr {
        quantified(self.into_expr(), op, Quantifier::Any, query.into())
    }

    fn some(self, op: BinaryOperator, query: impl Into<QueryExpr>) -> Expr {
        quantified(self.into_expr(), op, Quantifier::Some, query.into())
    }

    /// MATCH predicate against a subquery.
    fn matches(self, query: impl Into<QueryExpr>, unique: bool, kind: MatchKind) -> Expr {
        Expr::Match {
            expr: Box::new(self.into_expr()),
            subquery: Box::new(query.into()),
            unique,
            kind,
        }
    }

    // BETWEEN operator
    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    fn not_between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: true,
        }
    }

    fn cast_to(self, to: ValueType) -> Expr {
        cast(self.into_expr(), to)
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_expr()))
    }

    /// Alias this expression (for SELECT list).
    fn alias(self, name: &str) -> super::query::SelectExpr {
        super::query::SelectExpr {
            expr: self.into_expr(),
            alias: Some(name.into()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit_int(n as i64)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        lit_float(f)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Literal::String(s))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        lit_bool(b)
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<Select> for Expr {
    /// Convert a Select into a Subquery expression.
    fn from(query: Select) -> Self {
        Expr::Subquery(Box::new(QueryExpr::from(query)))
    }
}

impl From<QueryExpr> for Expr {
    fn from(query: QueryExpr) -> Self {
        Expr::Subquery(Box::new(query))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::temporal::{datetime_max, datetime_min};
    use crate::sql::query::TableSource;

    fn pg(expr: &Expr) -> String {
        expr.to_sql(Dialect::Postgres).unwrap()
    }

    #[test]
    fn test_column() {
        assert_eq!(pg(&col("name")), "\"name\"");
        assert_eq!(pg(&table_col("u", "name")), "\"u\".\"name\"");
    }

    #[test]
    fn test_binary_op() {
        assert_eq!(pg(&col("age").gte(lit_int(18))), "\"age\" >= 18");
    }

    #[test]
    fn test_bitwise_and_operator() {
        let expr = col("flags").bit_and(4).eq(4);
        assert_eq!(pg(&expr), "(\"flags\" & 4) = 4");
    }

    #[test]
    fn test_or_under_and_is_parenthesized() {
        let expr = col("a").eq(1).or(col("a").eq(2)).and(col("b").eq(9));
        assert_eq!(pg(&expr), "(\"a\" = 1 OR \"a\" = 2) AND \"b\" = 9");
        // AND already binds tighter than OR
        let expr = col("a").eq(1).or(col("a").eq(2).and(col("b").eq(9)));
        assert_eq!(pg(&expr), "\"a\" = 1 OR \"a\" = 2 AND \"b\" = 9");
    }

    #[test]
    fn test_right_nested_subtraction() {
        let expr = lit_int(10).sub(lit_int(4).sub(lit_int(1)));
        assert_eq!(pg(&expr), "10 - (4 - 1)");
        let expr = lit_int(10).sub(lit_int(4)).sub(lit_int(1));
        assert_eq!(pg(&expr), "10 - 4 - 1");
        let expr = col("a").add(col("b")).mul(col("c"));
        assert_eq!(pg(&expr), "(\"a\" + \"b\") * \"c\"");
        let expr = col("a").add(col("b").mul(col("c")));
        assert_eq!(pg(&expr), "\"a\" + \"b\" * \"c\"");
    }

    #[test]
    fn test_unary_over_binary() {
        assert_eq!(pg(&col("a").sub(col("b")).neg()), "-(\"a\" - \"b\")");
        assert_eq!(pg(&lit_int(-5).neg()), "-(-5)");
        assert_eq!(pg(&col("a").neg().neg()), "-(-\"a\")");
        assert_eq!(
            pg(&col("a").eq(1).or(col("b").eq(2)).not()),
            "NOT (\"a\" = 1 OR \"b\" = 2)"
        );
        assert_eq!(pg(&col("a").eq(1).not()), "NOT \"a\" = 1");
    }

    #[test]
    fn test_predicate_operands() {
        let expr = col("a").eq(1).or(col("b").eq(2)).is_null();
        assert_eq!(pg(&expr), "(\"a\" = 1 OR \"b\" = 2) IS NULL");
        let expr = col("a").add(1).between(col("lo"), col("hi").sub(1));
        assert_eq!(pg(&expr), "\"a\" + 1 BETWEEN \"lo\" AND \"hi\" - 1");
        let expr = col("a").between(1, 5).eq(col("flag"));
        assert_eq!(pg(&expr), "(\"a\" BETWEEN 1 AND 5) = \"flag\"");
    }

    #[test]
    fn test_bit_xor_requires_feature() {
        let expr = col("a").bit_xor(col("b"));
        assert_eq!(pg(&expr), "\"a\" # \"b\"");
        let err = expr.to_sql(Dialect::Ansi).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_count_distinct() {
        assert_eq!(pg(&count_distinct(col("user_id"))), "COUNT(DISTINCT \"user_id\")");
    }

    #[test]
    fn test_between() {
        assert_eq!(pg(&col("age").between(18, 65)), "\"age\" BETWEEN 18 AND 65");
    }

    #[test]
    fn test_like_escape() {
        let sql = pg(&col("discount").like_escape(lit_str("100\\%"), '\\'));
        assert_eq!(sql, "\"discount\" LIKE '100\\%' ESCAPE '\\'");
        let sql = pg(&col("name").not_like_escape(lit_str("x"), '!'));
        assert!(sql.contains("NOT LIKE"), "SQL: {}", sql);
    }

    #[test]
    fn test_in_list_empty() {
        assert_eq!(pg(&col("status").in_list(vec![])), "1 = 0");
        assert_eq!(pg(&col("status").not_in_list(vec![])), "1 = 1");
    }

    #[test]
    fn test_case() {
        let expr = case_when(
            vec![
                (col("status").eq("A"), lit_str("Active")),
                (col("status").eq("I"), lit_str("Inactive")),
            ],
            Some(lit_str("Unknown")),
        );
        assert_eq!(
            pg(&expr),
            "CASE WHEN \"status\" = 'A' THEN 'Active' WHEN \"status\" = 'I' THEN 'Inactive' ELSE 'Unknown' END"
        );
    }

    #[test]
    fn test_concat_mysql_function() {
        let expr = col("first_name").concat(col("last_name"));
        assert_eq!(pg(&expr), "\"first_name\" || \"last_name\"");
        assert_eq!(
            expr.to_sql(Dialect::MySql).unwrap(),
            "CONCAT(`first_name`, `last_name`)"
        );
        assert_eq!(
            expr.to_sql(Dialect::SqlServer).unwrap(),
            "[first_name] + [last_name]"
        );
    }

    #[test]
    fn test_portable_function_arity() {
        let expr = portable(PortableFunction::DateTimeConstruct, vec![lit_int(2024)]);
        let err = expr.to_sql(Dialect::Postgres).unwrap_err();
        assert!(matches!(err, Error::InvalidStatement(_)));
    }

    #[test]
    fn test_portable_function_unsupported() {
        let expr = portable(
            PortableFunction::DateTimeAddMonths,
            vec![col("d"), lit_int(1)],
        );
        let err = expr.to_sql(Dialect::Ansi).unwrap_err();
        assert_eq!(
            err.to_string(),
            "function DateTimeAddMonths is not supported by the ansi dialect"
        );
    }

    #[test]
    fn test_extract_unsupported_part() {
        let err = extract(DatePart::Quarter, col("d"))
            .to_sql(Dialect::Sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_cast_uses_dialect_types() {
        let expr = col("n").cast_to(ValueType::Int64);
        assert_eq!(pg(&expr), "CAST(\"n\" AS BIGINT)");
    }

    #[test]
    fn test_parameter_placeholders() {
        let expr = col("a")
            .eq(param("x", ValueType::Int32))
            .and(col("b").eq(param("y", ValueType::Text)));
        assert_eq!(
            expr.to_sql(Dialect::SqlServer).unwrap(),
            "[a] = @p1 AND [b] = @p2"
        );
        let names: Vec<_> = expr.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_unique_and_match_only_ansi() {
        let q = Select::from_table(TableSource::table("main", "t")).column(col("a"));
        let u = unique(q.clone());
        assert!(u.to_sql(Dialect::Ansi).unwrap().starts_with("UNIQUE ("));
        assert!(matches!(
            u.to_sql(Dialect::Postgres),
            Err(Error::UnsupportedFeature { .. })
        ));

        let m = col("a").matches(q, true, MatchKind::Full);
        assert!(m
            .to_sql(Dialect::Ansi)
            .unwrap()
            .starts_with("\"a\" MATCH UNIQUE FULL ("));
    }

    #[test]
    fn test_quantified_comparison() {
        let q = Select::from_table(TableSource::table("main", "t")).column(col("a"));
        let expr = col("x").all(BinaryOperator::Gt, q.clone());
        assert!(pg(&expr).starts_with("\"x\" > ALL (SELECT"));
        assert!(matches!(
            expr.to_sql(Dialect::Sqlite),
            Err(Error::UnsupportedFeature { .. })
        ));
        let bad = col("x").some(BinaryOperator::Plus, q);
        assert!(matches!(
            bad.to_sql(Dialect::Postgres),
            Err(Error::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_row_constructor_feature() {
        let expr = row(vec![col("a"), col("b")]).eq(row(vec![lit_int(1), lit_int(2)]));
        assert_eq!(pg(&expr), "(\"a\", \"b\") = (1, 2)");
        assert!(matches!(
            expr.to_sql(Dialect::SqlServer),
            Err(Error::UnsupportedFeature { .. })
        ));
    }

    #[test]
    fn test_infinity_literal_aliasing() {
        let expr = lit_datetime(datetime_max());
        assert_eq!(pg(&expr), "TIMESTAMP 'infinity'");

        let cx = RenderContext::new(Dialect::Postgres)
            .with_options(MappingOptions::default().with_infinity_aliasing(false));
        let sql = expr.to_tokens(&cx).unwrap().serialize(Dialect::Postgres);
        assert_eq!(sql, "TIMESTAMP '9999-12-31 23:59:59.999999'");

        // no sentinel outside Postgres
        let sql = lit_datetime(datetime_min())
            .to_sql(Dialect::SqlServer)
            .unwrap();
        assert_eq!(sql, "CAST('0001-01-01 00:00:00.000000' AS DATETIME2)");
    }

    #[test]
    fn test_decimal_literal_validated() {
        assert_eq!(pg(&lit_decimal("-12.50")), "-12.50");
        assert!(lit_decimal("1e5").to_sql(Dialect::Postgres).is_err());
    }

    #[test]
    fn test_columns_skip_subqueries() {
        let q = Select::from_table(TableSource::table("main", "t")).column(col("inner_col"));
        let expr = col("a").eq(1).and(table_col("x", "b").in_subquery(q));
        let cols = expr.columns();
        assert_eq!(cols, vec![(None, "a"), (Some("x"), "b")]);
    }
}
