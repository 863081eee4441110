//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings. Parameter placeholders are numbered while a
//! whole stream is serialized, so ordinals always follow textual order.

use super::dialect::{Dialect, SqlDialect};
use super::expr::Parameter;

/// SQL Token - every possible element in a SQL statement.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Query Keywords ===
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    Fetch,
    Next,
    Prior,
    First,
    Last,
    Absolute,
    Relative,
    Rows,
    Only,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Between,
    Like,
    Escape,
    IsNull,
    IsNotNull,
    Distinct,
    All,
    Any,
    Some,
    Union,
    Intersect,
    Except,
    Null,
    True,
    False,
    Exists,
    Match,
    Partial,
    Cast,
    Extract,
    Interval,

    // === DDL Keywords ===
    Create,
    Alter,
    Drop,
    Table,
    Column,
    Index,
    View,
    Schema,
    Sequence,
    Constraint,
    Primary,
    Key,
    Foreign,
    References,
    Unique,
    Check,
    Default,
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
    Add,
    Rename,
    To,
    Truncate,
    Deferrable,
    InitiallyImmediate,
    InitiallyDeferred,
    StartWith,
    IncrementBy,
    MinValue,
    MaxValue,
    Cycle,
    NoCycle,
    Restart,

    // === DML Keywords ===
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Using,

    // === Cursor Keywords ===
    Declare,
    Cursor,
    Scroll,
    For,
    Open,
    Close,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    Semicolon,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Simple identifier (table, column, alias)
    Ident(String),
    /// Qualified identifier: schema.table or just table
    QualifiedIdent {
        schema: Option<String>,
        name: String,
    },
    /// Integer literal
    LitInt(i64),
    /// Float literal
    LitFloat(f64),
    /// String literal
    LitString(String),
    /// Boolean literal
    LitBool(bool),
    /// NULL literal
    LitNull,

    /// Native function name, remapped per dialect.
    FunctionName(String),

    /// Bound parameter. Rendered as the dialect's placeholder at its
    /// position in the serialized stream.
    Param(Box<Parameter>),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass user input to this variant.** Raw SQL is not sanitized
    /// and can lead to SQL injection vulnerabilities. Only use with:
    /// - Trusted, static SQL fragments
    /// - Dialect-specific syntax not covered by other tokens
    ///
    /// For user-provided values, use `Token::LitString`, `Token::LitInt`, etc.
    /// which properly escape content for the target dialect.
    Raw(String),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    ///
    /// A lone `Param` renders as the first placeholder; use
    /// [`TokenStream::serialize`] to number parameters across a statement.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.serialize_at(dialect, 1)
    }

    fn serialize_at(&self, dialect: Dialect, ordinal: usize) -> String {
        match self {
            // Query keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::Not => "NOT".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::Right => "RIGHT".into(),
            Token::Full => "FULL".into(),
            Token::Outer => "OUTER".into(),
            Token::Cross => "CROSS".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Having => "HAVING".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::Fetch => "FETCH".into(),
            Token::Next => "NEXT".into(),
            Token::Prior => "PRIOR".into(),
            Token::First => "FIRST".into(),
            Token::Last => "LAST".into(),
            Token::Absolute => "ABSOLUTE".into(),
            Token::Relative => "RELATIVE".into(),
            Token::Rows => "ROWS".into(),
            Token::Only => "ONLY".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::In => "IN".into(),
            Token::Between => "BETWEEN".into(),
            Token::Like => "LIKE".into(),
            Token::Escape => "ESCAPE".into(),
            Token::IsNull => "IS NULL".into(),
            Token::IsNotNull => "IS NOT NULL".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::All => "ALL".into(),
            Token::Any => "ANY".into(),
            Token::Some => "SOME".into(),
            Token::Union => "UNION".into(),
            Token::Intersect => "INTERSECT".into(),
            Token::Except => "EXCEPT".into(),
            Token::Null => "NULL".into(),
            Token::True => "TRUE".into(),
            Token::False => "FALSE".into(),
            Token::Exists => "EXISTS".into(),
            Token::Match => "MATCH".into(),
            Token::Partial => "PARTIAL".into(),
            Token::Cast => "CAST".into(),
            Token::Extract => "EXTRACT".into(),
            Token::Interval => "INTERVAL".into(),

            // DDL keywords
            Token::Create => "CREATE".into(),
            Token::Alter => "ALTER".into(),
            Token::Drop => "DROP".into(),
            Token::Table => "TABLE".into(),
            Token::Column => "COLUMN".into(),
            Token::Index => "INDEX".into(),
            Token::View => "VIEW".into(),
            Token::Schema => "SCHEMA".into(),
            Token::Sequence => "SEQUENCE".into(),
            Token::Constraint => "CONSTRAINT".into(),
            Token::Primary => "PRIMARY".into(),
            Token::Key => "KEY".into(),
            Token::Foreign => "FOREIGN".into(),
            Token::References => "REFERENCES".into(),
            Token::Unique => "UNIQUE".into(),
            Token::Check => "CHECK".into(),
            Token::Default => "DEFAULT".into(),
            Token::Cascade => "CASCADE".into(),
            Token::Restrict => "RESTRICT".into(),
            Token::NoAction => "NO ACTION".into(),
            Token::SetNull => "SET NULL".into(),
            Token::SetDefault => "SET DEFAULT".into(),
            Token::Add => "ADD".into(),
            Token::Rename => "RENAME".into(),
            Token::To => "TO".into(),
            Token::Truncate => "TRUNCATE".into(),
            Token::Deferrable => "DEFERRABLE".into(),
            Token::InitiallyImmediate => "INITIALLY IMMEDIATE".into(),
            Token::InitiallyDeferred => "INITIALLY DEFERRED".into(),
            Token::StartWith => "START WITH".into(),
            Token::IncrementBy => "INCREMENT BY".into(),
            Token::MinValue => "MINVALUE".into(),
            Token::MaxValue => "MAXVALUE".into(),
            Token::Cycle => "CYCLE".into(),
            Token::NoCycle => "NO CYCLE".into(),
            Token::Restart => "RESTART".into(),

            // DML keywords
            Token::Insert => "INSERT".into(),
            Token::Into => "INTO".into(),
            Token::Values => "VALUES".into(),
            Token::Update => "UPDATE".into(),
            Token::Set => "SET".into(),
            Token::Delete => "DELETE".into(),
            Token::Using => "USING".into(),

            // Cursor keywords
            Token::Declare => "DECLARE".into(),
            Token::Cursor => "CURSOR".into(),
            Token::Scroll => "SCROLL".into(),
            Token::For => "FOR".into(),
            Token::Open => "OPEN".into(),
            Token::Close => "CLOSE".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Semicolon => ";".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Mul => "*".into(),
            Token::Div => "/".into(),
            Token::Mod => "%".into(),
            Token::Concat => dialect.concat_operator().into(),
            Token::BitAnd => "&".into(),
            Token::BitOr => "|".into(),
            Token::BitXor => dialect.bitwise_xor_operator().into(),
            Token::BitNot => "~".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::QualifiedIdent { schema, name } => match schema {
                Some(s) => format!(
                    "{}.{}",
                    dialect.quote_identifier(s),
                    dialect.quote_identifier(name)
                ),
                None => dialect.quote_identifier(name),
            },
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => {
                // Non-finite floats are rejected before tokens are built.
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).into(),
            Token::LitNull => "NULL".into(),

            Token::FunctionName(name) => match dialect.remap_function(name) {
                Some(remapped) => remapped.to_uppercase(),
                None => name.to_uppercase(),
            },

            Token::Param(_) => dialect.placeholder(ordinal),

            // Escape hatch
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// True when no tokens have been pushed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in emission order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parameters in placeholder order.
    pub fn parameters(&self) -> Vec<&Parameter> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Param(p) => Some(p.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// Serialize all tokens to a SQL string, numbering placeholders from 1.
    pub fn serialize(&self, dialect: Dialect) -> String {
        let mut ordinal = 0;
        let mut out = String::new();
        for token in &self.tokens {
            if matches!(token, Token::Param(_)) {
                ordinal += 1;
            }
            out.push_str(&token.serialize_at(dialect, ordinal.max(1)));
        }
        out
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push(Token::Raw(sql.into()))
    }
    pub fn ident(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Token::Ident(name.into()))
    }

    /// Append items separated by `, `.
    pub fn comma_separated<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a TokenStream>,
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(item);
        }
        self
    }

    /// Append `( items )` separated by `, `.
    pub fn parenthesized<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a TokenStream>,
    ) -> &mut Self {
        self.lparen().comma_separated(items).rparen()
    }

    /// Append a parenthesized, comma separated identifier list.
    pub fn ident_list<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) -> &mut Self {
        self.lparen();
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.ident(name.clone());
        }
        self.rparen()
    }
}

impl From<Token> for TokenStream {
    fn from(token: Token) -> Self {
        Self {
            tokens: vec![token],
        }
    }
}
