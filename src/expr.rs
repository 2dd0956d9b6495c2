//! Typed expressions and aggregate call descriptions.
//!
//! Expressions are a closed tagged union rather than an open node hierarchy,
//! so questions like "is this argument a plain column reference?" are answered
//! by [`Expr::as_column`] instead of a fallible downcast.

use crate::error::VerifierError;
use crate::types::Value;
use std::fmt;

/// A scalar expression over the columns of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a column by name.
    Column(String),
    /// Literal value.
    Literal(Value),
    /// Function call.
    Call { function: String, args: Vec<Expr> },
    /// `base[key]` element or map lookup.
    Subscript { base: Box<Expr>, key: Box<Expr> },
    /// `(params) -> body`, only meaningful as a function argument.
    Lambda { params: Vec<String>, body: Box<Expr> },
    /// Hole in an [`ExprTemplate`], filled with the aggregate output column.
    Placeholder,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: function.into(),
            args,
        }
    }

    pub fn subscript(base: Expr, key: Expr) -> Self {
        Expr::Subscript {
            base: Box::new(base),
            key: Box::new(key),
        }
    }

    pub fn lambda(params: &[&str], body: Expr) -> Self {
        Expr::Lambda {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }

    /// Column name if this expression is a simple column reference.
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Expr::Column(name) => Some(name),
            _ => None,
        }
    }

    fn placeholder_count(&self) -> usize {
        match self {
            Expr::Placeholder => 1,
            Expr::Column(_) | Expr::Literal(_) => 0,
            Expr::Call { args, .. } => args.iter().map(Expr::placeholder_count).sum(),
            Expr::Subscript { base, key } => base.placeholder_count() + key.placeholder_count(),
            Expr::Lambda { body, .. } => body.placeholder_count(),
        }
    }

    fn substitute(&self, column: &str) -> Expr {
        match self {
            Expr::Placeholder => Expr::Column(column.to_string()),
            Expr::Column(_) | Expr::Literal(_) => self.clone(),
            Expr::Call { function, args } => Expr::Call {
                function: function.clone(),
                args: args.iter().map(|a| a.substitute(column)).collect(),
            },
            Expr::Subscript { base, key } => Expr::Subscript {
                base: Box::new(base.substitute(column)),
                key: Box::new(key.substitute(column)),
            },
            Expr::Lambda { params, body } => Expr::Lambda {
                params: params.clone(),
                body: Box::new(body.substitute(column)),
            },
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_identifier(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_identifier(name) {
        write!(f, "{}", name)
    } else {
        write!(f, "\"{}\"", name.replace('"', "\"\""))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write_identifier(f, name),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Call { function, args } => {
                write_identifier(f, function)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Subscript { base, key } => write!(f, "{}[{}]", base, key),
            Expr::Lambda { params, body } => write!(f, "({}) -> {}", params.join(", "), body),
            Expr::Placeholder => write!(f, "{{}}"),
        }
    }
}

/// An expression with exactly one [`Expr::Placeholder`].
///
/// Used to describe how an aggregate's output column is transformed before
/// results are compared, e.g. `"$internal$canonicalize"({})`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprTemplate {
    expr: Expr,
}

impl ExprTemplate {
    pub fn new(expr: Expr) -> Result<Self, VerifierError> {
        let placeholders = expr.placeholder_count();
        if placeholders != 1 {
            return Err(VerifierError::InvalidTemplate {
                template: expr.to_string(),
                placeholders,
            });
        }
        Ok(Self { expr })
    }

    /// Replace the placeholder with a reference to `column`.
    pub fn instantiate(&self, column: &str) -> Expr {
        self.expr.substitute(column)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Display for ExprTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// One aggregate invocation: function name, arguments, and optional filter.
///
/// Built by the planner; read-only to generators and verifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub function: String,
    pub args: Vec<Expr>,
    /// Aggregate over distinct argument values only.
    pub distinct: bool,
    /// Name of a boolean column; rows where it is not true are ignored.
    pub mask: Option<String>,
}

impl AggregateCall {
    pub fn new(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            function: function.into(),
            args,
            distinct: false,
            mask: None,
        }
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = Some(mask.into());
        self
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_identifier(f, &self.function)?;
        write!(f, "(")?;
        if self.distinct {
            write!(f, "distinct ")?;
        }
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")?;
        if let Some(mask) = &self.mask {
            write!(f, " filter (where ")?;
            write_identifier(f, mask)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}
