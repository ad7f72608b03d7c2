//! Statements and expressions of the scheduled program body.

use alloy_primitives::U256;

/// A call to a declared external operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    /// Name of the operation being called.
    pub name: String,
    /// Argument expressions, in declared input order.
    pub args: Vec<Expr>,
}

impl Call {
    /// Creates a call expression.
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Self { name: name.into(), args: args.into_iter().collect() }
    }
}

/// An expression yielding value instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// A materialized integer literal.
    Lit(U256),
    /// A reference to a previously bound name.
    Var(String),
    /// A nested call; usable as an argument only when it yields exactly
    /// one value.
    Call(Call),
}

impl Expr {
    /// Creates a literal expression from a machine word.
    #[must_use]
    pub fn lit(value: u64) -> Self {
        Self::Lit(U256::from(value))
    }

    /// Creates a variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Creates a call expression.
    pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::Call(Call::new(name, args))
    }
}

impl From<Call> for Expr {
    fn from(call: Call) -> Self {
        Self::Call(call)
    }
}

/// A statement of the program body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// A bare call evaluated for its effects; must yield zero values.
    Expr(Call),
    /// `name = expr`; the expression must yield exactly one value.
    Assign {
        /// The name being bound.
        name: String,
        /// The bound expression.
        expr: Expr,
    },
    /// `a, b, ... = call`; the call must yield one value per target.
    MultiAssign {
        /// The names being bound, in output order.
        names: Vec<String>,
        /// The producing call.
        call: Call,
    },
}

impl Stmt {
    /// Creates a single-assignment statement.
    pub fn assign(name: impl Into<String>, expr: impl Into<Expr>) -> Self {
        Self::Assign { name: name.into(), expr: expr.into() }
    }

    /// Creates a multi-assignment statement.
    pub fn multi_assign(
        names: impl IntoIterator<Item = impl Into<String>>,
        call: Call,
    ) -> Self {
        Self::MultiAssign { names: names.into_iter().map(Into::into).collect(), call }
    }
}
