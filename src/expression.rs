// src/expression.rs
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::context::{Context, StringComparison};
use crate::errors::Result;
use crate::operator::{ComparativeOperation, LogicalOperator};
use crate::value::{Scalar, Value};

/// A parsed criteria expression. Trees are immutable; inversion and
/// expansion build new trees.
#[derive(Debug, Clone)]
pub enum Expression {
    Comparison(ComparisonExpression),
    Logic(LogicExpression),
}

impl Expression {
    /// Logical negation of the whole tree (De Morgan).
    pub fn invert(&self) -> Expression {
        match self {
            Expression::Comparison(c) => Expression::Comparison(c.invert()),
            Expression::Logic(l) => Expression::Logic(l.invert()),
        }
    }

    pub fn is_match<'a>(&'a self, ctx: &'a dyn Context) -> BoxFuture<'a, Result<bool>> {
        async move {
            match self {
                Expression::Comparison(c) => c.is_match(ctx).await,
                Expression::Logic(l) => l.is_match(ctx).await,
            }
        }
        .boxed()
    }

    /// Canonical text; logic nodes rebuild it from their children.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Number of comparison leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            Expression::Comparison(_) => 1,
            Expression::Logic(l) => l.left.leaf_count() + l.right.leaf_count(),
        }
    }

    pub fn as_comparison(&self) -> Option<&ComparisonExpression> {
        match self {
            Expression::Comparison(c) => Some(c),
            Expression::Logic(_) => None,
        }
    }

    pub fn as_logic(&self) -> Option<&LogicExpression> {
        match self {
            Expression::Logic(l) => Some(l),
            Expression::Comparison(_) => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Comparison(c) => c.fmt(f),
            Expression::Logic(l) => l.fmt(f),
        }
    }
}

/// `left OP right` leaf.
#[derive(Debug, Clone)]
pub struct ComparisonExpression {
    text: String,
    operator: ComparativeOperation,
    left: Arc<dyn Value>,
    right: Arc<dyn Value>,
}

impl ComparisonExpression {
    /// The caller has already checked `operator` against both operands.
    pub(crate) fn new(
        text: impl Into<String>,
        operator: ComparativeOperation,
        left: Arc<dyn Value>,
        right: Arc<dyn Value>,
    ) -> Self {
        Self {
            text: text.into(),
            operator,
            left,
            right,
        }
    }

    pub fn operator(&self) -> ComparativeOperation {
        self.operator
    }

    pub fn left(&self) -> &Arc<dyn Value> {
        &self.left
    }

    pub fn right(&self) -> &Arc<dyn Value> {
        &self.right
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn invert(&self) -> ComparisonExpression {
        let operator = self.operator.invert();
        ComparisonExpression {
            text: format!("{} {} {}", self.left.source(), operator.token(), self.right.source()),
            operator,
            left: Arc::clone(&self.left),
            right: Arc::clone(&self.right),
        }
    }

    pub async fn is_match(&self, ctx: &dyn Context) -> Result<bool> {
        let left = self.left.resolve(ctx).await?;
        let right = self.right.resolve(ctx).await?;
        let matched = compare(self.operator, &left, &right, ctx.string_comparison());
        tracing::trace!(expr = %self.text, %left, %right, matched, "comparison evaluated");
        Ok(matched)
    }
}

impl fmt::Display for ComparisonExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Applies `op` to two resolved operands. `<=` and `>=` are "not greater" and
/// "not less", so each ordering operation is the exact negation of its inverse
/// even for values that cannot be ordered.
pub fn compare(op: ComparativeOperation, left: &Scalar, right: &Scalar, cmp: StringComparison) -> bool {
    use ComparativeOperation as Op;
    match op {
        Op::None => false,
        Op::Equal => left.equals(right, cmp),
        Op::NotEqual => !left.equals(right, cmp),
        Op::LessThan => left.less_than(right, cmp),
        Op::LessThanOrEquals => !left.greater_than(right, cmp),
        Op::GreaterThan => left.greater_than(right, cmp),
        Op::GreaterThanOrEquals => !left.less_than(right, cmp),
        Op::Contains | Op::ContainsOrEqual => left.contains(right, cmp),
        Op::NotContains => !left.contains(right, cmp),
        Op::Contained | Op::ContainedOrEqual => right.contains(left, cmp),
        Op::NotContained => !right.contains(left, cmp),
    }
}

/// Binary `&&` / `||` node.
#[derive(Debug, Clone)]
pub struct LogicExpression {
    operator: LogicalOperator,
    left: Box<Expression>,
    right: Box<Expression>,
}

impl LogicExpression {
    pub fn new(left: Expression, operator: LogicalOperator, right: Expression) -> Self {
        Self {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Left fold step: the tree so far becomes the left child.
    pub fn expand(self, operator: LogicalOperator, right: Expression) -> Self {
        Self::new(Expression::Logic(self), operator, right)
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }

    pub fn invert(&self) -> LogicExpression {
        LogicExpression {
            operator: self.operator.invert(),
            left: Box::new(self.left.invert()),
            right: Box::new(self.right.invert()),
        }
    }

    /// Short-circuits: `||` stops at a true left side, `&&` at a false one.
    pub async fn is_match(&self, ctx: &dyn Context) -> Result<bool> {
        let left = self.left.is_match(ctx).await?;
        match (self.operator, left) {
            (LogicalOperator::Or, true) => Ok(true),
            (LogicalOperator::And, false) => Ok(false),
            _ => self.right.is_match(ctx).await,
        }
    }
}

// Right-hand logic children are parenthesised so the text folds back into
// the same tree.
impl fmt::Display for LogicExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.left, self.operator.token())?;
        match self.right.as_ref() {
            Expression::Logic(right) => write!(f, "({right})"),
            Expression::Comparison(right) => write!(f, "{right}"),
        }
    }
}
