//! Boolean criteria scripts such as
//! `status == "active" && (region < "eu" || !(tier >= "gold"))`.
//!
//! Scripts are parsed into an immutable [`Expression`] tree whose operands
//! are recognised by an ordered [`Registry`] of [`OperandParser`]s, then
//! evaluated against a [`Context`] that resolves symbols. `&&` and `||` have
//! no relative precedence: they fold left to right, and parentheses group.

pub mod errors;
pub mod context;
pub mod engine;
pub mod operands; // plugin model
pub mod operator;
pub mod value;
mod comparison;
mod expression;
mod scanner;
mod syntax;

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;

pub use context::{default_context, Context, ScriptValueProvider, StringComparison};
pub use engine::{Engine, Script};
pub use errors::{ErrorCode, EvalError, Result, ScriptError};
pub use expression::{compare, ComparisonExpression, Expression, LogicExpression};
pub use operands::{Operand, OperandParser, Registry};
pub use operator::{ComparativeOperation, LogicalOperator};
pub use value::{Scalar, Value};

static ENGINE: Lazy<Engine> = Lazy::new(Engine::default);

/// Convenience: parse with the built-in registry.
pub async fn parse(text: &str, ctx: Option<Arc<dyn Context>>) -> Result<Script> {
    ENGINE.parse(text, ctx).await
}

/// Convenience: parse and evaluate with the built-in registry.
pub async fn run(text: &str, ctx: Option<Arc<dyn Context>>) -> Result<bool> {
    ENGINE.run(text, ctx).await
}

/// Convenience: parse, evaluate and convert the outcome to `T`.
pub async fn run_as<T>(text: &str, ctx: Option<Arc<dyn Context>>) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    ENGINE.run_as(text, ctx).await
}
