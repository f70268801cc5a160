use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use tracing::debug;

use crate::comparison::parse_comparison;
use crate::context::{default_context, Context};
use crate::errors::{ErrorCode, EvalError, Result};
use crate::expression::{Expression, LogicExpression};
use crate::operands::Registry;
use crate::syntax::{parse_clauses, Clause};

/// =========================
/// Engine
/// =========================

/// Parses and runs scripts with a fixed operand parser registry.
#[derive(Clone)]
pub struct Engine {
    registry: Registry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Registry::with_builtins())
    }
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses `text` into a tree. Symbols are checked against `ctx`, or the
    /// default context when none is given; the given context stays bound to
    /// the returned script.
    pub async fn parse(&self, text: &str, ctx: Option<Arc<dyn Context>>) -> Result<Script> {
        if text.trim().is_empty() {
            return Err(EvalError::script(ErrorCode::Unassigned, "script is empty"));
        }
        let clauses = parse_clauses(text)?;
        let parse_ctx = ctx.clone().unwrap_or_else(default_context);
        let expression = self.build(&clauses, parse_ctx.as_ref()).await?;
        debug!(script = text, leaves = expression.leaf_count(), "script parsed");
        Ok(Script {
            text: text.to_string(),
            expression,
            context: ctx,
        })
    }

    /// Parses and evaluates on a spawned task.
    pub async fn run(&self, text: &str, ctx: Option<Arc<dyn Context>>) -> Result<bool> {
        let engine = self.clone();
        let text = text.to_string();
        tokio::spawn(async move { engine.parse(&text, ctx).await?.is_match().await })
            .await
            .map_err(|e| EvalError::Runtime(format!("script task failed: {e}")))?
    }

    /// Like [`Engine::run`], deserializing the outcome into `T`.
    pub async fn run_as<T>(&self, text: &str, ctx: Option<Arc<dyn Context>>) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let engine = self.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let value = engine.parse(&text, ctx).await?.evaluate().await?;
            serde_json::from_value::<T>(value.clone()).map_err(|e| {
                EvalError::Runtime(format!("cannot convert outcome `{value}` to the requested type: {e}"))
            })
        })
        .await
        .map_err(|e| EvalError::Runtime(format!("script task failed: {e}")))?
    }

    fn build<'a>(&'a self, clause: &'a Clause, ctx: &'a dyn Context) -> BoxFuture<'a, Result<Expression>> {
        async move {
            match clause {
                Clause::Comparison { text, position } => Ok(Expression::Comparison(
                    parse_comparison(text, *position, &self.registry, ctx).await?,
                )),
                Clause::Group { inner, negated } => {
                    let expression = self.build(inner, ctx).await?;
                    Ok(if *negated { expression.invert() } else { expression })
                }
                Clause::Logic { left, operator, right } => {
                    let l = self.build(left, ctx).await?;
                    let r = self.build(right, ctx).await?;
                    let node = match (left.as_ref(), l) {
                        (Clause::Logic { .. }, Expression::Logic(folded)) => folded.expand(*operator, r),
                        (_, l) => LogicExpression::new(l, *operator, r),
                    };
                    Ok(Expression::Logic(node))
                }
            }
        }
        .boxed()
    }
}

/// =========================
/// Script
/// =========================

/// A parsed script: source text, tree and an optional bound context.
#[derive(Clone)]
pub struct Script {
    text: String,
    expression: Expression,
    context: Option<Arc<dyn Context>>,
}

impl Script {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// The bound context, or the default one.
    pub fn context(&self) -> Arc<dyn Context> {
        self.context.clone().unwrap_or_else(default_context)
    }

    pub fn bind(mut self, ctx: Arc<dyn Context>) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn unbind(mut self) -> Self {
        self.context = None;
        self
    }

    pub async fn is_match(&self) -> Result<bool> {
        let ctx = self.context();
        self.expression.is_match(ctx.as_ref()).await
    }

    pub async fn is_match_with(&self, ctx: &dyn Context) -> Result<bool> {
        self.expression.is_match(ctx).await
    }

    pub async fn evaluate(&self) -> Result<Json> {
        Ok(Json::Bool(self.is_match().await?))
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("text", &self.text)
            .field("expression", &self.expression)
            .field("bound", &self.context.is_some())
            .finish()
    }
}
