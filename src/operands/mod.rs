use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Result;
use crate::operator::ComparativeOperation;
use crate::value::Value;

pub mod builtins;

/// A recognised operand and the operation its parser inferred for the
/// comparator token (`ComparativeOperation::None` when it has no opinion).
#[derive(Debug, Clone)]
pub struct Operand {
    pub value: Arc<dyn Value>,
    pub operation: ComparativeOperation,
}

impl Operand {
    pub fn new(value: impl Value + 'static, operation: ComparativeOperation) -> Self {
        Self {
            value: Arc::new(value),
            operation,
        }
    }
}

/// Trait for pluggable operand syntaxes tried by the comparison parser.
///
/// `Ok(None)` means "not my syntax, ask the next parser". An `Err` is a
/// malformed operand of this parser's syntax and aborts the whole parse.
#[async_trait]
pub trait OperandParser: Send + Sync {
    fn name(&self) -> &'static str;

    async fn parse_left(&self, text: &str, token: &str, ctx: &dyn Context) -> Result<Option<Operand>>;

    /// `inferred` is the operation settled by the left side so far.
    async fn parse_right(
        &self,
        text: &str,
        token: &str,
        inferred: ComparativeOperation,
        ctx: &dyn Context,
    ) -> Result<Option<Operand>> {
        let _ = inferred;
        self.parse_left(text, token, ctx).await
    }
}

/// Ordered, cheaply clonable operand parser list.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Vec<Arc<dyn OperandParser>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// String, number, keyword, list and symbol operands, in that priority.
    pub fn with_builtins() -> Self {
        let parsers: Vec<Arc<dyn OperandParser>> = vec![
            Arc::new(builtins::StringLiteral),
            Arc::new(builtins::NumberLiteral),
            Arc::new(builtins::Keyword),
            Arc::new(builtins::ListLiteral),
            Arc::new(builtins::SymbolReference),
        ];
        Self { inner: Arc::new(parsers) }
    }

    /// Appends `parser` with the lowest priority.
    pub fn register<P: OperandParser + 'static>(&mut self, parser: P) {
        Arc::make_mut(&mut self.inner).push(Arc::new(parser));
    }

    /// Inserts `parser` ahead of every registered parser.
    pub fn register_front<P: OperandParser + 'static>(&mut self, parser: P) {
        Arc::make_mut(&mut self.inner).insert(0, Arc::new(parser));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn OperandParser>> {
        self.inner.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.inner.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
