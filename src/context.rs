use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorCode, EvalError, Result};
use crate::value::Scalar;

/// How text operands are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringComparison {
    #[default]
    Ordinal,
    OrdinalIgnoreCase,
}

impl StringComparison {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            StringComparison::Ordinal => a.cmp(b),
            StringComparison::OrdinalIgnoreCase => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }

    pub fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            StringComparison::Ordinal => haystack.contains(needle),
            StringComparison::OrdinalIgnoreCase => haystack.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// Where scripts look up the values of their symbols.
#[async_trait]
pub trait Context: Send + Sync {
    fn string_comparison(&self) -> StringComparison;

    /// Resolves `key`, failing with [`ErrorCode::UnresolvedSymbol`] when unknown.
    async fn resolve_value(&self, key: &str) -> Result<Scalar>;

    /// Under the default context unknown symbols mean "no value" instead of
    /// an error.
    fn is_default_context(&self) -> bool {
        false
    }
}

/// Dictionary-backed context.
///
/// Mutation needs `&mut self`; share a filled provider behind an `Arc` for
/// concurrent evaluations.
#[derive(Debug, Clone, Default)]
pub struct ScriptValueProvider {
    values: HashMap<String, Scalar>,
    comparison: StringComparison,
    is_default: bool,
}

/// Settings accepted by [`ScriptValueProvider::from_document`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderDocument {
    #[serde(default)]
    comparison: StringComparison,
    #[serde(default)]
    values: serde_json::Map<String, serde_json::Value>,
}

impl ScriptValueProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a provider from a JSON object whose members are the values.
    /// Every key is a symbol, `values` and `comparison` included.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| EvalError::format(format!("invalid context JSON: {e}"), json, e.column()))?;
        let serde_json::Value::Object(values) = raw else {
            return Err(EvalError::format("context JSON must be an object", json, 0));
        };
        Ok(Self::from_members(StringComparison::default(), values))
    }

    /// Builds a provider from a settings document:
    /// `{"comparison": "ordinal_ignore_case", "values": {...}}`.
    pub fn from_document(json: &str) -> Result<Self> {
        let doc: ProviderDocument = serde_json::from_str(json)
            .map_err(|e| EvalError::format(format!("invalid context document: {e}"), json, e.column()))?;
        Ok(Self::from_members(doc.comparison, doc.values))
    }

    fn from_members(comparison: StringComparison, values: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut provider = Self::new().with_comparison(comparison);
        for (key, value) in values {
            provider.insert(key, value);
        }
        provider
    }

    pub fn with_comparison(mut self, comparison: StringComparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Option<Scalar> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Scalar> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl Context for ScriptValueProvider {
    fn string_comparison(&self) -> StringComparison {
        self.comparison
    }

    async fn resolve_value(&self, key: &str) -> Result<Scalar> {
        self.values.get(key).cloned().ok_or_else(|| {
            EvalError::script(ErrorCode::UnresolvedSymbol, format!("symbol `{key}` is not defined"))
        })
    }

    fn is_default_context(&self) -> bool {
        self.is_default
    }
}

static DEFAULT_CONTEXT: Lazy<Arc<ScriptValueProvider>> = Lazy::new(|| {
    tracing::debug!("initialising default script context");
    Arc::new(ScriptValueProvider {
        is_default: true,
        ..ScriptValueProvider::default()
    })
});

/// Process-wide context used when a caller supplies none.
pub fn default_context() -> Arc<dyn Context> {
    DEFAULT_CONTEXT.clone()
}
