use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use itertools::Itertools;
use serde_json::Value as Json;

use crate::context::{Context, StringComparison};
use crate::errors::{ErrorCode, EvalError, Result};
use crate::operator::ComparativeOperation;

/// A concrete, comparable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Scalar>),
    Map(BTreeMap<String, Scalar>),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Number(_) => "number",
            Scalar::Text(_) => "text",
            Scalar::List(_) => "list",
            Scalar::Map(_) => "map",
        }
    }

    /// Whether this kind of value can take part in `op` as the left operand.
    pub fn supports(&self, op: ComparativeOperation) -> bool {
        use ComparativeOperation as Op;
        match op {
            Op::None => false,
            Op::Equal | Op::NotEqual => true,
            _ if op.is_ordering() => matches!(self, Scalar::Number(_) | Scalar::Text(_)),
            _ => matches!(self, Scalar::Text(_) | Scalar::List(_)),
        }
    }

    /// Ordering between two scalars, if they are comparable.
    ///
    /// Numbers compare numerically, also against numeric text; text compares
    /// under the given policy; booleans order `false < true`.
    pub fn compare(&self, other: &Scalar, cmp: StringComparison) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => cmp_f64(*a, *b),
            (Scalar::Text(a), Scalar::Text(b)) => Some(cmp.compare(a, b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Number(a), Scalar::Text(b)) => b.trim().parse::<f64>().ok().and_then(|b| cmp_f64(*a, b)),
            (Scalar::Text(a), Scalar::Number(b)) => a.trim().parse::<f64>().ok().and_then(|a| cmp_f64(a, *b)),
            _ => None,
        }
    }

    pub fn equals(&self, other: &Scalar, cmp: StringComparison) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::List(a), Scalar::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y, cmp))
            }
            (Scalar::Map(a), Scalar::Map(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && va.equals(vb, cmp))
            }
            _ => self.compare(other, cmp) == Some(Ordering::Equal),
        }
    }

    pub fn less_than(&self, other: &Scalar, cmp: StringComparison) -> bool {
        self.compare(other, cmp) == Some(Ordering::Less)
    }

    pub fn greater_than(&self, other: &Scalar, cmp: StringComparison) -> bool {
        self.compare(other, cmp) == Some(Ordering::Greater)
    }

    /// Reflexive containment: a value always contains itself.
    ///
    /// Text contains a substring (numbers and booleans are matched by their
    /// text form); a list contains any element equal to `other`.
    pub fn contains(&self, other: &Scalar, cmp: StringComparison) -> bool {
        if self.equals(other, cmp) {
            return true;
        }
        match (self, other) {
            (Scalar::Text(hay), Scalar::Text(needle)) => cmp.contains(hay, needle),
            (Scalar::Text(hay), Scalar::Number(_) | Scalar::Bool(_)) => cmp.contains(hay, &other.to_string()),
            (Scalar::List(items), _) => items.iter().any(|item| item.equals(other, cmp)),
            _ => false,
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Option<Ordering> {
    if (a - b).abs() < f64::EPSILON {
        Some(Ordering::Equal)
    } else {
        a.partial_cmp(&b)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            Scalar::Map(map) => write!(f, "{{{}}}", map.iter().map(|(k, v)| format!("{k}: {v}")).join(", ")),
        }
    }
}

impl From<Json> for Scalar {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => Scalar::Null,
            Json::Bool(b) => Scalar::Bool(b),
            Json::Number(n) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null),
            Json::String(s) => Scalar::Text(s),
            Json::Array(items) => Scalar::List(items.into_iter().map(Scalar::from).collect()),
            Json::Object(map) => Scalar::Map(map.into_iter().map(|(k, v)| (k, Scalar::from(v))).collect()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// A parsed operand.
///
/// Literals already know their scalar; symbols look it up in a [`Context`]
/// each time they are resolved, so one tree can be evaluated against many
/// contexts.
#[async_trait]
pub trait Value: fmt::Debug + Send + Sync {
    /// Canonical text of the operand.
    fn source(&self) -> &str;

    async fn resolve(&self, ctx: &dyn Context) -> Result<Scalar>;

    /// Whether the operand can sit on the left of `op`.
    async fn is_valid_operation(&self, op: ComparativeOperation, ctx: &dyn Context) -> Result<bool> {
        Ok(self.resolve(ctx).await?.supports(op))
    }
}

/// An operand whose value is fixed in the script text.
#[derive(Debug, Clone)]
pub struct Literal {
    source: String,
    value: Scalar,
}

impl Literal {
    pub fn new(source: impl Into<String>, value: Scalar) -> Self {
        Self { source: source.into(), value }
    }

    pub fn value(&self) -> &Scalar {
        &self.value
    }
}

#[async_trait]
impl Value for Literal {
    fn source(&self) -> &str {
        &self.source
    }

    async fn resolve(&self, _ctx: &dyn Context) -> Result<Scalar> {
        Ok(self.value.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    Key(String),
    Position(usize),
}

/// A named value looked up through the context, optionally indexed.
#[derive(Debug, Clone)]
pub struct Symbol {
    source: String,
    key: String,
    indexers: Vec<Index>,
}

impl Symbol {
    pub fn new(source: impl Into<String>, key: impl Into<String>, indexers: Vec<Index>) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
            indexers,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Looks the symbol up, `None` when the default context has no value for it.
    pub async fn lookup(&self, ctx: &dyn Context) -> Result<Option<Scalar>> {
        let base = match ctx.resolve_value(&self.key).await {
            Ok(v) => v,
            Err(EvalError::Script(e)) if e.code == ErrorCode::UnresolvedSymbol && ctx.is_default_context() => {
                tracing::trace!(key = %self.key, "unresolved symbol under default context");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(self.indexers.iter().try_fold(base, |current, index| match (current, index) {
            (Scalar::Map(mut map), Index::Key(k)) => map.remove(k),
            (Scalar::List(mut items), Index::Position(p)) if *p < items.len() => Some(items.swap_remove(*p)),
            _ => None,
        }))
    }
}

#[async_trait]
impl Value for Symbol {
    fn source(&self) -> &str {
        &self.source
    }

    async fn resolve(&self, ctx: &dyn Context) -> Result<Scalar> {
        Ok(self.lookup(ctx).await?.unwrap_or(Scalar::Null))
    }

    // A symbol with no value yet cannot be ruled out.
    async fn is_valid_operation(&self, op: ComparativeOperation, ctx: &dyn Context) -> Result<bool> {
        Ok(match self.lookup(ctx).await? {
            Some(scalar) => scalar.supports(op),
            None => op != ComparativeOperation::None,
        })
    }
}
