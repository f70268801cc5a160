use async_trait::async_trait;
use serde_json::Value as Json;

use super::{Operand, OperandParser};
use crate::context::Context;
use crate::errors::{ErrorCode, EvalError, Result};
use crate::operator::ComparativeOperation;
use crate::scanner::Scanner;
use crate::value::{Index, Literal, Scalar, Symbol};

/// `"double quoted"` text with backslash escapes. Comparators on text mean
/// containment.
pub struct StringLiteral;

#[async_trait]
impl OperandParser for StringLiteral {
    fn name(&self) -> &'static str {
        "string"
    }

    async fn parse_left(&self, text: &str, token: &str, _ctx: &dyn Context) -> Result<Option<Operand>> {
        if !text.starts_with('"') {
            return Ok(None);
        }
        let mut sc = Scanner::new(text);
        let s = sc.parse_quoted_string().ok_or_else(|| {
            EvalError::script(ErrorCode::UnterminatedLiteral, format!("unterminated string literal `{text}`"))
        })?;
        if !sc.eof() {
            return Ok(None);
        }
        let op = ComparativeOperation::containment_from_token(token).unwrap_or(ComparativeOperation::None);
        Ok(Some(Operand::new(Literal::new(text, Scalar::Text(s)), op)))
    }
}

pub struct NumberLiteral;

#[async_trait]
impl OperandParser for NumberLiteral {
    fn name(&self) -> &'static str {
        "number"
    }

    async fn parse_left(&self, text: &str, token: &str, _ctx: &dyn Context) -> Result<Option<Operand>> {
        let mut sc = Scanner::new(text);
        match sc.parse_number_literal() {
            Some(n) if sc.eof() => {
                let op = ComparativeOperation::ordinal_from_token(token).unwrap_or(ComparativeOperation::None);
                Ok(Some(Operand::new(Literal::new(text, Scalar::Number(n)), op)))
            }
            _ => Ok(None),
        }
    }
}

/// `true`, `false` and `null`.
pub struct Keyword;

#[async_trait]
impl OperandParser for Keyword {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn parse_left(&self, text: &str, token: &str, _ctx: &dyn Context) -> Result<Option<Operand>> {
        let value = match text {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            "null" => Scalar::Null,
            _ => return Ok(None),
        };
        let op = ComparativeOperation::ordinal_from_token(token).unwrap_or(ComparativeOperation::None);
        Ok(Some(Operand::new(Literal::new(text, value), op)))
    }
}

/// JSON array literal such as `["gold", "silver"]`.
pub struct ListLiteral;

#[async_trait]
impl OperandParser for ListLiteral {
    fn name(&self) -> &'static str {
        "list"
    }

    async fn parse_left(&self, text: &str, token: &str, _ctx: &dyn Context) -> Result<Option<Operand>> {
        if !text.starts_with('[') {
            return Ok(None);
        }
        let items = match serde_json::from_str::<Json>(text) {
            Ok(Json::Array(items)) => items,
            Ok(_) => return Ok(None),
            Err(e) => {
                return Err(EvalError::script(
                    ErrorCode::UnterminatedLiteral,
                    format!("malformed list literal `{text}`: {e}"),
                ))
            }
        };
        let op = ComparativeOperation::containment_from_token(token).unwrap_or(ComparativeOperation::None);
        Ok(Some(Operand::new(Literal::new(text, Scalar::from(Json::Array(items))), op)))
    }
}

/// A context key such as `status`, `user.name`, `tags[0]` or `attrs["env"]`.
///
/// The comparator meaning follows the value the symbol currently has in the
/// context; an unknown value leaves ambiguous tokens to the other side.
pub struct SymbolReference;

impl SymbolReference {
    fn parse_symbol(text: &str) -> Result<Option<Symbol>> {
        let mut sc = Scanner::new(text);
        let Some(key) = sc.parse_identifier() else {
            return Ok(None);
        };
        let mut indexers = Vec::new();
        loop {
            sc.skip_ws();
            if !sc.consume_char('[') {
                break;
            }
            sc.skip_ws();
            let index = if let Some(k) = sc.parse_quoted_string() {
                Some(Index::Key(k))
            } else {
                sc.parse_number_literal()
                    .filter(|n| *n >= 0.0 && n.fract() == 0.0)
                    .map(|n| Index::Position(n as usize))
            };
            sc.skip_ws();
            match index {
                Some(index) if sc.consume_char(']') => indexers.push(index),
                _ => {
                    return Err(EvalError::script(
                        ErrorCode::ExpectedIndexerKey,
                        format!("expected a quoted key or a non-negative index in `{text}` at {}", sc.position()),
                    ))
                }
            }
        }
        if !sc.eof() {
            return Ok(None);
        }
        Ok(Some(Symbol::new(text, key, indexers)))
    }

    async fn infer(symbol: &Symbol, token: &str, ctx: &dyn Context) -> Result<ComparativeOperation> {
        let op = match symbol.lookup(ctx).await? {
            Some(Scalar::Text(_)) | Some(Scalar::List(_)) => ComparativeOperation::containment_from_token(token),
            Some(Scalar::Number(_)) | Some(Scalar::Bool(_)) | Some(Scalar::Null) | Some(Scalar::Map(_)) => {
                ComparativeOperation::ordinal_from_token(token)
            }
            None => ComparativeOperation::unambiguous_from_token(token),
        };
        Ok(op.unwrap_or(ComparativeOperation::None))
    }
}

#[async_trait]
impl OperandParser for SymbolReference {
    fn name(&self) -> &'static str {
        "symbol"
    }

    async fn parse_left(&self, text: &str, token: &str, ctx: &dyn Context) -> Result<Option<Operand>> {
        let Some(symbol) = Self::parse_symbol(text)? else {
            return Ok(None);
        };
        let op = Self::infer(&symbol, token, ctx).await?;
        Ok(Some(Operand::new(symbol, op)))
    }

    // A right-hand symbol of text type on `status < region` reads `<` as
    // "contained in" just like a left-hand one would.
    async fn parse_right(
        &self,
        text: &str,
        token: &str,
        inferred: ComparativeOperation,
        ctx: &dyn Context,
    ) -> Result<Option<Operand>> {
        let Some(symbol) = Self::parse_symbol(text)? else {
            return Ok(None);
        };
        let op = if inferred == ComparativeOperation::None {
            Self::infer(&symbol, token, ctx).await?
        } else {
            inferred
        };
        Ok(Some(Operand::new(symbol, op)))
    }
}
