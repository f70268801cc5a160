use std::sync::Arc;

use tracing::trace;

use crate::context::Context;
use crate::errors::{ErrorCode, EvalError, Result};
use crate::expression::ComparisonExpression;
use crate::operands::Registry;
use crate::operator::{ComparativeOperation, COMPARATOR_TOKENS};
use crate::scanner::Scanner;
use crate::value::{Scalar, Value};

/// Both operands of a comparison together with the settled operation.
pub struct ResolvedOperands {
    pub left: Arc<dyn Value>,
    pub right: Arc<dyn Value>,
    pub operation: ComparativeOperation,
}

/// Parses one `left OP right` fragment into a validated leaf.
pub async fn parse_comparison(
    fragment: &str,
    position: usize,
    registry: &Registry,
    ctx: &dyn Context,
) -> Result<ComparisonExpression> {
    let mut sc = Scanner::with_offset(fragment, position);
    let (left_text, token) = sc.eat_to_tokens(&COMPARATOR_TOKENS);
    let Some(token) = token else {
        return Err(EvalError::script(
            ErrorCode::ExpectedComparisonOperator,
            format!("expected a comparison operator in `{fragment}` at {position}"),
        ));
    };
    let left_text = left_text.trim();
    let right_text = sc.rest().trim();

    let resolved = resolve_operands(left_text, token, right_text, registry, ctx).await?;
    validate(&resolved, fragment, ctx).await?;
    trace!(fragment, operation = ?resolved.operation, "comparison parsed");
    Ok(ComparisonExpression::new(
        fragment.trim(),
        resolved.operation,
        resolved.left,
        resolved.right,
    ))
}

/// Asks each registered parser in turn for whichever side is still missing,
/// until both sides and the operation are known.
pub async fn resolve_operands(
    left_text: &str,
    token: &str,
    right_text: &str,
    registry: &Registry,
    ctx: &dyn Context,
) -> Result<ResolvedOperands> {
    let mut left: Option<Arc<dyn Value>> = None;
    let mut right: Option<Arc<dyn Value>> = None;
    let mut operation = ComparativeOperation::None;

    for parser in registry.iter() {
        if left.is_none() {
            if let Some(found) = parser.parse_left(left_text, token, ctx).await? {
                trace!(parser = parser.name(), operand = left_text, "left operand recognised");
                if operation == ComparativeOperation::None {
                    operation = found.operation;
                }
                left = Some(found.value);
            }
        }
        if right.is_none() {
            if let Some(found) = parser.parse_right(right_text, token, operation, ctx).await? {
                trace!(parser = parser.name(), operand = right_text, "right operand recognised");
                if operation == ComparativeOperation::None {
                    operation = found.operation;
                }
                right = Some(found.value);
            }
        }
        if left.is_some() && right.is_some() && operation != ComparativeOperation::None {
            break;
        }
    }

    let left = left.ok_or_else(|| {
        EvalError::script(
            ErrorCode::UnrecognizedLeftOperand,
            format!("unrecognized left operand `{left_text}`"),
        )
    })?;
    let right = right.ok_or_else(|| {
        EvalError::script(
            ErrorCode::UnrecognizedRightOperand,
            format!("unrecognized right operand `{right_text}`"),
        )
    })?;
    if operation == ComparativeOperation::None {
        return Err(EvalError::script(
            ErrorCode::UnrecognizedComparativeExpression,
            format!("cannot tell what `{token}` means between `{left_text}` and `{right_text}`"),
        ));
    }
    Ok(ResolvedOperands { left, right, operation })
}

// The right operand sees the relation mirrored: `a < b` needs `b` to support `>`.
async fn validate(resolved: &ResolvedOperands, fragment: &str, ctx: &dyn Context) -> Result<()> {
    let op = resolved.operation;
    let left_ok = resolved.left.is_valid_operation(op, ctx).await?;
    let right_ok = left_ok
        && resolved
            .right
            .is_valid_operation(op.from_right_operand_perspective(), ctx)
            .await?;
    if left_ok && right_ok && orderable(resolved, ctx).await? {
        return Ok(());
    }
    Err(EvalError::script(
        ErrorCode::InvalidOperatorForOperands,
        format!("operation {op:?} is not valid for the operands of `{}`", fragment.trim()),
    ))
}

// Known values on both sides of an ordering must be comparable with each other.
// A missing value (null) is left to evaluation.
async fn orderable(resolved: &ResolvedOperands, ctx: &dyn Context) -> Result<bool> {
    if !resolved.operation.is_ordering() {
        return Ok(true);
    }
    let left = resolved.left.resolve(ctx).await?;
    let right = resolved.right.resolve(ctx).await?;
    if left == Scalar::Null || right == Scalar::Null {
        return Ok(true);
    }
    Ok(left.compare(&right, ctx.string_comparison()).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{default_context, ScriptValueProvider};
    use pretty_assertions::assert_eq;

    async fn parse(fragment: &str) -> Result<ComparisonExpression> {
        let ctx = ScriptValueProvider::new()
            .with("status", "active")
            .with("level", 3i64)
            .with("name", "abc")
            .with("tags", serde_json::json!(["a", "b"]));
        parse_comparison(fragment, 0, &Registry::with_builtins(), &ctx).await
    }

    #[tokio::test]
    async fn resolves_operands_and_operation() {
        let expr = parse(r#"status == "active""#).await.unwrap();
        assert_eq!(expr.operator(), ComparativeOperation::Equal);
        assert_eq!(expr.left().source(), "status");
        assert_eq!(expr.right().source(), r#""active""#);
        assert_eq!(expr.text(), r#"status == "active""#);
    }

    #[tokio::test]
    async fn operand_types_choose_the_meaning_of_angle_brackets() {
        assert_eq!(parse("level < 10").await.unwrap().operator(), ComparativeOperation::LessThan);
        assert_eq!(parse(r#"status < "inactive""#).await.unwrap().operator(), ComparativeOperation::Contained);
        assert_eq!(parse(r#"tags > "a""#).await.unwrap().operator(), ComparativeOperation::Contains);
        assert_eq!(parse(r#""b" !< tags"#).await.unwrap().operator(), ComparativeOperation::NotContained);
    }

    #[tokio::test]
    async fn error_codes() {
        let cases = [
            ("status", ErrorCode::ExpectedComparisonOperator),
            ("lev el == 1", ErrorCode::UnrecognizedLeftOperand),
            ("level == 1 2", ErrorCode::UnrecognizedRightOperand),
            ("level !< 5", ErrorCode::InvalidOperatorForOperands),
            ("true > false", ErrorCode::InvalidOperatorForOperands),
            ("ghost == 1", ErrorCode::UnresolvedSymbol),
            ("name < 5", ErrorCode::InvalidOperatorForOperands),
            ("5 >= name", ErrorCode::InvalidOperatorForOperands),
        ];
        for (fragment, code) in cases {
            let err = parse(fragment).await.unwrap_err();
            assert_eq!(err.code(), Some(code), "{fragment}");
        }
    }

    #[tokio::test]
    async fn unknown_symbols_leave_angle_brackets_ambiguous() {
        let ctx = default_context();
        let err = parse_comparison("a < b", 0, &Registry::with_builtins(), ctx.as_ref())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnrecognizedComparativeExpression));
        let ok = parse_comparison("a == b", 0, &Registry::with_builtins(), ctx.as_ref()).await;
        assert!(ok.is_ok());
    }
}
