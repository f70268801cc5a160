use crate::errors::{EvalError, Result};
use crate::operator::{LogicalOperator, LOGICAL_TOKENS};
use crate::scanner::Scanner;

/// Shape of a script before its operands are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Raw `left OP right` text and its absolute position.
    Comparison { text: String, position: usize },
    Group { inner: Box<Clause>, negated: bool },
    Logic {
        left: Box<Clause>,
        operator: LogicalOperator,
        right: Box<Clause>,
    },
}

/// Splits `text` into comparisons and groups joined by `&&` / `||`.
///
/// Folding is strictly left to right: `a && b || c` is `(a && b) || c`.
pub fn parse_clauses(text: &str) -> Result<Clause> {
    parse_logic(text, 0)
}

fn parse_logic(text: &str, base: usize) -> Result<Clause> {
    let mut sc = Scanner::with_offset(text, base);
    let (mut tree, mut pending) = parse_term(&mut sc)?;
    while let Some(operator) = pending {
        sc.skip_ws();
        if sc.eof() {
            return Err(EvalError::format(
                format!("expected an operand after `{}`", operator.token()),
                text,
                sc.position(),
            ));
        }
        let (right, next) = parse_term(&mut sc)?;
        tree = Clause::Logic {
            left: Box::new(tree),
            operator,
            right: Box::new(right),
        };
        pending = next;
    }
    Ok(tree)
}

// One `!(group)`, `(group)` or comparison, plus the connective after it.
fn parse_term(sc: &mut Scanner) -> Result<(Clause, Option<LogicalOperator>)> {
    sc.skip_ws();
    let start = sc.position();
    let negated = sc.consume_char('!');
    if negated {
        sc.skip_ws();
        if !sc.is_token("(") {
            return Err(EvalError::format("expected `(` after `!`", sc.source(), sc.position()));
        }
    }

    if sc.is_token("(") {
        let opened_at = sc.rest();
        sc.consume_char('(');
        let inner_start = sc.position();
        let Some(inner) = sc.try_eat_group() else {
            return Err(EvalError::format("unbalanced parentheses", opened_at, start));
        };
        sc.consume_char(')');
        let clause = parse_logic(inner, inner_start)?;
        sc.skip_ws();
        let next = if sc.eof() {
            None
        } else {
            match LOGICAL_TOKENS.iter().copied().find(|t| sc.is_token(t)) {
                Some(token) => {
                    sc.eat_token(token);
                    LogicalOperator::from_token(token)
                }
                None => {
                    return Err(EvalError::format(
                        "expected `&&` or `||` after group",
                        sc.rest(),
                        sc.position(),
                    ))
                }
            }
        };
        tracing::trace!(group = inner, negated, "group parsed");
        return Ok((
            Clause::Group {
                inner: Box::new(clause),
                negated,
            },
            next,
        ));
    }

    let (fragment, token) = sc.eat_to_tokens(&LOGICAL_TOKENS);
    let trimmed = fragment.trim();
    if trimmed.is_empty() {
        return Err(EvalError::format("expected a comparison", sc.source(), start));
    }
    let position = start + (fragment.len() - fragment.trim_start().len());
    let mut inner = Scanner::new(trimmed);
    if let (before, Some(_)) = inner.eat_to_tokens(&[")"]) {
        return Err(EvalError::format(
            "unbalanced parentheses",
            sc.source(),
            position + before.len(),
        ));
    }
    Ok((
        Clause::Comparison {
            text: trimmed.to_string(),
            position,
        },
        token.and_then(LogicalOperator::from_token),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(text: &str, position: usize) -> Box<Clause> {
        Box::new(Clause::Comparison {
            text: text.into(),
            position,
        })
    }

    #[test]
    fn single_comparison() {
        assert_eq!(parse_clauses("  a == 1 ").unwrap(), *leaf("a == 1", 2));
    }

    #[test]
    fn folds_left_without_precedence() {
        let tree = parse_clauses("a==1&&b==2||c==3").unwrap();
        assert_eq!(
            tree,
            Clause::Logic {
                left: Box::new(Clause::Logic {
                    left: leaf("a==1", 0),
                    operator: LogicalOperator::And,
                    right: leaf("b==2", 6),
                }),
                operator: LogicalOperator::Or,
                right: leaf("c==3", 12),
            }
        );
    }

    #[test]
    fn groups_and_negation() {
        let tree = parse_clauses("a == 1 && !(b == 2 || c == 3)").unwrap();
        let Clause::Logic { left, operator, right } = tree else {
            panic!("expected a logic clause");
        };
        assert_eq!(left, leaf("a == 1", 0));
        assert_eq!(operator, LogicalOperator::And);
        assert_eq!(
            *right,
            Clause::Group {
                inner: Box::new(Clause::Logic {
                    left: leaf("b == 2", 12),
                    operator: LogicalOperator::Or,
                    right: leaf("c == 3", 22),
                }),
                negated: true,
            }
        );
    }

    #[test]
    fn nested_groups() {
        let tree = parse_clauses("((a == 1))").unwrap();
        assert_eq!(
            tree,
            Clause::Group {
                inner: Box::new(Clause::Group {
                    inner: leaf("a == 1", 2),
                    negated: false,
                }),
                negated: false,
            }
        );
    }

    #[test]
    fn dangling_operator_reports_position() {
        let err = parse_clauses("a == 1 && ").unwrap_err();
        assert!(matches!(err, EvalError::Format { position: 10, .. }), "{err:?}");
        assert!(parse_clauses("a == 1 && || b == 2").is_err());
    }

    #[test]
    fn structural_errors() {
        for bad in [
            r#"(status == "active""#,
            r#"status == "active")"#,
            "a == 1) && b == 2",
            "!a == 1",
            "(a == 1) b",
            "()",
            "! ",
        ] {
            let err = parse_clauses(bad).unwrap_err();
            assert!(matches!(err, EvalError::Format { .. }), "{bad}: {err:?}");
        }
    }
}
