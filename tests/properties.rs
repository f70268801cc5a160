use std::sync::Arc;

use filter_script as fs;
use filter_script::{compare, ComparativeOperation, Context, Scalar, ScriptValueProvider, StringComparison};
use proptest::prelude::*;

fn numeric_leaf() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["a", "b", "c"]),
        prop::sample::select(vec!["==", "!=", "<", "<=", ">", ">="]),
        0i64..5,
    )
        .prop_map(|(sym, op, n)| format!("{sym} {op} {n}"))
}

fn text_leaf() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["==", "!=", "<", "<=", ">", ">=", "!<", "!>"]),
        "[ab]{0,2}",
    )
        .prop_map(|(op, s)| format!(r#"name {op} "{s}""#))
}

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![numeric_leaf(), text_leaf()]
}

fn script() -> impl Strategy<Value = String> {
    tree(leaf())
}

fn numeric_script() -> impl Strategy<Value = String> {
    tree(numeric_leaf())
}

fn tree(leaf: impl Strategy<Value = String> + 'static) -> impl Strategy<Value = String> {
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["&&", "||"]), inner.clone())
                .prop_map(|(l, op, r)| format!("{l} {op} ({r})")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.prop_map(|e| format!("!({e})")),
        ]
    })
}

fn context(a: i64, b: i64, c: i64, name: &str) -> Arc<dyn Context> {
    Arc::new(
        ScriptValueProvider::new()
            .with("a", a)
            .with("b", b)
            .with("c", c)
            .with("name", name),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

proptest! {
    #[test]
    fn double_inversion_keeps_the_result(text in script(), a in 0i64..5, b in 0i64..5, c in 0i64..5, name in "[ab]{0,3}") {
        let ctx = context(a, b, c, &name);
        runtime().block_on(async {
            let parsed = fs::parse(&text, Some(ctx.clone())).await.unwrap();
            let expr = parsed.expression();
            let once = expr.invert();
            let twice = once.invert();
            let original = expr.is_match(ctx.as_ref()).await.unwrap();
            prop_assert_eq!(once.is_match(ctx.as_ref()).await.unwrap(), !original);
            prop_assert_eq!(twice.is_match(ctx.as_ref()).await.unwrap(), original);
            Ok(())
        })?;
    }

    #[test]
    fn negated_group_is_the_complement(text in script(), a in 0i64..5, b in 0i64..5, c in 0i64..5, name in "[ab]{0,3}") {
        let ctx = context(a, b, c, &name);
        runtime().block_on(async {
            let plain = fs::run(&text, Some(ctx.clone())).await.unwrap();
            let negated = fs::run(&format!("!({text})"), Some(ctx.clone())).await.unwrap();
            prop_assert_eq!(negated, !plain);
            Ok(())
        })?;
    }

    #[test]
    fn canonical_text_reparses_equivalently(text in script(), a in 0i64..5, b in 0i64..5, c in 0i64..5, name in "[ab]{0,3}") {
        let ctx = context(a, b, c, &name);
        runtime().block_on(async {
            let first = fs::parse(&text, Some(ctx.clone())).await.unwrap();
            let canonical = first.expression().to_string();
            let second = fs::parse(&canonical, Some(ctx.clone())).await.unwrap();
            prop_assert_eq!(second.expression().to_string(), canonical);
            prop_assert_eq!(first.is_match().await.unwrap(), second.is_match().await.unwrap());
            Ok(())
        })?;
    }

    #[test]
    fn negated_group_is_the_complement_for_missing_values(text in numeric_script()) {
        // the default context has none of the symbols, so every one is null
        runtime().block_on(async {
            let plain = fs::run(&text, None).await.unwrap();
            let negated = fs::run(&format!("!({text})"), None).await.unwrap();
            prop_assert_eq!(negated, !plain);
            Ok(())
        })?;
    }

    #[test]
    fn inversion_holds_for_values_that_cannot_be_ordered(text in numeric_script(), a in 0i64..5, word in "[ab]{1,3}") {
        let ctx = context(a, a, a, "");
        let rebound: Arc<dyn Context> = Arc::new(
            ScriptValueProvider::new().with("a", word.as_str()).with("b", true).with("c", a),
        );
        runtime().block_on(async {
            let parsed = fs::parse(&text, Some(ctx)).await.unwrap();
            let expr = parsed.expression();
            let plain = expr.is_match(rebound.as_ref()).await.unwrap();
            prop_assert_eq!(expr.invert().is_match(rebound.as_ref()).await.unwrap(), !plain);
            Ok(())
        })?;
    }

    #[test]
    fn inverted_operation_negates_numbers(l in -3.0f64..3.0, r in -3.0f64..3.0, i in 1usize..7) {
        let op = ComparativeOperation::ALL[i];
        let (l, r) = (Scalar::Number(l.round()), Scalar::Number(r.round()));
        let cmp = StringComparison::Ordinal;
        prop_assert_eq!(compare(op.invert(), &l, &r, cmp), !compare(op, &l, &r, cmp));
    }

    #[test]
    fn inverted_operation_negates_containment(l in "[ab]{0,3}", r in "[ab]{0,3}", i in 7usize..13) {
        let op = ComparativeOperation::ALL[i];
        let (l, r) = (Scalar::Text(l), Scalar::Text(r));
        let cmp = StringComparison::Ordinal;
        prop_assert_eq!(compare(op.invert(), &l, &r, cmp), !compare(op, &l, &r, cmp));
    }

    #[test]
    fn right_perspective_is_an_involution(i in 0usize..13) {
        let op = ComparativeOperation::ALL[i];
        prop_assert_eq!(op.from_right_operand_perspective().from_right_operand_perspective(), op);
    }
}
