//! Snippets every engine in the generator starts with.

use std::cmp::Ordering;

use tracing::debug;

use super::engine::Engine;
use super::snippet::SnippetError;
use super::tag::Params;

/// Register the built-in snippets on `engine`.
pub fn register(engine: &mut Engine) {
    engine.register_snippet("if", if_snippet);
}

/// `[[if &subject=`..` &operator=`..` &operand=`..` &then=`..` &else=`..`]]`
///
/// Operators: `==`, `!=`, `<`, `<=`, `>`, `>=`, `empty`, `!empty`. Comparison
/// is numeric when both sides parse as finite numbers, lexical otherwise. `empty`
/// treats whitespace-only text and `0` as empty. An unknown operator is false.
pub fn if_snippet(_engine: &mut Engine, params: &Params) -> Result<String, SnippetError> {
    let subject = params.get_or_empty("subject");
    let operand = params.get_or_empty("operand");
    let operator = params.get_or_empty("operator");

    let holds = match operator {
        "==" => compare(subject, operand) == Ordering::Equal,
        "!=" => compare(subject, operand) != Ordering::Equal,
        "<" => compare(subject, operand) == Ordering::Less,
        "<=" => compare(subject, operand) != Ordering::Greater,
        ">" => compare(subject, operand) == Ordering::Greater,
        ">=" => compare(subject, operand) != Ordering::Less,
        "empty" => is_empty(subject),
        "!empty" => !is_empty(subject),
        other => {
            debug!(operator = other, "unknown operator in if snippet");
            false
        }
    };

    let branch = if holds { "then" } else { "else" };
    Ok(params.get_or_empty(branch).to_owned())
}

fn compare(a: &str, b: &str) -> Ordering {
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Finite numbers only: `nan`, `inf` and friends compare as text.
fn number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_empty(s: &str) -> bool {
    matches!(s.trim(), "" | "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(subject: &str, operator: &str, operand: &str) -> String {
        let params = Params::from([
            ("subject", subject),
            ("operator", operator),
            ("operand", operand),
            ("then", "yes"),
            ("else", "no"),
        ]);
        if_snippet(&mut Engine::new(), &params).unwrap()
    }

    #[test]
    fn equality() {
        assert_eq!(eval("a", "==", "a"), "yes");
        assert_eq!(eval("a", "==", "b"), "no");
        assert_eq!(eval("a", "!=", "b"), "yes");
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(eval("10", ">", "9"), "yes");
        assert_eq!(eval("1.0", "==", "1"), "yes");
        assert_eq!(eval("2", "<=", "2"), "yes");
    }

    #[test]
    fn nan_and_infinity_are_text() {
        assert_eq!(eval("nan", "==", "5"), "no");
        assert_eq!(eval("NaN", "==", "nan"), "no");
        assert_eq!(eval("nan", "==", "nan"), "yes");
        assert_eq!(eval("inf", ">", "5"), "yes");
        assert_eq!(eval("infinity", "<", "5"), "no");
    }

    #[test]
    fn text_compares_lexically() {
        assert_eq!(eval("apple", "<", "banana"), "yes");
        assert_eq!(eval("10", ">", "x"), "no");
    }

    #[test]
    fn emptiness() {
        assert_eq!(eval("  ", "empty", ""), "yes");
        assert_eq!(eval("0", "empty", ""), "yes");
        assert_eq!(eval("x", "!empty", ""), "yes");
    }

    #[test]
    fn unknown_operator_takes_else() {
        assert_eq!(eval("a", "~=", "a"), "no");
    }

    #[test]
    fn missing_else_is_empty() {
        let params = Params::from([("subject", "a"), ("operator", "=="), ("operand", "b")]);
        assert_eq!(if_snippet(&mut Engine::new(), &params).unwrap(), "");
    }

    #[test]
    fn registered_snippet_drives_layout_choice() {
        let mut engine = Engine::new();
        register(&mut engine);
        engine.register_chunk("menu", "<nav/>");
        engine.set_placeholder("page.in_menu", "true");
        let out = engine
            .render_string(
                "[[if &subject=`[[+page.in_menu]]` &operator=`==` &operand=`true` &then=`[[$menu]]`]]",
                &Params::new(),
            )
            .unwrap();
        assert_eq!(out, "<nav/>");
    }
}
