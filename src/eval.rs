use std::borrow::Cow;
use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::lexer::Operator;
use crate::parser::{Condition, Operand};
use crate::value::{Value, ABSENT};

/// Evaluate a `left operator right` test against a parameter bag.
///
/// Never fails: a malformed test or an unknown operator is logged and
/// evaluates to `false`.
pub fn evaluate(test: &str, params: &Value) -> bool {
    Scope::new(params).evaluate(test)
}

/// Name resolution for tests: the caller's bag plus any loop locals
/// layered on top of it (the current `foreach` item).
#[derive(Clone, Debug)]
pub struct Scope<'a> {
    root: &'a Value,
    locals: Vec<(&'a str, &'a Value)>,
}

impl<'a> Scope<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            locals: Vec::new(),
        }
    }

    /// A child scope where `name` shadows any key of the same name in the bag.
    pub fn with_local(&self, name: &'a str, value: &'a Value) -> Scope<'a> {
        let mut child = self.clone();
        child.locals.push((name, value));
        child
    }

    pub fn lookup(&self, path: &str) -> Cow<'a, Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        // Innermost local wins.
        let local = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| *name == head)
            .map(|&(_, value)| value);
        if let Some(value) = local {
            return match rest {
                Some(rest) => value.lookup(rest),
                None => Cow::Borrowed(value),
            };
        }

        self.root.lookup(path)
    }

    pub fn evaluate(&self, test: &str) -> bool {
        let outcome = match Condition::parse(test) {
            Ok(condition) => self.check(&condition),
            Err(anomaly) => {
                debug!(%anomaly, "test treated as false");
                false
            }
        };
        trace!(test, outcome, "evaluated test");
        outcome
    }

    pub fn check(&self, condition: &Condition) -> bool {
        let left = self.lookup(&condition.left);
        let right = match &condition.right {
            Operand::Null => Cow::Owned(Value::Null),
            Operand::Undefined => Cow::Borrowed(&ABSENT),
            Operand::Number(n) => Cow::Owned(Value::Number(*n)),
            Operand::Path(path) => self.lookup(path),
        };
        let (l, r) = (left.as_ref(), right.as_ref());

        match condition.op {
            Operator::StrictEq => identical(l, r, &condition.right),
            Operator::StrictNotEq => !identical(l, r, &condition.right),
            Operator::LooseEq => l.loose_eq(r),
            Operator::LooseNotEq => !l.loose_eq(r),
            Operator::Gt => matches!(l.compare(r), Some(Ordering::Greater)),
            Operator::Lt => matches!(l.compare(r), Some(Ordering::Less)),
            Operator::GtEq => matches!(l.compare(r), Some(Ordering::Greater | Ordering::Equal)),
            Operator::LtEq => matches!(l.compare(r), Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// `===` without coercion, except that a missing value matches the `null`
/// literal. A `null` in the bag still differs from `undefined` or from a
/// path that resolves to nothing.
fn identical(left: &Value, right: &Value, operand: &Operand) -> bool {
    (left.is_absent() && matches!(operand, Operand::Null)) || left.strict_eq(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn strict_equality_on_nested_path() {
        assert!(evaluate("a.b === 5", &bag(json!({"a": {"b": 5}}))));
        assert!(!evaluate("a.b === 5", &bag(json!({"a": {"b": 6}}))));
        assert!(!evaluate("a.b === 5", &bag(json!({"a": {"b": "5"}}))));
    }

    #[test]
    fn missing_values_against_null_and_undefined() {
        let empty = bag(json!({}));
        assert!(evaluate("x === null", &empty));
        assert!(evaluate("x === undefined", &empty));
        assert!(!evaluate("x !== null", &empty));
        assert!(evaluate("x == null", &empty));
        assert!(!evaluate("x !== undefined", &empty));
        assert!(evaluate("x != 0", &empty));
        assert!(!evaluate("x.y.z === 1", &empty));
    }

    #[test]
    fn missing_value_matches_only_the_null_literal() {
        let params = bag(json!({"a": null}));
        assert!(evaluate("missing === null", &params));
        assert!(!evaluate("missing === a", &params));
        assert!(!evaluate("a === missing", &params));
    }

    #[test]
    fn null_value_in_bag() {
        let params = bag(json!({"name": null}));
        assert!(evaluate("name === null", &params));
        assert!(evaluate("name == undefined", &params));
        assert!(!evaluate("name === undefined", &params));
        assert!(evaluate("name !== undefined", &params));
        assert!(!evaluate("name === NULL", &params));
        assert!(!evaluate("name === 0", &params));
        assert!(evaluate("name != 1", &params));
    }

    #[test]
    fn loose_equality_coerces_strings_to_numbers() {
        let params = bag(json!({"a": "1"}));
        assert!(evaluate("a == 1", &params));
        assert!(!evaluate("a === 1", &params));
        assert!(evaluate("a !== 1", &params));
        assert!(!evaluate("a != 1", &params));
    }

    #[test]
    fn ordering_operators() {
        let params = bag(json!({"age": 30, "min": 18, "name": "bob"}));
        assert!(evaluate("age > 18", &params));
        assert!(evaluate("age >= 30", &params));
        assert!(evaluate("age <= 30", &params));
        assert!(!evaluate("age < 30", &params));
        assert!(evaluate("min < age", &params));
        assert!(!evaluate("name > 1", &params));
        assert!(!evaluate("name <= 1", &params));
    }

    #[test]
    fn ordering_against_absent_is_false() {
        let empty = bag(json!({}));
        assert!(!evaluate("a >= b", &empty));
        assert!(!evaluate("a < 1", &empty));
        assert!(!evaluate("a > 1", &empty));
    }

    #[test]
    fn right_operand_may_be_a_path() {
        let params = bag(json!({"a": 3, "b": {"c": 3}}));
        assert!(evaluate("a === b.c", &params));
        let same = bag(json!({"list": [1]}));
        assert!(evaluate("list === list", &same));
    }

    #[test]
    fn radix_literals_beyond_u64() {
        let params = Value::map([("n", 18446744073709551616.0)]);
        assert!(evaluate("n >= 0x10000000000000000", &params));
        assert!(evaluate("n == 0x10000000000000000", &params));
        assert!(!evaluate("n > 0x10000000000000000", &params));
    }

    #[test]
    fn length_of_sequences() {
        assert!(evaluate("list.length > 0", &bag(json!({"list": [1]}))));
        assert!(!evaluate("list.length > 0", &bag(json!({"list": []}))));
    }

    #[test]
    fn malformed_and_unknown_are_false() {
        let params = bag(json!({"a": 1}));
        assert!(!evaluate("", &params));
        assert!(!evaluate("a", &params));
        assert!(!evaluate("a == 1 extra", &params));
        assert!(!evaluate("a = 1", &params));
        assert!(!evaluate("a <> 1", &params));
    }

    #[test]
    fn locals_shadow_bag_keys() {
        let params = bag(json!({"item": 1, "limit": 5}));
        let item = bag(json!({"id": 7}));
        let scope = Scope::new(&params).with_local("item", &item);
        assert!(scope.evaluate("item.id === 7"));
        assert!(scope.evaluate("limit === 5"));
        assert!(Scope::new(&params).evaluate("item === 1"));
    }
}
