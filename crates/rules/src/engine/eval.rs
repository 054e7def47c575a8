use augur_core::FactContext;
use serde_json::Value;

use crate::ir::condition::{Condition, Gender, GENDER_FIELD, scalar_key};

/// Evaluate a compiled condition against a fact context.
///
/// Pure and total: a predicate on a missing fact is `false`, except for the
/// wildcard which matches regardless. `All` and `Any` short-circuit.
#[must_use]
pub fn evaluate(condition: &Condition, facts: &FactContext) -> bool {
    match condition {
        Condition::Always | Condition::Wildcard { .. } => true,

        Condition::Eq { field, value } => {
            fact_matches(facts.get(field), |candidate| candidate == value)
        }

        Condition::In { field, values } => {
            fact_matches(facts.get(field), |candidate| values.contains(candidate))
        }

        Condition::Gender(expected) => fact_matches(facts.get(GENDER_FIELD), |candidate| {
            Gender::parse(candidate) == Some(*expected)
        }),

        Condition::All(children) => children.iter().all(|child| evaluate(child, facts)),

        Condition::Any(children) => children.iter().any(|child| evaluate(child, facts)),
    }
}

/// Apply `pred` to the fact's canonical string; a list fact matches when any
/// element does.
fn fact_matches(fact: Option<&Value>, pred: impl Fn(&str) -> bool) -> bool {
    match fact {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .any(|item| pred(&scalar_key(item))),
        Some(scalar) => pred(&scalar_key(scalar)),
    }
}
