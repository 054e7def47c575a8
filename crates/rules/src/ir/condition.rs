use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::RuleError;

/// The sentinel value meaning "any value of this field".
pub const WILDCARD: &str = "*";

/// Fact name that is interpreted as a gender filter rather than plain equality.
pub const GENDER_FIELD: &str = "gender";

/// Normalized subject gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse the spellings used by fact producers (`male`, `m`, `男`, ...).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "man" | "男" | "乾" => Some(Self::Male),
            "female" | "f" | "woman" | "女" | "坤" => Some(Self::Female),
            _ => None,
        }
    }

    /// Canonical lowercase spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Compiled condition tree.
///
/// Built once per index generation from the stored JSON so that matching never
/// re-inspects raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Matches every fact context (empty condition object).
    Always,
    /// `{"field": "*"}`: any value of the field, including absence.
    Wildcard { field: String },
    /// Scalar equality, compared by canonical string form.
    Eq { field: String, value: String },
    /// Membership in an enumerated set.
    In {
        field: String,
        values: BTreeSet<String>,
    },
    /// Gender filter with spelling normalization.
    Gender(Gender),
    /// Logical AND over children.
    All(Vec<Condition>),
    /// Logical OR over children.
    Any(Vec<Condition>),
}

impl Condition {
    /// Compile a JSON condition tree.
    ///
    /// Accepted node shapes:
    ///
    /// - `{}`: always true
    /// - `{"all": [..]}` / `{"any": [..]}`: combinators (must be the only key)
    /// - `{"field": "x", "eq": v}` / `{"field": "x", "in": [..]}`: explicit leaves
    /// - `{"x": "*"}`, `{"x": v}`, `{"x": [v1, v2]}`: shorthand leaves; several
    ///   keys in one object combine with AND
    pub fn compile(value: &Value) -> Result<Self, RuleError> {
        compile_node(value, "$")
    }

    /// Number of nodes in the tree, used for diagnostics.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::All(children) | Self::Any(children) => {
                1 + children.iter().map(Self::node_count).sum::<usize>()
            }
            _ => 1,
        }
    }
}

fn compile_node(value: &Value, path: &str) -> Result<Condition, RuleError> {
    let Value::Object(map) = value else {
        return Err(RuleError::malformed(
            path,
            format!("unknown node kind: {}", json_kind(value)),
        ));
    };

    if map.is_empty() {
        return Ok(Condition::Always);
    }

    for combinator in ["all", "any"] {
        if let Some(children) = map.get(combinator) {
            if map.len() != 1 {
                return Err(RuleError::malformed(
                    path,
                    format!("'{combinator}' must be the only key of its node"),
                ));
            }
            return compile_combinator(combinator, children, path);
        }
    }

    if map.contains_key("field") {
        return compile_explicit_leaf(map, path);
    }

    let mut leaves = Vec::with_capacity(map.len());
    for (field, raw) in map {
        leaves.push(compile_leaf(field, raw, &format!("{path}.{field}"))?);
    }
    if leaves.len() == 1 {
        Ok(leaves.remove(0))
    } else {
        Ok(Condition::All(leaves))
    }
}

fn compile_combinator(kind: &str, children: &Value, path: &str) -> Result<Condition, RuleError> {
    let Value::Array(items) = children else {
        return Err(RuleError::malformed(
            path,
            format!("'{kind}' expects an array, got {}", json_kind(children)),
        ));
    };

    let compiled = items
        .iter()
        .enumerate()
        .map(|(i, child)| compile_node(child, &format!("{path}.{kind}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if kind == "all" {
        Condition::All(compiled)
    } else {
        Condition::Any(compiled)
    })
}

fn compile_explicit_leaf(map: &Map<String, Value>, path: &str) -> Result<Condition, RuleError> {
    let field = match map.get("field") {
        Some(Value::String(f)) => f.as_str(),
        Some(other) => {
            return Err(RuleError::malformed(
                path,
                format!("'field' must be a string, got {}", json_kind(other)),
            ));
        }
        None => unreachable!("caller checked for 'field'"),
    };

    match (map.get("eq"), map.get("in"), map.len()) {
        (Some(v), None, 2) => {
            if !is_scalar(v) {
                return Err(RuleError::malformed(path, "'eq' expects a scalar"));
            }
            compile_leaf(field, v, path)
        }
        (None, Some(v @ Value::Array(_)), 2) => compile_leaf(field, v, path),
        (None, Some(other), 2) => Err(RuleError::malformed(
            path,
            format!("'in' expects an array, got {}", json_kind(other)),
        )),
        _ => Err(RuleError::malformed(
            path,
            "explicit leaf needs 'field' plus exactly one of 'eq' or 'in'",
        )),
    }
}

fn compile_leaf(field: &str, raw: &Value, path: &str) -> Result<Condition, RuleError> {
    if field.trim().is_empty() {
        return Err(RuleError::malformed(path, "invalid field reference: empty name"));
    }

    match raw {
        Value::String(s) if s == WILDCARD => Ok(Condition::Wildcard {
            field: field.to_owned(),
        }),
        Value::Array(items) => {
            let mut values = BTreeSet::new();
            for item in items {
                if !is_scalar(item) {
                    return Err(RuleError::malformed(
                        path,
                        format!("set members must be scalars, got {}", json_kind(item)),
                    ));
                }
                if item.as_str() == Some(WILDCARD) {
                    return Ok(Condition::Wildcard {
                        field: field.to_owned(),
                    });
                }
                values.insert(scalar_key(item));
            }
            if field == GENDER_FIELD {
                let genders = values
                    .iter()
                    .map(|v| parse_gender(v, path).map(Condition::Gender))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Condition::Any(genders));
            }
            Ok(Condition::In {
                field: field.to_owned(),
                values,
            })
        }
        v if is_scalar(v) => {
            let value = scalar_key(v);
            if field == GENDER_FIELD {
                return parse_gender(&value, path).map(Condition::Gender);
            }
            Ok(Condition::Eq {
                field: field.to_owned(),
                value,
            })
        }
        other => Err(RuleError::malformed(
            path,
            format!("unknown node kind: {} under field '{field}'", json_kind(other)),
        )),
    }
}

fn parse_gender(raw: &str, path: &str) -> Result<Gender, RuleError> {
    Gender::parse(raw).ok_or_else(|| RuleError::malformed(path, format!("unknown gender '{raw}'")))
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Canonical string form used to compare scalars, so that `5` and `"5"` are equal.
pub(crate) fn scalar_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
