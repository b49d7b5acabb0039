//! Property comparisons, conditional style values and filters.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Feature properties as loaded from GeoJSON.
pub type Properties = Map<String, Value>;

static NULL: Value = Value::Null;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    /// String prefix match, spelled `_w`.
    StartsWith,
}

impl Op {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            "_w" => Self::StartsWith,
            _ => return None,
        })
    }

    /// Compare a feature property against a literal.
    #[must_use]
    pub fn test(self, property: Option<&Value>, target: &Value) -> bool {
        match self {
            Self::Eq => property.is_some_and(|p| loosely_equal(p, target)),
            Self::Ne => !property.is_some_and(|p| loosely_equal(p, target)),
            Self::Gt => order(property, target) == Some(Ordering::Greater),
            Self::Lt => order(property, target) == Some(Ordering::Less),
            Self::Ge => matches!(order(property, target), Some(Ordering::Greater | Ordering::Equal)),
            Self::Le => matches!(order(property, target), Some(Ordering::Less | Ordering::Equal)),
            Self::StartsWith => match (property, target) {
                (Some(Value::String(p)), Value::String(t)) => p.starts_with(t.as_str()),
                _ => false,
            },
        }
    }
}

/// Equality that treats `1` and `1.0` alike.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn order(property: Option<&Value>, target: &Value) -> Option<Ordering> {
    match (property?, target) {
        (Value::String(p), Value::String(t)) => Some(p.as_str().cmp(t.as_str())),
        (p, t) => p.as_f64()?.partial_cmp(&t.as_f64()?),
    }
}

/// JavaScript-style truthiness, used to skip empty lookup results.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A literal, or `[default, [key, op, value, result], ...]` picking the
/// first matching result.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StyleValue(pub Value);

impl StyleValue {
    #[must_use]
    pub fn resolve<'a>(&'a self, properties: &Properties) -> &'a Value {
        let Value::Array(items) = &self.0 else {
            return &self.0;
        };
        let Some((default, cases)) = items.split_first() else {
            return &NULL;
        };
        cases
            .iter()
            .filter_map(|case| match case.as_array().map(Vec::as_slice) {
                Some([Value::String(key), Value::String(op), target, result]) => Op::parse(op)
                    .filter(|op| op.test(properties.get(key), target))
                    .map(|_| result),
                _ => None,
            })
            .find(|result| truthy(result))
            .unwrap_or(default)
    }

    #[must_use]
    pub fn as_str<'a>(&'a self, properties: &Properties) -> Option<&'a str> {
        self.resolve(properties).as_str()
    }

    /// Numbers, or strings holding one.
    #[must_use]
    pub fn as_f64(&self, properties: &Properties) -> Option<f64> {
        match self.resolve(properties) {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches("px").parse().ok(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub key: String,
    pub op: Op,
    pub value: Value,
}

impl Comparison {
    fn from_value(value: &Value) -> Option<Self> {
        match value.as_array().map(Vec::as_slice) {
            Some([Value::String(key), Value::String(op), target]) => Some(Self {
                key: key.clone(),
                op: Op::parse(op)?,
                value: target.clone(),
            }),
            _ => None,
        }
    }
}

/// Rows of comparisons: a feature passes when every comparison of any row
/// holds. Malformed comparisons never hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub rows: Vec<Vec<Option<Comparison>>>,
}

impl Filter {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let rows = match value {
            Value::Array(rows) => rows
                .iter()
                .map(|row| {
                    row.as_array()
                        .map(|comps| comps.iter().map(Comparison::from_value).collect())
                        .unwrap_or_default()
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { rows }
    }

    /// Features without properties pass any filter.
    #[must_use]
    pub fn matches(&self, properties: &Properties) -> bool {
        if self.rows.is_empty() || properties.is_empty() {
            return true;
        }
        self.rows.iter().any(|row| {
            row.iter().all(|comp| {
                comp.as_ref()
                    .is_some_and(|c| c.op.test(properties.get(&c.key), &c.value))
            })
        })
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Self::from_value(&v))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_ops() {
        let p = props(json!({"kind": "highway", "lanes": 4, "name": "A12"}));
        assert!(Op::Eq.test(p.get("kind"), &json!("highway")));
        assert!(Op::Ne.test(p.get("kind"), &json!("local")));
        assert!(Op::Ne.test(p.get("missing"), &json!("local")));
        assert!(Op::Gt.test(p.get("lanes"), &json!(2)));
        assert!(Op::Ge.test(p.get("lanes"), &json!(4.0)));
        assert!(!Op::Lt.test(p.get("lanes"), &json!("x")), "mixed types never order");
        assert!(Op::StartsWith.test(p.get("name"), &json!("A1")));
        assert!(!Op::StartsWith.test(p.get("lanes"), &json!("4")));
    }

    #[test]
    fn test_conditional_value_picks_first_match() {
        let value = StyleValue(json!(["#333333", ["kind", "=", "river", "#0000ff"], ["kind", "_w", "high", "#ff0000"]]));
        assert_eq!(value.as_str(&props(json!({"kind": "highway"}))), Some("#ff0000"));
        assert_eq!(value.as_str(&props(json!({"kind": "river"}))), Some("#0000ff"));
        assert_eq!(value.as_str(&props(json!({"kind": "path"}))), Some("#333333"));
    }

    #[test]
    fn test_malformed_cases_fall_back_to_default() {
        let value = StyleValue(json!([2, ["kind", "="], ["kind", "=", "a", 0]]));
        assert_eq!(value.as_f64(&props(json!({"kind": "a"}))), Some(2.0), "falsy results are skipped");
        assert_eq!(StyleValue(json!(3)).as_f64(&Properties::new()), Some(3.0));
        assert_eq!(StyleValue(json!("12px")).as_f64(&Properties::new()), Some(12.0));
    }

    #[test]
    fn test_filter_or_of_ands() {
        let filter = Filter::from_value(&json!([
            [["kind", "=", "highway"], ["lanes", ">", 2]],
            [["name", "=", "Main"]]
        ]));
        assert!(filter.matches(&props(json!({"kind": "highway", "lanes": 3}))));
        assert!(!filter.matches(&props(json!({"kind": "highway", "lanes": 1}))));
        assert!(filter.matches(&props(json!({"name": "Main"}))));
        assert!(filter.matches(&Properties::new()), "no properties, no filtering");
    }

    #[test]
    fn test_malformed_comparison_fails_row() {
        let filter = Filter::from_value(&json!([[["kind", "highway"]]]));
        assert!(!filter.matches(&props(json!({"kind": "highway"}))));
        assert!(Filter::from_value(&json!("nonsense")).matches(&props(json!({"a": 1}))));
    }
}
