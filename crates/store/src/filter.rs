//! Predicate evaluation against schema-less rows.
//!
//! Deliberately the minimal conjunctive subset the query surface exposes:
//! equality and set membership. No disjunction, ranges, or negation.

use std::cmp::Ordering;

use serde_json::Value;

use crate::Record;

#[derive(Clone, Debug)]
pub enum Filter {
    /// field == value
    Eq(String, Value),
    /// field IN [values]
    In(String, Vec<Value>),
}

impl Filter {
    /// Evaluate against a row. Missing fields never match.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Eq(field, value) => record.get(field).map(|v| v == value).unwrap_or(false),
            Filter::In(field, values) => {
                record.get(field).map(|v| values.contains(v)).unwrap_or(false)
            }
        }
    }
}

/// Compare two JSON values for ordering. Mixed or non-comparable types
/// collate as equal.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a_f), Some(b_f)) = (a.as_f64(), b.as_f64()) {
                a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
            } else {
                Ordering::Equal
            }
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Record {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn eq_filter_matches_exact_value() {
        let r = row(json!({"status": "pending"}));
        assert!(Filter::Eq("status".into(), json!("pending")).matches(&r));
        assert!(!Filter::Eq("status".into(), json!("accepted")).matches(&r));
    }

    #[test]
    fn missing_field_never_matches() {
        let r = row(json!({"status": "pending"}));
        assert!(!Filter::Eq("service_type".into(), json!("plumber")).matches(&r));
        assert!(!Filter::In("service_type".into(), vec![json!("plumber")]).matches(&r));
    }

    #[test]
    fn in_filter_checks_membership() {
        let r = row(json!({"status": "accepted"}));
        let f = Filter::In("status".into(), vec![json!("pending"), json!("accepted")]);
        assert!(f.matches(&r));
        let f = Filter::In("status".into(), vec![json!("completed")]);
        assert!(!f.matches(&r));
    }

    #[test]
    fn value_ordering_covers_numbers_strings_bools() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(false)), Ordering::Greater);
        // mixed types collate equal rather than panicking
        assert_eq!(compare_values(&json!(1), &json!("a")), Ordering::Equal);
    }
}
