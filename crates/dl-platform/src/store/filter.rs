//! In-process evaluation of MongoDB filter and sort documents.
//!
//! Supported: field equality (with array containment), dotted paths,
//! `$eq`, `$ne`, `$in`, `$nin`, `$gt`, `$gte`, `$lt`, `$lte`, `$exists`,
//! `$regex` (with `$options: "i"`), `$and` and `$or`.

use std::cmp::Ordering;

use bson::{Bson, Document};
use regex::RegexBuilder;
use tracing::warn;

/// Resolve a dotted path (`address.city`) inside a document.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = doc.get(first)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Whether `doc` satisfies `filter`.
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => sub_filters(condition).iter().all(|f| matches(doc, f)),
        "$or" => sub_filters(condition).iter().any(|f| matches(doc, f)),
        field => matches_field(get_path(doc, field), condition),
    })
}

fn sub_filters(condition: &Bson) -> Vec<Document> {
    match condition {
        Bson::Array(items) => items
            .iter()
            .filter_map(|item| item.as_document().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_operator_document(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(d) if !d.is_empty() && d.keys().all(|k| k.starts_with('$')) => Some(d),
        _ => None,
    }
}

fn matches_field(value: Option<&Bson>, condition: &Bson) -> bool {
    if let Some(ops) = is_operator_document(condition) {
        return ops.iter().all(|(op, operand)| apply_operator(value, op, operand, ops));
    }
    if let Bson::RegularExpression(re) = condition {
        return regex_matches(value, &re.pattern, &re.options);
    }
    equals(value, condition)
}

fn apply_operator(value: Option<&Bson>, op: &str, operand: &Bson, all: &Document) -> bool {
    match op {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$in" => match operand {
            Bson::Array(options) => options.iter().any(|o| equals(value, o)),
            _ => false,
        },
        "$nin" => match operand {
            Bson::Array(options) => !options.iter().any(|o| equals(value, o)),
            _ => true,
        },
        "$gt" => compare_with(value, operand, |o| o == Ordering::Greater),
        "$gte" => compare_with(value, operand, |o| o != Ordering::Less),
        "$lt" => compare_with(value, operand, |o| o == Ordering::Less),
        "$lte" => compare_with(value, operand, |o| o != Ordering::Greater),
        "$exists" => {
            let wanted = operand.as_bool().unwrap_or(true);
            value.is_some() == wanted
        }
        "$regex" => {
            let options = all.get_str("$options").unwrap_or("");
            match operand {
                Bson::String(pattern) => regex_matches(value, pattern, options),
                Bson::RegularExpression(re) => {
                    let opts = if options.is_empty() { re.options.as_str() } else { options };
                    regex_matches(value, &re.pattern, opts)
                }
                _ => false,
            }
        }
        "$options" => true,
        other => {
            warn!(operator = other, "Unsupported filter operator in memory store");
            false
        }
    }
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) => {
            if let Bson::Array(_) = expected {
                if value == Some(expected) {
                    return true;
                }
            }
            items.iter().any(|item| scalar_equals(item, expected))
        }
        Some(v) => scalar_equals(v, expected),
    }
}

fn scalar_equals(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn compare_with(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| compare_bson(item, operand).map(&accept).unwrap_or(false)),
        Some(v) => compare_bson(v, operand).map(accept).unwrap_or(false),
        None => false,
    }
}

/// Order two values of comparable types; `None` when the types differ.
pub fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn regex_matches(value: Option<&Bson>, pattern: &str, options: &str) -> bool {
    let regex = match RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            warn!(pattern, error = %e, "Invalid regex in filter");
            return false;
        }
    };
    match value {
        Some(Bson::String(s)) => regex.is_match(s),
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| item.as_str().map(|s| regex.is_match(s)).unwrap_or(false)),
        _ => false,
    }
}

/// Sort documents in place by a Mongo sort spec (`1` ascending, `-1` descending).
/// Missing fields sort first.
pub fn sort_documents(docs: &mut [Document], sort: &Document) {
    docs.sort_by(|a, b| {
        for (field, direction) in sort.iter() {
            let descending = as_number(direction).map(|d| d < 0.0).unwrap_or(false);
            let ordering = match (get_path(a, field), get_path(b, field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => compare_bson(x, y).unwrap_or(Ordering::Equal),
            };
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn vehicle() -> Document {
        doc! {
            "_id": "V1",
            "make": "Toyota",
            "model": "Corolla",
            "year": 2022,
            "priceCents": 2_150_000_i64,
            "status": "AVAILABLE",
            "features": ["sunroof", "heated seats"],
            "location": { "lot": "north", "row": 3 },
        }
    }

    #[test]
    fn test_equality_and_dotted_path() {
        let v = vehicle();
        assert!(matches(&v, &doc! { "make": "Toyota" }));
        assert!(!matches(&v, &doc! { "make": "Honda" }));
        assert!(matches(&v, &doc! { "location.lot": "north" }));
        assert!(matches(&v, &doc! { "features": "sunroof" }));
        assert!(matches(&v, &doc! { "missing": Bson::Null }));
        assert!(matches(&v, &doc! {}));
    }

    #[test]
    fn test_numeric_comparisons_across_types() {
        let v = vehicle();
        assert!(matches(&v, &doc! { "year": { "$gte": 2020_i64, "$lte": 2023.0 } }));
        assert!(!matches(&v, &doc! { "year": { "$gt": 2022 } }));
        assert!(matches(&v, &doc! { "priceCents": { "$lt": 3_000_000 } }));
        assert!(matches(&v, &doc! { "year": 2022_i64 }));
    }

    #[test]
    fn test_set_operators_and_exists() {
        let v = vehicle();
        assert!(matches(&v, &doc! { "status": { "$in": ["AVAILABLE", "IN_SERVICE"] } }));
        assert!(!matches(&v, &doc! { "status": { "$nin": ["AVAILABLE"] } }));
        assert!(matches(&v, &doc! { "status": { "$ne": "SOLD" } }));
        assert!(matches(&v, &doc! { "reservedByOrderId": { "$exists": false } }));
        assert!(!matches(&v, &doc! { "make": { "$exists": false } }));
    }

    #[test]
    fn test_regex_and_logical_operators() {
        let v = vehicle();
        assert!(matches(&v, &doc! { "model": { "$regex": "^coro", "$options": "i" } }));
        assert!(!matches(&v, &doc! { "model": { "$regex": "^coro" } }));
        assert!(matches(&v, &doc! {
            "$or": [ { "make": "Honda" }, { "model": { "$regex": "roll" } } ]
        }));
        assert!(!matches(&v, &doc! {
            "$and": [ { "make": "Toyota" }, { "year": { "$lt": 2000 } } ]
        }));
    }

    #[test]
    fn test_datetime_comparison() {
        let now = bson::DateTime::now();
        let earlier = bson::DateTime::from_millis(now.timestamp_millis() - 1000);
        let d = doc! { "startAt": now };
        assert!(matches(&d, &doc! { "startAt": { "$gt": earlier } }));
        assert!(!matches(&d, &doc! { "startAt": { "$lt": earlier } }));
    }

    #[test]
    fn test_sort_documents() {
        let mut docs = vec![
            doc! { "n": 2, "s": "b" },
            doc! { "n": 1, "s": "z" },
            doc! { "n": 2, "s": "a" },
        ];
        sort_documents(&mut docs, &doc! { "n": -1, "s": 1 });
        let order: Vec<&str> = docs.iter().map(|d| d.get_str("s").unwrap()).collect();
        assert_eq!(order, vec!["a", "b", "z"]);
    }
}
