//! Grouping flat lists into lists of groups

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

static NULL: Value = Value::Null;

/// Group `items` by `key`, keeping groups in first-seen order.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&slot) => groups[slot].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

/// Group JSON objects by the value of `field`.
///
/// Objects without the field (and non-objects) share the `null` group. With
/// `sort` the groups are ordered by key: numbers numerically, strings
/// lexically, mixed kinds by their JSON text. Otherwise groups keep the order
/// in which their key first appeared.
pub fn group_by_field(list: &[Value], field: &str, sort: bool) -> Vec<Vec<Value>> {
    let mut groups = group_by(list.iter().cloned(), |item| {
        // JSON text is a stable hashable identity for any value
        item.get(field).cloned().unwrap_or(Value::Null).to_string()
    });

    if sort {
        groups.sort_by(|(_, a), (_, b)| compare_keys(field_of(a, field), field_of(b, field)));
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn field_of<'a>(group: &'a [Value], field: &str) -> &'a Value {
    group
        .first()
        .and_then(|item| item.get(field))
        .unwrap_or(&NULL)
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
