//! Alias lookup over upstream JSON objects.
//!
//! Upstream payloads spell the same field as `selling_price`, `sellingPrice`
//! or `SellingPrice` depending on the endpoint. Lookups try the exact
//! spellings first, then fall back to a case- and underscore-insensitive
//! comparison.

use serde_json::{Map, Value};

/// Spellings of a snake_case name: snake, camel, Pascal.
pub fn key_variants(canonical: &str) -> [String; 3] {
    let mut camel = String::with_capacity(canonical.len());
    let mut upper_next = false;
    for c in canonical.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            camel.extend(c.to_uppercase());
            upper_next = false;
        } else {
            camel.push(c);
        }
    }

    let mut pascal = String::with_capacity(camel.len());
    let mut chars = camel.chars();
    if let Some(first) = chars.next() {
        pascal.extend(first.to_uppercase());
        pascal.extend(chars);
    }

    [canonical.to_string(), camel, pascal]
}

fn fold(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// First present, non-null value among `keys` (exact match).
pub fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Look up `canonical` (snake_case) and its aliases in any casing.
pub fn field<'a>(
    obj: &'a Map<String, Value>,
    canonical: &str,
    aliases: &[&str],
) -> Option<&'a Value> {
    for name in std::iter::once(canonical).chain(aliases.iter().copied()) {
        for variant in key_variants(name) {
            if let Some(v) = obj.get(&variant).filter(|v| !v.is_null()) {
                return Some(v);
            }
        }
    }

    let wanted: Vec<String> = std::iter::once(canonical)
        .chain(aliases.iter().copied())
        .map(fold)
        .collect();
    wanted.iter().find_map(|w| {
        obj.iter()
            .find(|(k, v)| !v.is_null() && fold(k) == *w)
            .map(|(_, v)| v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_variants() {
        assert_eq!(
            key_variants("selling_price"),
            ["selling_price", "sellingPrice", "SellingPrice"]
        );
        assert_eq!(key_variants("id"), ["id", "id", "Id"]);
    }

    #[test]
    fn test_pick_skips_null() {
        let o = obj(json!({"name": null, "fullName": "Asha"}));
        assert_eq!(pick(&o, &["name", "fullName"]), Some(&json!("Asha")));
        assert_eq!(pick(&o, &["missing"]), None);
    }

    #[test]
    fn test_field_matches_any_casing() {
        let o = obj(json!({"SellingPrice": 120000}));
        assert_eq!(field(&o, "selling_price", &[]), Some(&json!(120000)));

        let o = obj(json!({"SELLING_PRICE": 5}));
        assert_eq!(field(&o, "selling_price", &[]), Some(&json!(5)));

        let o = obj(json!({"salePrice": 7}));
        assert_eq!(field(&o, "selling_price", &["sale_price"]), Some(&json!(7)));
    }

    #[test]
    fn test_canonical_wins_over_alias() {
        let o = obj(json!({"price": 1, "sellingPrice": 2}));
        assert_eq!(field(&o, "selling_price", &["price"]), Some(&json!(2)));
    }
}
