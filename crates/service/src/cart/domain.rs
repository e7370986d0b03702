use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::ServiceError;

/// One line of a cart: a JSON object keyed by opaque item id, each value
/// being a record with `name`, `description`, `quantity` and `price`.
///
/// The shape of the records is not enforced; any JSON object is accepted
/// and stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLineItem(Map<String, Value>);

impl CartLineItem {
    /// Accept a request body. Only JSON objects are line items.
    pub fn from_value(value: Value) -> Result<Self, ServiceError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ServiceError::Validation(format!(
                "line item must be a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Item ids with their typed view. Entries whose value is not an object
    /// are skipped.
    pub fn records(&self) -> impl Iterator<Item = (&str, LineItemRecord)> + '_ {
        self.0
            .iter()
            .filter_map(|(id, v)| LineItemRecord::from_value(v).map(|r| (id.as_str(), r)))
    }

    /// `quantity * price` summed over every record; unparseable records add 0.
    pub fn subtotal(&self) -> f64 {
        self.records().map(|(_, r)| r.amount()).sum()
    }
}

/// Typed view of a single record inside a line item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineItemRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

impl LineItemRecord {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            name: obj.get("name").and_then(Value::as_str).map(str::to_string),
            description: obj.get("description").and_then(Value::as_str).map(str::to_string),
            quantity: obj.get("quantity").and_then(parse_amount),
            price: obj.get("price").and_then(parse_amount),
        })
    }

    pub fn amount(&self) -> f64 {
        match (self.quantity, self.price) {
            (Some(q), Some(p)) => q * p,
            _ => 0.0,
        }
    }
}

/// Numbers are taken as-is, strings are trimmed and parsed. Non-finite
/// results count as unparseable.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Wire form of a total: always a float literal, so whole amounts keep
/// their `.0` (`20.0`, `404.5`, `0.0`).
pub fn format_total(total: f64) -> String {
    if total.is_finite() && total.fract() == 0.0 && total.abs() < 1e16 {
        format!("{total:.1}")
    } else {
        total.to_string()
    }
}

/// Ordered line items for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    pub fn new(items: Vec<CartLineItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: CartLineItem) {
        self.items.push(item);
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartLineItem::subtotal).sum()
    }

    /// Decode a stored blob.
    ///
    /// - an array is the canonical form; non-object elements are dropped
    /// - a bare object is a legacy single-item cart
    /// - `null` is a legacy empty write
    pub fn decode(raw: &str) -> Result<Self, ServiceError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ServiceError::Corrupt(e.to_string()))?;
        match value {
            Value::Array(values) => {
                let total = values.len();
                let items: Vec<CartLineItem> = values
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(CartLineItem(map)),
                        _ => None,
                    })
                    .collect();
                if items.len() != total {
                    warn!(dropped = total - items.len(), "dropped non-object cart entries");
                }
                Ok(Self { items })
            }
            Value::Object(map) => Ok(Self { items: vec![CartLineItem(map)] }),
            Value::Null => Ok(Self::default()),
            other => Err(ServiceError::Corrupt(format!(
                "expected a JSON array of line items, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Always the array form.
    pub fn encode(&self) -> Result<String, ServiceError> {
        serde_json::to_string(&self.items).map_err(|e| ServiceError::Corrupt(e.to_string()))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(v: Value) -> CartLineItem {
        CartLineItem::from_value(v).unwrap()
    }

    #[test]
    fn total_of_fixture_cart() {
        let cart = Cart::new(vec![
            item(json!({"749374692hs": {"name": "fitband", "quantity": 1, "price": 4.5}})),
            item(json!({"384797987238": {"name": "redpant", "quantity": 1, "price": 400}})),
        ]);
        assert_eq!(cart.total(), 404.5);
    }

    #[test]
    fn numeric_strings_count() {
        let cart = Cart::new(vec![item(json!({"x": {"quantity": " 2 ", "price": "10.25"}}))]);
        assert_eq!(cart.total(), 20.5);
    }

    #[test]
    fn non_numeric_values_contribute_zero() {
        let cart = Cart::new(vec![
            item(json!({"a": {"quantity": "two", "price": 10}})),
            item(json!({"b": {"quantity": 1, "price": null}})),
            item(json!({"c": {"name": "no amounts"}})),
            item(json!({"d": "not a record"})),
            item(json!({"e": {"quantity": "NaN", "price": 3}})),
            item(json!({"f": {"quantity": 3, "price": 2}})),
        ]);
        assert_eq!(cart.total(), 6.0);
    }

    #[test]
    fn negative_amounts_are_not_rejected() {
        let cart = Cart::new(vec![item(json!({"refund": {"quantity": -1, "price": 5}}))]);
        assert_eq!(cart.total(), -5.0);
    }

    #[test]
    fn totals_render_as_float_literals() {
        assert_eq!(format_total(20.0), "20.0");
        assert_eq!(format_total(404.5), "404.5");
        assert_eq!(format_total(0.0), "0.0");
        assert_eq!(format_total(-5.0), "-5.0");
        assert_eq!(format_total(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn records_expose_typed_fields() {
        let li = item(json!({"x": {"name": "shoe", "description": "left", "quantity": 2, "price": "10"}}));
        let (id, rec) = li.records().next().unwrap();
        assert_eq!(id, "x");
        assert_eq!(rec.name.as_deref(), Some("shoe"));
        assert_eq!(rec.description.as_deref(), Some("left"));
        assert_eq!(rec.amount(), 20.0);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        for v in [json!(null), json!([1, 2]), json!("shoe"), json!(3)] {
            assert!(matches!(CartLineItem::from_value(v), Err(ServiceError::Validation(_))));
        }
    }

    #[test]
    fn decode_keeps_order_and_encode_is_array() -> Result<(), ServiceError> {
        let raw = r#"[{"b":{"quantity":1,"price":1}},{"a":{"quantity":2,"price":2}}]"#;
        let cart = Cart::decode(raw)?;
        let ids: Vec<&str> = cart.items().iter().map(|li| li.records().next().unwrap().0).collect();
        assert_eq!(ids, vec!["b", "a"]);
        let again = Cart::decode(&cart.encode()?)?;
        assert_eq!(again, cart);
        assert!(cart.encode()?.starts_with('['));
        Ok(())
    }

    #[test]
    fn decode_normalizes_legacy_shapes() -> Result<(), ServiceError> {
        let single = Cart::decode(r#"{"x":{"name":"shoe","quantity":2,"price":10}}"#)?;
        assert_eq!(single.len(), 1);
        assert_eq!(single.total(), 20.0);

        assert!(Cart::decode("null")?.is_empty());

        let mixed = Cart::decode(r#"[null, {"x":{}}, 7]"#)?;
        assert_eq!(mixed.len(), 1);
        Ok(())
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(Cart::decode("not json"), Err(ServiceError::Corrupt(_))));
        assert!(matches!(Cart::decode("42"), Err(ServiceError::Corrupt(_))));
    }
}
