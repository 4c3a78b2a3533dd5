//! Boundary between loosely typed catalog data and the packer.
//!
//! Product and package rows arrive as JSON straight from the shop database,
//! where ids may be numbers or strings and DECIMAL columns come back as
//! strings. Everything is parsed into [`Item`] and [`BoxType`] here, so the
//! packer only ever sees checked numbers.

use std::collections::HashSet;

use serde::Deserialize;
#[allow(unused_imports)]
use serde_json::json;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{InvalidInputError, Result};
use crate::model::{BoxType, Item};
use crate::types::validation::validate_measure;

/// Upper bound on units per request, for a single line and for the whole cart.
pub const MAX_UNITS: usize = 10_000;

/// A cart line as delivered by the cart collaborator.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "mug",
    "length_cm": 20.0,
    "width_cm": 10.0,
    "height_cm": 5.0,
    "weight_oz": "8.00",
    "ship_alone": false,
    "quantity": 2
}))]
pub struct LineItemInput {
    #[schema(value_type = String)]
    pub id: Option<Value>,
    #[schema(value_type = f64)]
    pub length_cm: Option<Value>,
    #[schema(value_type = f64)]
    pub width_cm: Option<Value>,
    #[schema(value_type = f64)]
    pub height_cm: Option<Value>,
    #[schema(value_type = f64)]
    pub weight_oz: Option<Value>,
    #[serde(default)]
    pub ship_alone: Option<bool>,
    /// Number of units, defaults to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl LineItemInput {
    /// Validates the line and expands it into one [`Item`] per unit.
    ///
    /// With a quantity above one, units are numbered `<id>#1`, `<id>#2`, ...
    /// so every unit stays distinguishable in the result.
    pub fn into_items(self, index: usize) -> Result<Vec<Item>> {
        let position = format!("line item #{}", index + 1);
        let id = read_id(self.id.as_ref(), &position)?;
        let subject = format!("line item '{}'", id);

        let length_cm = read_measure(self.length_cm.as_ref(), &subject, "length_cm")?;
        let width_cm = read_measure(self.width_cm.as_ref(), &subject, "width_cm")?;
        let height_cm = read_measure(self.height_cm.as_ref(), &subject, "height_cm")?;
        let weight_oz = read_measure(self.weight_oz.as_ref(), &subject, "weight_oz")?;
        let ship_alone = self.ship_alone.unwrap_or(false);
        let quantity = self.quantity.unwrap_or(1);
        if quantity as usize > MAX_UNITS {
            return Err(InvalidInputError::QuantityTooLarge {
                subject,
                quantity: quantity as usize,
                max: MAX_UNITS,
            });
        }

        let unit = |unit_id: String| Item {
            id: unit_id,
            length_cm,
            width_cm,
            height_cm,
            weight_oz,
            ship_alone,
        };

        Ok(match quantity {
            0 => Vec::new(),
            1 => vec![unit(id)],
            n => (1..=n).map(|k| unit(format!("{}#{}", id, k))).collect(),
        })
    }
}

/// A package definition from the tenant's catalog.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "label": "Small box",
    "length_cm": 30.0,
    "width_cm": 20.0,
    "height_cm": 10.0,
    "weight_oz": 4.0,
    "max_weight_oz": 320.0,
    "carrier_code": "package"
}))]
pub struct BoxTypeInput {
    #[schema(value_type = String)]
    pub id: Option<Value>,
    pub label: Option<String>,
    #[schema(value_type = f64)]
    pub length_cm: Option<Value>,
    #[schema(value_type = f64)]
    pub width_cm: Option<Value>,
    #[schema(value_type = f64)]
    pub height_cm: Option<Value>,
    /// Tare weight of the empty box.
    #[schema(value_type = f64)]
    pub weight_oz: Option<Value>,
    #[schema(value_type = f64, nullable)]
    pub max_weight_oz: Option<Value>,
    pub carrier_code: Option<String>,
}

impl BoxTypeInput {
    pub fn into_box_type(self, index: usize) -> Result<BoxType> {
        let position = format!("box type #{}", index + 1);
        let id = read_id(self.id.as_ref(), &position)?;
        let subject = format!("box type '{}'", id);

        let max_weight_oz = match self.max_weight_oz.as_ref() {
            None | Some(Value::Null) => None,
            raw => Some(read_measure(raw, &subject, "max_weight_oz")?),
        };

        Ok(BoxType {
            length_cm: read_measure(self.length_cm.as_ref(), &subject, "length_cm")?,
            width_cm: read_measure(self.width_cm.as_ref(), &subject, "width_cm")?,
            height_cm: read_measure(self.height_cm.as_ref(), &subject, "height_cm")?,
            weight_oz: read_measure(self.weight_oz.as_ref(), &subject, "weight_oz")?,
            max_weight_oz,
            label: self.label.filter(|label| !label.trim().is_empty()),
            carrier_code: self.carrier_code.filter(|code| !code.trim().is_empty()),
            id,
        })
    }
}

/// Parses and expands all cart lines. Stops at the first invalid line.
///
/// Unit ids must be unique across the cart, and the cart may hold at most
/// [`MAX_UNITS`] units.
pub fn parse_line_items(lines: Vec<LineItemInput>) -> Result<Vec<Item>> {
    let mut items = Vec::with_capacity(lines.len());
    let mut seen = HashSet::new();
    for (index, line) in lines.into_iter().enumerate() {
        let units = line.into_items(index)?;
        if items.len() + units.len() > MAX_UNITS {
            return Err(InvalidInputError::QuantityTooLarge {
                subject: "cart".to_string(),
                quantity: items.len() + units.len(),
                max: MAX_UNITS,
            });
        }
        for unit in &units {
            if !seen.insert(unit.id.clone()) {
                return Err(InvalidInputError::DuplicateId {
                    subject: format!("line item #{}", index + 1),
                    value: unit.id.clone(),
                });
            }
        }
        items.extend(units);
    }
    Ok(items)
}

/// Parses the box catalog. Stops at the first invalid entry.
pub fn parse_box_types(entries: Vec<BoxTypeInput>) -> Result<Vec<BoxType>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.into_box_type(index))
        .collect()
}

fn read_id(raw: Option<&Value>, subject: &str) -> Result<String> {
    match raw {
        None | Some(Value::Null) => Err(InvalidInputError::MissingField {
            subject: subject.to_string(),
            field: "id",
        }),
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(Value::Number(number)) if number.is_i64() || number.is_u64() => {
            Ok(number.to_string())
        }
        Some(other) => Err(InvalidInputError::InvalidId {
            subject: subject.to_string(),
            value: other.to_string(),
        }),
    }
}

fn read_measure(raw: Option<&Value>, subject: &str, field: &'static str) -> Result<f64> {
    let value = match raw {
        None | Some(Value::Null) => {
            return Err(InvalidInputError::MissingField {
                subject: subject.to_string(),
                field,
            });
        }
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(value) => validate_measure(value, subject, field),
        None => Err(InvalidInputError::NotNumeric {
            subject: subject.to_string(),
            field,
            value: raw.map(Value::to_string).unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(value: Value) -> LineItemInput {
        serde_json::from_value(value).expect("line item JSON should deserialize")
    }

    fn box_input(value: Value) -> BoxTypeInput {
        serde_json::from_value(value).expect("box type JSON should deserialize")
    }

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let items = line(json!({
            "id": 42,
            "length_cm": 20,
            "width_cm": "10.5",
            "height_cm": 5.0,
            "weight_oz": " 8 "
        }))
        .into_items(0)
        .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "42");
        assert_eq!(items[0].width_cm, 10.5);
        assert_eq!(items[0].weight_oz, 8.0);
        assert!(!items[0].ship_alone);
    }

    #[test]
    fn expands_quantity_into_numbered_units() {
        let items = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1,
            "ship_alone": true,
            "quantity": 3
        }))
        .into_items(0)
        .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["mug#1", "mug#2", "mug#3"]);
        assert!(items.iter().all(|i| i.ship_alone));
    }

    #[test]
    fn zero_quantity_yields_no_units() {
        let items = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1,
            "quantity": 0
        }))
        .into_items(0)
        .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn missing_weight_is_reported() {
        let err = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": 1
        }))
        .into_items(0)
        .unwrap_err();

        assert_eq!(
            err,
            InvalidInputError::MissingField {
                subject: "line item 'mug'".to_string(),
                field: "weight_oz",
            }
        );
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": "tall", "weight_oz": 1
        }))
        .into_items(0)
        .unwrap_err();
        assert_eq!(err.code(), "not_numeric");
        assert_eq!(err.field(), "height_cm");

        let err = line(json!({
            "id": "mug",
            "length_cm": [1], "width_cm": 1, "height_cm": 1, "weight_oz": 1
        }))
        .into_items(0)
        .unwrap_err();
        assert_eq!(err.code(), "not_numeric");
    }

    #[test]
    fn non_finite_and_negative_strings_are_rejected() {
        let err = line(json!({
            "id": "mug",
            "length_cm": "inf", "width_cm": 1, "height_cm": 1, "weight_oz": 1
        }))
        .into_items(0)
        .unwrap_err();
        assert_eq!(err.code(), "non_finite");

        let err = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": -2
        }))
        .into_items(0)
        .unwrap_err();
        assert_eq!(err.code(), "negative_value");
    }

    #[test]
    fn missing_id_uses_position_in_message() {
        let err = line(json!({
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1
        }))
        .into_items(4)
        .unwrap_err();
        assert!(err.to_string().starts_with("line item #5"));

        let err = line(json!({
            "id": 1.5,
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1
        }))
        .into_items(0)
        .unwrap_err();
        assert_eq!(err.code(), "invalid_id");
    }

    #[test]
    fn parses_box_type_with_optional_fields() {
        let box_type = box_input(json!({
            "id": "small",
            "label": "  ",
            "length_cm": "30.00",
            "width_cm": 20,
            "height_cm": 10,
            "weight_oz": 4,
            "max_weight_oz": null,
            "carrier_code": "package"
        }))
        .into_box_type(0)
        .unwrap();

        assert_eq!(box_type.id, "small");
        assert_eq!(box_type.label, None);
        assert_eq!(box_type.length_cm, 30.0);
        assert_eq!(box_type.max_weight_oz, None);
        assert_eq!(box_type.carrier_code.as_deref(), Some("package"));
    }

    #[test]
    fn box_type_max_weight_must_be_numeric() {
        let err = box_input(json!({
            "id": "small",
            "length_cm": 30, "width_cm": 20, "height_cm": 10, "weight_oz": 4,
            "max_weight_oz": "heavy"
        }))
        .into_box_type(0)
        .unwrap_err();
        assert_eq!(err.field(), "max_weight_oz");
    }

    #[test]
    fn parse_line_items_stops_at_first_invalid_line() {
        let lines = vec![
            line(json!({"id": "a", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1, "quantity": 2})),
            line(json!({"id": "b", "length_cm": 1, "width_cm": 1, "height_cm": 1})),
        ];
        let err = parse_line_items(lines).unwrap_err();
        assert!(err.to_string().contains("line item 'b'"));
    }

    #[test]
    fn oversized_quantity_is_rejected_before_expansion() {
        let err = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1,
            "quantity": 4294967295u32
        }))
        .into_items(0)
        .unwrap_err();
        assert_eq!(err.code(), "quantity_too_large");
        assert_eq!(err.field(), "quantity");

        let at_limit = line(json!({
            "id": "mug",
            "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1,
            "quantity": MAX_UNITS
        }))
        .into_items(0)
        .unwrap();
        assert_eq!(at_limit.len(), MAX_UNITS);
    }

    #[test]
    fn cart_total_is_capped() {
        let half = MAX_UNITS / 2 + 1;
        let lines = vec![
            line(json!({"id": "a", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1, "quantity": half})),
            line(json!({"id": "b", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1, "quantity": half})),
        ];
        let err = parse_line_items(lines).unwrap_err();
        assert!(matches!(
            err,
            InvalidInputError::QuantityTooLarge { ref subject, quantity, max }
                if subject == "cart" && quantity == 2 * half && max == MAX_UNITS
        ));
    }

    #[test]
    fn duplicate_unit_ids_are_rejected() {
        let lines = vec![
            line(json!({"id": "mug", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1, "quantity": 2})),
            line(json!({"id": "mug#1", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1})),
        ];
        let err = parse_line_items(lines).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::DuplicateId {
                subject: "line item #2".to_string(),
                value: "mug#1".to_string(),
            }
        );

        let lines = vec![
            line(json!({"id": 7, "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1})),
            line(json!({"id": "7", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1})),
        ];
        assert_eq!(parse_line_items(lines).unwrap_err().code(), "duplicate_id");
    }

    #[test]
    fn parse_box_types_keeps_catalog_order() {
        let boxes = parse_box_types(vec![
            box_input(json!({"id": "b", "length_cm": 2, "width_cm": 2, "height_cm": 2, "weight_oz": 1})),
            box_input(json!({"id": "a", "length_cm": 1, "width_cm": 1, "height_cm": 1, "weight_oz": 1})),
        ])
        .unwrap();
        let ids: Vec<_> = boxes.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
