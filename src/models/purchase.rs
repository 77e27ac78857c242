//! Vehicle purchases (inventory intake).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::vehicle::{Vehicle, VehicleInput};
use crate::normalize::{de, round2, Fields, FromUpstream, NormalizeError};
use crate::validation::{FieldError, FieldErrors, ValidationContext};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub vehicle_id: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub seller_name: String,
    pub seller_phone: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: f64,
    /// Refurbishment and paperwork costs on top of the price.
    pub expenses: f64,
    pub notes: Option<String>,
    pub documents: Vec<String>,
}

impl Purchase {
    pub fn total_cost(&self) -> f64 {
        round2(self.purchase_price + self.expenses)
    }
}

/// Expenses arrive as a number or as a list of `{amount}` line items.
fn expenses(r: &Fields<'_>) -> f64 {
    const NAMES: &[&str] = &["other_expenses", "expense", "total_expenses", "refurbishment_cost"];
    let lines = r.objects("expenses", NAMES);
    if !lines.is_empty() {
        return round2(lines.iter().filter_map(|l| l.f64("amount", &["cost", "value"])).sum());
    }
    r.f64("expenses", NAMES).unwrap_or(0.0)
}

impl FromUpstream for Purchase {
    const ENTITY: &'static str = "purchase";

    fn from_upstream(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        let vehicle = match r.object("vehicle", &["vehicle_details", "car"]) {
            Some(v) => match Vehicle::from_upstream(&v) {
                Ok(vehicle) => Some(vehicle),
                Err(e) => {
                    tracing::debug!(error = %e, "Purchase carries an unusable vehicle record");
                    None
                }
            },
            None => None,
        };
        let vehicle_id = r
            .string("vehicle_id", &[])
            .or_else(|| vehicle.as_ref().map(|v| v.id.clone()));

        Ok(Self {
            id: r.id(&["purchase_id"])?,
            vehicle_id,
            vehicle,
            seller_name: r.require_string(
                "seller_name",
                &["seller", "vendor_name", "supplier_name", "purchased_from"],
            )?,
            seller_phone: r.string("seller_phone", &["seller_mobile", "seller_contact", "vendor_phone"]),
            purchase_date: r.string("purchase_date", &["date", "purchased_on"]),
            purchase_price: r
                .f64("purchase_price", &["price", "amount", "cost_price", "buying_price"])
                .unwrap_or(0.0),
            expenses: expenses(r),
            notes: r.string("notes", &["remarks", "description"]),
            documents: r.list("documents", &["document_urls", "files", "attachments"]),
        })
    }
}

/// Purchase create/update form; carries the vehicle being bought.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub seller_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub seller_phone: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub purchase_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub purchase_price: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub expenses: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub vehicle: Option<VehicleInput>,
}

impl PurchaseInput {
    pub fn into_upstream(self, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let seller_name = errors.required_text("sellerName", self.seller_name.as_deref());
        let seller_phone = errors.optional_phone("sellerPhone", self.seller_phone.as_deref(), ctx);
        let purchase_date = errors
            .optional_date("purchaseDate", self.purchase_date.as_deref())
            .map(|d| d.format("%Y-%m-%d").to_string());
        let purchase_price = errors.required_amount("purchasePrice", self.purchase_price, false);
        let expenses = match self.expenses {
            Some(e) if e < 0.0 => {
                errors.push("expenses", "must not be negative");
                0.0
            }
            Some(e) => e,
            None => 0.0,
        };
        let vehicle = match self.vehicle {
            Some(v) => v.validate_into("vehicle.", &mut errors),
            None => {
                errors.push("vehicle", "is required");
                Value::Null
            }
        };

        errors.finish(json!({
            "sellerName": seller_name,
            "sellerPhone": seller_phone,
            "purchaseDate": purchase_date,
            "purchasePrice": purchase_price,
            "expenses": expenses,
            "notes": FieldErrors::optional_text(self.notes.as_deref()),
            "documents": self.documents,
            "vehicle": vehicle,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_one;

    #[test]
    fn test_embedded_vehicle_and_expense_lines() {
        let p: Purchase = normalize_one(&json!({
            "data": {
                "PurchaseId": 11,
                "Vendor_Name": "Sharma Motors",
                "PurchasePrice": "3,00,000",
                "Expenses": [{"Description": "Paint", "Amount": 12000}, {"amount": "3500.5"}],
                "Vehicle": {"Id": 91, "Make": "Maruti", "Model": "Baleno"}
            }
        }))
        .unwrap();
        assert_eq!(p.id, "11");
        assert_eq!(p.seller_name, "Sharma Motors");
        assert_eq!(p.vehicle_id.as_deref(), Some("91"));
        assert_eq!(p.expenses, 15500.5);
        assert_eq!(p.total_cost(), 315500.5);
    }

    #[test]
    fn test_scalar_expenses() {
        let p: Purchase = normalize_one(&json!({"id": 1, "seller": "Anil", "otherExpenses": 250})).unwrap();
        assert_eq!(p.expenses, 250.0);
        assert!(p.vehicle.is_none());
    }

    #[test]
    fn test_input_requires_vehicle() {
        let input = PurchaseInput {
            seller_name: Some("Anil".into()),
            purchase_price: Some(200000.0),
            ..Default::default()
        };
        let errors = input.into_upstream(&ValidationContext::default()).unwrap_err();
        assert_eq!(errors[0].field, "vehicle");
    }

    #[test]
    fn test_nested_vehicle_error_paths() {
        let input = PurchaseInput {
            seller_name: Some("Anil".into()),
            purchase_price: Some(200000.0),
            purchase_date: Some("2024-05-01".into()),
            vehicle: Some(VehicleInput { make: Some("Kia".into()), ..Default::default() }),
            ..Default::default()
        };
        let errors = input.into_upstream(&ValidationContext::default()).unwrap_err();
        assert_eq!(errors[0].field, "vehicle.model");
    }
}
