//! Manually composed bills (invoices not tied to a vehicle sale).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::normalize::{de, round2, Fields, FromUpstream, NormalizeError};
use crate::validation::{FieldError, FieldErrors, ValidationContext};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualBill {
    pub id: String,
    pub bill_number: Option<String>,
    pub bill_date: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<BillItem>,
    pub tax_percent: f64,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub notes: Option<String>,
}

/// Subtotal, tax and total for a set of items.
pub fn compute_totals(items: &[BillItem], tax_percent: f64) -> (f64, f64, f64) {
    let subtotal = round2(items.iter().map(|i| i.amount).sum());
    let tax = round2(subtotal * tax_percent / 100.0);
    (subtotal, tax, round2(subtotal + tax))
}

impl FromUpstream for ManualBill {
    const ENTITY: &'static str = "manual bill";

    fn from_upstream(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        let items: Vec<BillItem> = r
            .objects("items", &["bill_items", "line_items", "lines"])
            .iter()
            .map(|line| {
                let quantity = line.f64("quantity", &["qty"]).unwrap_or(1.0);
                let unit_price = line.f64("unit_price", &["rate", "price"]).unwrap_or(0.0);
                BillItem {
                    description: line
                        .string("description", &["item", "name", "particulars"])
                        .unwrap_or_default(),
                    quantity,
                    unit_price,
                    amount: line
                        .f64("amount", &["total", "line_total"])
                        .unwrap_or_else(|| round2(quantity * unit_price)),
                }
            })
            .collect();
        let tax_percent = r.f64("tax_percent", &["tax_rate", "gst_percent", "gst_rate"]).unwrap_or(0.0);
        let (subtotal, tax_amount, total) = compute_totals(&items, tax_percent);

        Ok(Self {
            id: r.id(&["bill_id", "manual_bill_id"])?,
            bill_number: r.string("bill_number", &["bill_no", "invoice_number", "invoice_no"]),
            bill_date: r.string("bill_date", &["date", "invoice_date"]),
            customer_name: r.require_string("customer_name", &["name", "billed_to"])?,
            customer_phone: r.string("customer_phone", &["phone", "mobile"]),
            customer_address: r.string("customer_address", &["address"]),
            tax_percent,
            subtotal: r.f64("subtotal", &["sub_total"]).unwrap_or(subtotal),
            tax_amount: r.f64("tax_amount", &["tax", "gst_amount"]).unwrap_or(tax_amount),
            total: r.f64("total", &["grand_total", "total_amount"]).unwrap_or(total),
            items,
            notes: r.string("notes", &["remarks"]),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItemInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub unit_price: Option<f64>,
}

/// Manual bill form. Totals are never trusted from the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualBillInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub bill_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub bill_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub customer_phone: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub items: Vec<BillItemInput>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub tax_percent: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManualBillDraft {
    pub bill_number: Option<String>,
    pub bill_date: NaiveDate,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<BillItem>,
    pub tax_percent: f64,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub notes: Option<String>,
}

impl ManualBillInput {
    pub fn validate(self, ctx: &ValidationContext) -> Result<ManualBillDraft, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let customer_name = errors.required_text("customerName", self.customer_name.as_deref());
        let customer_phone = errors.optional_phone("customerPhone", self.customer_phone.as_deref(), ctx);
        let bill_date = match errors.optional_date("billDate", self.bill_date.as_deref()) {
            Some(d) => d,
            None => {
                if FieldErrors::optional_text(self.bill_date.as_deref()).is_none() {
                    errors.push("billDate", "is required");
                }
                NaiveDate::default()
            }
        };

        let tax_percent = self.tax_percent.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&tax_percent) {
            errors.push("taxPercent", "must be between 0 and 100");
        }

        if self.items.is_empty() {
            errors.push("items", "at least one item is required");
        }
        let mut items = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            let description =
                errors.required_text(&format!("items[{i}].description"), item.description.as_deref());
            let quantity = errors.required_amount(&format!("items[{i}].quantity"), item.quantity, false);
            let unit_price = errors.required_amount(&format!("items[{i}].unitPrice"), item.unit_price, true);
            items.push(BillItem {
                description,
                quantity,
                unit_price: round2(unit_price),
                amount: round2(quantity * unit_price),
            });
        }

        let (subtotal, tax_amount, total) = compute_totals(&items, tax_percent);
        errors.finish(ManualBillDraft {
            bill_number: FieldErrors::optional_text(self.bill_number.as_deref()),
            bill_date,
            customer_name,
            customer_phone,
            customer_address: FieldErrors::optional_text(self.customer_address.as_deref()),
            items,
            tax_percent,
            subtotal,
            tax_amount,
            total,
            notes: FieldErrors::optional_text(self.notes.as_deref()),
        })
    }

    pub fn into_upstream(self, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        self.validate(ctx).map(|d| d.to_upstream())
    }
}

impl ManualBillDraft {
    pub fn to_upstream(&self) -> Value {
        json!({
            "billNumber": self.bill_number,
            "billDate": self.bill_date.format("%Y-%m-%d").to_string(),
            "customerName": self.customer_name,
            "customerPhone": self.customer_phone,
            "customerAddress": self.customer_address,
            "items": self.items,
            "taxPercent": self.tax_percent,
            "subtotal": self.subtotal,
            "taxAmount": self.tax_amount,
            "total": self.total,
            "notes": self.notes,
        })
    }
}
