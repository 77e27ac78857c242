//! Sales with multi-mode payments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::enums::{PaymentMode, SaleStatus};
use crate::models::vehicle::Vehicle;
use crate::normalize::{de, round2, Fields, FromUpstream, NormalizeError};
use crate::validation::{FieldError, FieldErrors};

/// Largest difference between payment total and selling price that still
/// counts as equal.
pub const PAYMENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub mode: PaymentMode,
    pub amount: f64,
    pub reference: Option<String>,
    pub finance_company_id: Option<String>,
}

impl Payment {
    fn from_fields(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        let raw_mode = r
            .raw("mode", &["payment_mode", "payment_type", "method", "type"])
            .ok_or(NormalizeError::MissingField("paymentMode"))?;
        let mode = PaymentMode::from_value(raw_mode).ok_or_else(|| NormalizeError::InvalidValue {
            field: "paymentMode",
            message: format!("unknown payment mode {raw_mode}"),
        })?;
        Ok(Self {
            mode,
            amount: r.f64("amount", &["amount_paid", "paid_amount", "value"]).unwrap_or(0.0),
            reference: r.string("reference", &["reference_number", "reference_no", "transaction_id", "cheque_number", "utr"]),
            finance_company_id: r
                .string("finance_company_id", &["financer_id", "finance_id"])
                .or_else(|| r.object("finance_company", &[]).and_then(|f| f.string("id", &[]))),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub vehicle_id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub vehicle_label: Option<String>,
    pub sale_date: Option<String>,
    pub selling_price: f64,
    pub payments: Vec<Payment>,
    pub status: SaleStatus,
    pub invoice_number: Option<String>,
}

impl Sale {
    pub fn amount_paid(&self) -> f64 {
        round2(self.payments.iter().map(|p| p.amount).sum())
    }
}

impl FromUpstream for Sale {
    const ENTITY: &'static str = "sale";

    fn from_upstream(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        let customer = r.object("customer", &[]);
        let vehicle = r.object("vehicle", &[]);

        let mut payments = Vec::new();
        let lines = r.objects("payments", &["payment_details", "sale_payments", "payment_modes"]);
        for line in &lines {
            match Payment::from_fields(line) {
                Ok(p) => payments.push(p),
                Err(e) => tracing::debug!(error = %e, "Skipping sale payment line"),
            }
        }
        // Older records carry a single flattened payment.
        if lines.is_empty() {
            if let Ok(p) = Payment::from_fields(r) {
                payments.push(p);
            }
        }

        let vehicle_label = vehicle
            .and_then(|v| Vehicle::from_upstream(&v).ok())
            .map(|v| v.label())
            .or_else(|| r.string("vehicle_name", &["vehicle_label", "vehicle"]));

        Ok(Self {
            id: r.id(&["sale_id"])?,
            vehicle_id: r
                .string("vehicle_id", &[])
                .or_else(|| vehicle.and_then(|v| v.string("id", &["vehicle_id"])))
                .ok_or(NormalizeError::MissingField("vehicleId"))?,
            customer_id: r
                .string("customer_id", &["buyer_id"])
                .or_else(|| customer.and_then(|c| c.string("id", &["customer_id"])))
                .ok_or(NormalizeError::MissingField("customerId"))?,
            customer_name: r
                .string("customer_name", &["buyer_name"])
                .or_else(|| customer.and_then(|c| c.string("name", &["full_name"]))),
            vehicle_label,
            sale_date: r.string("sale_date", &["date", "sold_on", "created_at"]),
            selling_price: r
                .f64("selling_price", &["sale_price", "price", "total_amount", "amount"])
                .unwrap_or(0.0),
            payments,
            status: r
                .raw("status", &["sale_status"])
                .map(SaleStatus::from_value)
                .unwrap_or_default(),
            invoice_number: r.string("invoice_number", &["invoice_no", "bill_number"]),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[serde(default, alias = "paymentMode")]
    pub mode: Option<PaymentMode>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub finance_company_id: Option<String>,
}

/// Sale creation form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub vehicle_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub sale_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub notes: Option<String>,
}

/// A validated sale, ready to be shaped into upstream payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub vehicle_id: String,
    pub customer_id: String,
    pub sale_date: NaiveDate,
    pub selling_price: f64,
    pub payments: Vec<Payment>,
    pub notes: Option<String>,
}

impl SaleInput {
    /// Validate required fields and that payments add up to the price.
    /// A missing sale date defaults to `today`.
    pub fn validate(self, today: NaiveDate) -> Result<SaleDraft, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let vehicle_id = errors.required_text("vehicleId", self.vehicle_id.as_deref());
        let customer_id = errors.required_text("customerId", self.customer_id.as_deref());
        let sale_date = errors
            .optional_date("saleDate", self.sale_date.as_deref())
            .unwrap_or(today);
        let selling_price = errors.required_amount("sellingPrice", self.selling_price, false);

        if self.payments.is_empty() {
            errors.push("payments", "at least one payment is required");
        }
        let mut payments = Vec::with_capacity(self.payments.len());
        for (i, p) in self.payments.into_iter().enumerate() {
            let mode = match p.mode {
                Some(m) => m,
                None => {
                    errors.push(format!("payments[{i}].mode"), "is required");
                    continue;
                }
            };
            let amount = errors.required_amount(&format!("payments[{i}].amount"), p.amount, false);
            let finance_company_id = FieldErrors::optional_text(p.finance_company_id.as_deref());
            if mode == PaymentMode::Finance && finance_company_id.is_none() {
                errors.push(
                    format!("payments[{i}].financeCompanyId"),
                    "is required for finance payments",
                );
            }
            payments.push(Payment {
                mode,
                amount: round2(amount),
                reference: FieldErrors::optional_text(p.reference.as_deref()),
                finance_company_id,
            });
        }

        if selling_price > 0.0 && !payments.is_empty() {
            let total: f64 = payments.iter().map(|p| p.amount).sum();
            if (total - selling_price).abs() > PAYMENT_TOLERANCE {
                errors.push(
                    "payments",
                    format!(
                        "payment total {:.2} does not match selling price {:.2}",
                        total, selling_price
                    ),
                );
            }
        }

        errors.finish(SaleDraft {
            vehicle_id,
            customer_id,
            sale_date,
            selling_price: round2(selling_price),
            payments,
            notes: FieldErrors::optional_text(self.notes.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_one;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn payment(mode: PaymentMode, amount: f64) -> PaymentInput {
        PaymentInput {
            mode: Some(mode),
            amount: Some(amount),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_payment_must_match_price() {
        let input = SaleInput {
            vehicle_id: Some("9".into()),
            customer_id: Some("4".into()),
            selling_price: Some(500000.0),
            payments: vec![payment(PaymentMode::Cash, 100000.0), payment(PaymentMode::Upi, 300000.0)],
            ..Default::default()
        };
        let errors = input.validate(today()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "payments");
        assert!(errors[0].message.contains("400000.00"));
    }

    #[test]
    fn test_valid_sale_defaults_date() {
        let input = SaleInput {
            vehicle_id: Some("9".into()),
            customer_id: Some("4".into()),
            selling_price: Some(500000.0),
            payments: vec![
                payment(PaymentMode::Cash, 100000.004),
                payment(PaymentMode::BankTransfer, 399999.996),
            ],
            ..Default::default()
        };
        let draft = input.validate(today()).unwrap();
        assert_eq!(draft.sale_date, today());
        assert_eq!(draft.payments[0].amount, 100000.0);
        assert_eq!(draft.payments.len(), 2);
    }

    #[test]
    fn test_finance_payment_needs_company() {
        let input = SaleInput {
            vehicle_id: Some("9".into()),
            customer_id: Some("4".into()),
            selling_price: Some(100.0),
            payments: vec![payment(PaymentMode::Finance, 100.0)],
            ..Default::default()
        };
        let errors = input.validate(today()).unwrap_err();
        assert_eq!(errors[0].field, "payments[0].financeCompanyId");
    }

    #[test]
    fn test_input_accepts_aliases() {
        let input: SaleInput = serde_json::from_value(json!({
            "vehicleId": 9,
            "customerId": "4",
            "sellingPrice": "1,000",
            "payments": [{"paymentMode": "neft", "amount": 1000}]
        }))
        .unwrap();
        let draft = input.validate(today()).unwrap();
        assert_eq!(draft.payments[0].mode, PaymentMode::BankTransfer);
        assert_eq!(draft.vehicle_id, "9");
    }

    #[test]
    fn test_normalize_embedded_refs_and_flat_payment() {
        let sale: Sale = normalize_one(&json!({
            "SaleId": 77,
            "Customer": {"Id": 4, "FullName": "Meera Nair"},
            "Vehicle": {"Id": 9, "Make": "Honda", "Model": "Amaze", "Year": 2020},
            "SalePrice": 650000,
            "PaymentMode": 1,
            "AmountPaid": 650000,
            "Status": "Completed"
        }))
        .unwrap();
        assert_eq!(sale.id, "77");
        assert_eq!(sale.customer_id, "4");
        assert_eq!(sale.vehicle_id, "9");
        assert_eq!(sale.customer_name.as_deref(), Some("Meera Nair"));
        assert_eq!(sale.vehicle_label.as_deref(), Some("2020 Honda Amaze"));
        assert_eq!(sale.payments.len(), 1);
        assert_eq!(sale.payments[0].mode, PaymentMode::BankTransfer);
        assert_eq!(sale.amount_paid(), 650000.0);
        assert_eq!(sale.status, SaleStatus::Completed);
    }

    #[test]
    fn test_normalize_requires_references() {
        let err = normalize_one::<Sale>(&json!({"id": 1, "customerId": 2})).unwrap_err();
        assert_eq!(err, NormalizeError::MissingField("vehicleId"));
    }
}
