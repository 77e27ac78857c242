//! Sale payload shapes.
//!
//! Deployed versions of the dealership API disagree on how a sale body is
//! spelled. Each [`SaleCandidate`] is one spelling; they are tried in order.

use serde_json::{json, Map, Value};

use crate::models::{Payment, SaleDraft};

/// Key casing of a candidate body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Casing {
    Camel,
    Pascal,
    Snake,
}

/// How payment modes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeStyle {
    Name,
    Ordinal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleCandidate {
    pub label: &'static str,
    pub body: Value,
}

fn key(casing: Casing, camel: &str) -> String {
    match casing {
        Casing::Camel => camel.to_string(),
        Casing::Pascal => {
            let mut chars = camel.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        }
        Casing::Snake => {
            let mut out = String::with_capacity(camel.len() + 4);
            for c in camel.chars() {
                if c.is_ascii_uppercase() {
                    out.push('_');
                    out.push(c.to_ascii_lowercase());
                } else {
                    out.push(c);
                }
            }
            out
        }
    }
}

/// All-digit ids go out as numbers; anything else stays a string.
fn id_value(id: &str) -> Value {
    if !id.is_empty() && id.len() < 16 && id.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = id.parse::<u64>() {
            return json!(n);
        }
    }
    json!(id)
}

fn payment_value(payment: &Payment, casing: Casing, style: ModeStyle) -> Value {
    let mode = match (style, casing) {
        (ModeStyle::Ordinal, _) => json!(payment.mode.ordinal()),
        (ModeStyle::Name, Casing::Snake) => json!(payment.mode.snake_name()),
        (ModeStyle::Name, _) => json!(payment.mode.pascal_name()),
    };
    let mut obj = Map::new();
    obj.insert(key(casing, "paymentMode"), mode);
    obj.insert(key(casing, "amount"), json!(payment.amount));
    if let Some(reference) = &payment.reference {
        obj.insert(key(casing, "referenceNumber"), json!(reference));
    }
    if let Some(company) = &payment.finance_company_id {
        obj.insert(key(casing, "financeCompanyId"), id_value(company));
    }
    Value::Object(obj)
}

fn body(draft: &SaleDraft, casing: Casing, style: ModeStyle) -> Value {
    let mut obj = Map::new();
    obj.insert(key(casing, "vehicleId"), id_value(&draft.vehicle_id));
    obj.insert(key(casing, "customerId"), id_value(&draft.customer_id));
    obj.insert(
        key(casing, "saleDate"),
        json!(draft.sale_date.format("%Y-%m-%d").to_string()),
    );
    obj.insert(key(casing, "sellingPrice"), json!(draft.selling_price));
    obj.insert(
        key(casing, "payments"),
        Value::Array(
            draft
                .payments
                .iter()
                .map(|p| payment_value(p, casing, style))
                .collect(),
        ),
    );
    if let Some(notes) = &draft.notes {
        obj.insert(key(casing, "notes"), json!(notes));
    }
    Value::Object(obj)
}

/// Number of payload shapes tried per sale.
pub const SHAPE_COUNT: usize = 5;

/// Ordered payload shapes for one sale.
pub fn build_candidates(draft: &SaleDraft) -> Vec<SaleCandidate> {
    vec![
        SaleCandidate {
            label: "camel_string",
            body: body(draft, Casing::Camel, ModeStyle::Name),
        },
        SaleCandidate {
            label: "camel_numeric",
            body: body(draft, Casing::Camel, ModeStyle::Ordinal),
        },
        SaleCandidate {
            label: "pascal_numeric",
            body: body(draft, Casing::Pascal, ModeStyle::Ordinal),
        },
        SaleCandidate {
            label: "snake_string",
            body: body(draft, Casing::Snake, ModeStyle::Name),
        },
        SaleCandidate {
            label: "sale_envelope",
            body: json!({ "sale": body(draft, Casing::Camel, ModeStyle::Name) }),
        },
    ]
}
