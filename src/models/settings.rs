//! Delivery-note header and footer settings.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::normalize::{de, Fields, NormalizeError};
use crate::validation::{FieldError, FieldErrors, ValidationContext};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryNoteSettings {
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// GST or other tax registration number.
    pub tax_id: Option<String>,
    pub terms: Option<String>,
    pub footer_note: Option<String>,
    pub logo_url: Option<String>,
}

impl DeliveryNoteSettings {
    /// Settings are a singleton: the upstream may answer with the object, a
    /// one-element list, or nothing at all before first save.
    pub fn from_response(value: &Value) -> Result<Self, NormalizeError> {
        let record = match value {
            Value::Null => return Ok(Self::default()),
            Value::Array(items) => match items.first() {
                Some(first) => first,
                None => return Ok(Self::default()),
            },
            other => other,
        };
        let obj = crate::normalize::unwrap_item(record)?;
        let r = Fields::new(obj);
        Ok(Self {
            company_name: r
                .string("company_name", &["business_name", "dealer_name", "name"])
                .unwrap_or_default(),
            address: r.string("address", &["company_address"]),
            phone: r.string("phone", &["company_phone", "contact_number"]),
            email: r.string("email", &["company_email"]),
            tax_id: r.string("tax_id", &["gst_number", "gstin", "gst_no", "vat_number"]),
            terms: r.string("terms", &["terms_and_conditions", "terms_conditions"]),
            footer_note: r.string("footer_note", &["footer", "footer_text"]),
            logo_url: r.string("logo_url", &["logo"]),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryNoteSettingsInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub terms: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub footer_note: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub logo_url: Option<String>,
}

impl DeliveryNoteSettingsInput {
    pub fn into_upstream(self, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let company_name = errors.required_text("companyName", self.company_name.as_deref());
        let phone = errors.optional_phone("phone", self.phone.as_deref(), ctx);
        let email = errors.optional_email("email", self.email.as_deref());
        errors.finish(json!({
            "companyName": company_name,
            "address": FieldErrors::optional_text(self.address.as_deref()),
            "phone": phone,
            "email": email,
            "taxId": self.tax_id.map(|t| t.to_uppercase()),
            "terms": FieldErrors::optional_text(self.terms.as_deref()),
            "footerNote": FieldErrors::optional_text(self.footer_note.as_deref()),
            "logoUrl": FieldErrors::optional_text(self.logo_url.as_deref()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_shapes() {
        assert_eq!(
            DeliveryNoteSettings::from_response(&Value::Null).unwrap(),
            DeliveryNoteSettings::default()
        );
        let s = DeliveryNoteSettings::from_response(&json!([
            {"BusinessName": "City Cars", "GSTIN": "27ABCDE1234F1Z5", "TermsAndConditions": "No returns"}
        ]))
        .unwrap();
        assert_eq!(s.company_name, "City Cars");
        assert_eq!(s.tax_id.as_deref(), Some("27ABCDE1234F1Z5"));
        assert_eq!(s.terms.as_deref(), Some("No returns"));
    }
}
