//! Customer records.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::normalize::{de, Fields, FromUpstream, NormalizeError};
use crate::validation::{FieldError, FieldErrors, ValidationContext};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Government ID or licence number.
    pub id_number: Option<String>,
    pub created_at: Option<String>,
}

impl FromUpstream for Customer {
    const ENTITY: &'static str = "customer";

    fn from_upstream(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        let name = r.string("name", &["full_name", "customer_name"]).or_else(|| {
            let first = r.string("first_name", &[])?;
            Some(match r.string("last_name", &[]) {
                Some(last) => format!("{first} {last}"),
                None => first,
            })
        });
        Ok(Self {
            id: r.id(&["customer_id"])?,
            name: name.ok_or(NormalizeError::MissingField("name"))?,
            phone: r.string("phone", &["phone_number", "mobile", "mobile_number", "contact_number"]),
            email: r.string("email", &["email_address"]),
            address: r.string("address", &["address_line", "street"]),
            city: r.string("city", &[]),
            id_number: r.string("id_number", &["aadhaar", "aadhar_number", "license_number", "licence_number", "national_id"]),
            created_at: r.string("created_at", &["created_on", "created_date"]),
        })
    }
}

/// Customer create/update form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub id_number: Option<String>,
}

impl CustomerInput {
    /// Validate and build the upstream request body.
    pub fn into_upstream(self, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", self.name.as_deref());
        let phone = errors.required_phone("phone", self.phone.as_deref(), ctx);
        let email = errors.optional_email("email", self.email.as_deref());
        errors.finish(json!({
            "name": name,
            "phone": phone,
            "email": email,
            "address": FieldErrors::optional_text(self.address.as_deref()),
            "city": FieldErrors::optional_text(self.city.as_deref()),
            "idNumber": FieldErrors::optional_text(self.id_number.as_deref()),
        }))
    }
}
