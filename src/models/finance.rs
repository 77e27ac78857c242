//! Finance companies (lenders backing financed sales).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::normalize::{de, Fields, FromUpstream, NormalizeError};
use crate::validation::{FieldError, FieldErrors, ValidationContext};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceCompany {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

impl FromUpstream for FinanceCompany {
    const ENTITY: &'static str = "finance company";

    fn from_upstream(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: r.id(&["finance_company_id", "financer_id"])?,
            name: r.require_string("name", &["company_name", "finance_company_name", "financer_name"])?,
            contact_person: r.string("contact_person", &["contact_name", "contact"]),
            phone: r.string("phone", &["phone_number", "mobile", "contact_number"]),
            email: r.string("email", &[]),
            // A missing flag means the record is usable.
            active: r
                .bool("active", &["is_active", "enabled", "status"])
                .unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceCompanyInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl FinanceCompanyInput {
    pub fn into_upstream(self, ctx: &ValidationContext) -> Result<Value, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("name", self.name.as_deref());
        let phone = errors.optional_phone("phone", self.phone.as_deref(), ctx);
        let email = errors.optional_email("email", self.email.as_deref());
        errors.finish(json!({
            "name": name,
            "contactPerson": FieldErrors::optional_text(self.contact_person.as_deref()),
            "phone": phone,
            "email": email,
            "isActive": self.active.unwrap_or(true),
        }))
    }
}
