//! Reading tokens and users out of auth-service responses.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::normalize::{as_string, as_string_list, field, Fields};

const TOKEN_KEYS: &[&str] = &["token", "access_token", "jwt", "id_token", "auth_token", "bearer"];
const NESTED_KEYS: &[&str] = &["data", "result", "session"];

fn nested(obj: &Map<String, Value>) -> impl Iterator<Item = &Map<String, Value>> {
    std::iter::once(obj).chain(
        NESTED_KEYS
            .iter()
            .filter_map(move |k| field(obj, k, &[]))
            .filter_map(Value::as_object),
    )
}

/// Bearer token from a login response, top level or one envelope down.
pub fn extract_token(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    nested(obj).find_map(|o| {
        TOKEN_KEYS.iter().find_map(|k| match field(o, k, &[]) {
            Some(Value::Object(inner)) => field(inner, "token", &["value"]).and_then(as_string),
            Some(other) => as_string(other),
            None => None,
        })
    })
}

/// Token lifetime in seconds, when the response states one.
pub fn extract_expires_in(body: &Value) -> Option<u64> {
    let obj = body.as_object()?;
    nested(obj)
        .find_map(|o| Fields::new(o).i64("expires_in", &["expires", "expiry_seconds"]))
        .filter(|secs| *secs > 0)
        .map(|secs| secs as u64)
}

/// The signed-in user as shown by the admin panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl SessionUser {
    fn from_record(r: Fields<'_>) -> Option<Self> {
        let user = Self {
            id: r.string("id", &["user_id", "sub"]),
            name: r.string("name", &["full_name", "display_name", "username", "user_name"]),
            email: r.string("email", &["email_address"]),
            roles: r
                .raw("roles", &["role"])
                .map(as_string_list)
                .unwrap_or_default(),
        };
        (user.id.is_some() || user.email.is_some() || user.name.is_some()).then_some(user)
    }

    /// User from a login or `me` response: `{user}`, `{data: {user}}`, or the
    /// record itself.
    pub fn from_response(body: &Value) -> Option<Self> {
        let obj = body.as_object()?;
        nested(obj)
            .find_map(|o| {
                field(o, "user", &["profile", "account"])
                    .and_then(Value::as_object)
                    .and_then(|u| Self::from_record(Fields::new(u)))
            })
            .or_else(|| {
                let record = nested(obj).last().unwrap_or(obj);
                Self::from_record(Fields::new(record))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_variants() {
        assert_eq!(extract_token(&json!({"token": "a"})).as_deref(), Some("a"));
        assert_eq!(extract_token(&json!({"AccessToken": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_token(&json!({"data": {"access_token": "c"}})).as_deref(), Some("c"));
        assert_eq!(extract_token(&json!({"jwt": {"token": "d", "expires": 60}})).as_deref(), Some("d"));
        assert_eq!(extract_token(&json!({"message": "ok"})), None);
        assert_eq!(extract_token(&json!("raw")), None);
    }

    #[test]
    fn test_expiry() {
        assert_eq!(extract_expires_in(&json!({"token": "a", "expiresIn": 3600})), Some(3600));
        assert_eq!(extract_expires_in(&json!({"data": {"expires_in": "900"}})), Some(900));
        assert_eq!(extract_expires_in(&json!({"expiresIn": 0})), None);
    }

    #[test]
    fn test_user_shapes() {
        let user = SessionUser::from_response(&json!({
            "token": "x",
            "user": {"Id": 3, "FullName": "Anita", "Email": "anita@dealer.example", "Role": "Admin"}
        }))
        .unwrap();
        assert_eq!(user.id.as_deref(), Some("3"));
        assert_eq!(user.name.as_deref(), Some("Anita"));
        assert_eq!(user.roles, vec!["Admin".to_string()]);

        let me = SessionUser::from_response(&json!({"data": {"userId": "u1", "username": "sam"}})).unwrap();
        assert_eq!(me.id.as_deref(), Some("u1"));
        assert_eq!(me.name.as_deref(), Some("sam"));

        assert_eq!(SessionUser::from_response(&json!({"token": "x"})), None);
    }
}
