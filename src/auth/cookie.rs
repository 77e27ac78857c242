//! Session cookie encoding.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::AuthConfig;

/// Value of the cookie named `name`, if present and non-empty.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

fn attributes(config: &AuthConfig, max_age: u64) -> String {
    let mut attrs = format!("Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.cookie_secure {
        attrs.push_str("; Secure");
    }
    attrs
}

/// `Set-Cookie` value carrying the bearer token.
pub fn session_cookie(config: &AuthConfig, token: &str, max_age: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; {}",
        config.cookie_name,
        token,
        attributes(config, max_age)
    ))
    .ok()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(config: &AuthConfig) -> HeaderValue {
    HeaderValue::from_str(&format!("{}=; {}", config.cookie_name, attributes(config, 0)))
        .unwrap_or_else(|_| HeaderValue::from_static("dealer_session=; Path=/; Max-Age=0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; dealer_session=abc.def"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(read_cookie(&headers, "dealer_session").as_deref(), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "missing"), None);

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("dealer_session="));
        assert_eq!(read_cookie(&empty, "dealer_session"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = AuthConfig::default();
        let set = session_cookie(&config, "tok", 3600).unwrap();
        assert_eq!(
            set.to_str().unwrap(),
            "dealer_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure"
        );

        config.cookie_secure = false;
        assert_eq!(
            clear_cookie(&config).to_str().unwrap(),
            "dealer_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }
}
