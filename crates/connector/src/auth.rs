use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fedgate_core::{AuthType, AuthValue};

/// Auth Header Encoder (C3): pure function, no side effects.
///
/// Translates a gateway's stored auth material into the headers a request
/// to that gateway should carry. Unknown or malformed fields degrade to no
/// header rather than an error — a gateway with bad auth material fails its
/// probe or health check with a transport/status error instead of this
/// function raising one.
#[must_use]
pub fn encode(auth_type: AuthType, auth_value: &AuthValue) -> Vec<(String, String)> {
    match auth_type {
        AuthType::None => Vec::new(),
        AuthType::Basic => {
            let username = auth_value.get_str("username").unwrap_or_default();
            let password = auth_value.get_str("password").unwrap_or_default();
            let token = BASE64.encode(format!("{username}:{password}"));
            vec![("Authorization".to_owned(), format!("Basic {token}"))]
        }
        AuthType::Bearer => {
            let Some(token) = auth_value.get_str("token") else {
                return Vec::new();
            };
            vec![("Authorization".to_owned(), format!("Bearer {token}"))]
        }
        AuthType::CustomHeaders => auth_value
            .0
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_owned())))
            .collect(),
    }
}

/// Encode the federation's own service-identity credentials as the headers
/// C7 presents when forwarding — `Authorization: Basic` plus a redundant
/// `X-API-Key`, exactly as §6 specifies.
#[must_use]
pub fn encode_service_credentials(user: &str, password: &str) -> Vec<(String, String)> {
    let token = BASE64.encode(format!("{user}:{password}"));
    vec![
        ("Authorization".to_owned(), format!("Basic {token}")),
        ("X-API-Key".to_owned(), token),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_yields_no_headers() {
        assert!(encode(AuthType::None, &AuthValue::empty()).is_empty());
    }

    #[test]
    fn basic_encodes_user_and_password() {
        let mut map = serde_json::Map::new();
        map.insert("username".into(), "alice".into());
        map.insert("password".into(), "hunter2".into());
        let headers = encode(AuthType::Basic, &AuthValue(map));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, "Authorization");
        assert!(headers[0].1.starts_with("Basic "));
    }

    #[test]
    fn bearer_encodes_token() {
        let mut map = serde_json::Map::new();
        map.insert("token".into(), "abc123".into());
        let headers = encode(AuthType::Bearer, &AuthValue(map));
        assert_eq!(headers, vec![("Authorization".to_owned(), "Bearer abc123".to_owned())]);
    }

    #[test]
    fn bearer_missing_token_yields_no_headers() {
        assert!(encode(AuthType::Bearer, &AuthValue::empty()).is_empty());
    }

    #[test]
    fn custom_headers_passes_through_flat_map() {
        let mut map = serde_json::Map::new();
        map.insert("X-Custom-Key".into(), "value1".into());
        let headers = encode(AuthType::CustomHeaders, &AuthValue(map));
        assert_eq!(headers, vec![("X-Custom-Key".to_owned(), "value1".to_owned())]);
    }

    #[test]
    fn service_credentials_include_basic_and_api_key() {
        let headers = encode_service_credentials("svc", "secret");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0, "Authorization");
        assert_eq!(headers[1].0, "X-API-Key");
    }
}
