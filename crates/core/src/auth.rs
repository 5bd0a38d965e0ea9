use serde::{Deserialize, Serialize};

/// Tag identifying how [`AuthValue`] should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    None,
    Basic,
    Bearer,
    CustomHeaders,
}

/// Opaque auth material stored alongside a gateway or tool.
///
/// The shape depends on [`AuthType`]: `basic` expects `{"username": ...,
/// "password": ...}`, `bearer` expects `{"token": ...}`, `custom_headers`
/// expects a flat map of header name to value. This service never
/// interprets the contents beyond handing them to the auth header encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AuthValue(pub serde_json::Map<String, serde_json::Value>);

impl AuthValue {
    /// An empty auth value, appropriate for [`AuthType::None`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read a string-valued field, if present.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(serde_json::Value::as_str)
    }
}
