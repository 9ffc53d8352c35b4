//! XML response wrapper types and custom deserializers.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Deserializes empty strings as `None` (for `String` fields).
pub fn deserialize_empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let result = Option::deserialize(deserializer);
    let s: Option<String> = result.map_err(D::Error::custom)?;
    Ok(s.filter(|s| !s.is_empty()))
}

/// `Logon` response envelope.
///
/// The portal answers a successful login with a `Key` element holding the
/// session key; rejected logins omit it and may carry an `Error` element.
#[derive(Debug, Deserialize)]
pub struct LogonResponse {
    /// Session key issued on successful login.
    #[serde(
        rename = "Key",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub key: Option<String>,
    /// Error description supplied on rejected logins.
    #[serde(
        rename = "Error",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub error: Option<String>,
}
