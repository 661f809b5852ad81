//! Wire types for the studio REST API.
//!
//! DESIGN
//! ======
//! Every in-scope endpoint answers with the same loose envelope
//! (`success`, optional `user`, optional `message`). The envelopes keep
//! `user` optional so a well-formed HTTP response with a missing profile
//! can be told apart from a transport or status failure. A `user` that
//! does not decode as a profile counts as missing.

use serde::{Deserialize, Deserializer, Serialize};

/// The authenticated user's displayable attributes.
///
/// Contact fields are nullable in the backend; `null` and missing both
/// decode to an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub facebook: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zalo: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub gmail: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_user<'de, D>(deserializer: D) -> Result<Option<UserProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// Response of `GET /api/me`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_user")]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MeResponse {
    /// The profile, but only when the backend reported success.
    #[must_use]
    pub fn into_user(self) -> Option<UserProfile> {
        if self.success { self.user } else { None }
    }
}

/// Response of `POST /api/login` and `POST /api/register`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient_user")]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `PUT /api/profile`.
pub type ProfileResponse = MeResponse;

/// Generic acknowledgement, e.g. from `POST /api/logout`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/login`.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/register`.
#[derive(Clone, Debug, Serialize)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

/// Partial profile update for `PUT /api/profile`. Unset fields are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zalo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gmail: Option<String>,
}

impl ProfileUpdate {
    /// True when no field would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
